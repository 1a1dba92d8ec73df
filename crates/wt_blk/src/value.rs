//! Typed parameter values.
//!
//! Every parameter is stored as an 8 byte record whose last four bytes either hold the value itself or an
//! offset into the large data segment of the file.
//!
//! | Tag    | Name     | Storage                                                   |
//! |--------|----------|-----------------------------------------------------------|
//! | `0x00` | `size`   | inline, two `u16`                                         |
//! | `0x01` | `t`      | string, in the large data segment or the name map         |
//! | `0x02` | `i`      | inline `i32`                                              |
//! | `0x03` | `r`      | inline `f32`                                              |
//! | `0x04` | `p2`     | 8 bytes of large data, two `f32`                          |
//! | `0x05` | `p3`     | 12 bytes of large data, three `f32`                       |
//! | `0x06` | `p4`     | 16 bytes of large data, four `f32`                        |
//! | `0x07` | `ip2`    | 8 bytes of large data, two `u32`                          |
//! | `0x08` | `ip3`    | 12 bytes of large data, three `u32`                       |
//! | `0x09` | `b`      | inline, true when the first byte is `1`                   |
//! | `0x0A` | `c`      | inline, bytes stored as B, G, R, A                        |
//! | `0x0B` | `m`      | 48 bytes of large data, 4 rows of three `f32`             |
//! | `0x0C` | `i64`    | 8 bytes of large data, `i64`                              |
//! | `0x10` | `typex7` | inline `u32`                                              |
//! | `0x89` | `typex`  | inline, true when the first byte is `0`                   |

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use derive_more::derive::Display;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{Error, Result};
use crate::name_map::NameMap;
use crate::types::ParamRecord;

/// Type tag of a parameter record
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum DataType {
    #[display("size")]
    Size = 0x00,
    #[display("t")]
    Str = 0x01,
    #[display("i")]
    Int = 0x02,
    #[display("r")]
    Float = 0x03,
    #[display("p2")]
    Float2 = 0x04,
    #[display("p3")]
    Float3 = 0x05,
    #[display("p4")]
    Float4 = 0x06,
    #[display("ip2")]
    UInt2 = 0x07,
    #[display("ip3")]
    UInt3 = 0x08,
    #[display("b")]
    Bool = 0x09,
    #[display("c")]
    Color = 0x0A,
    #[display("m")]
    Matrix = 0x0B,
    #[display("i64")]
    Long = 0x0C,
    #[display("typex7")]
    UInt = 0x10,
    #[display("typex")]
    InvertedBool = 0x89,
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => DataType::Size,
            0x01 => DataType::Str,
            0x02 => DataType::Int,
            0x03 => DataType::Float,
            0x04 => DataType::Float2,
            0x05 => DataType::Float3,
            0x06 => DataType::Float4,
            0x07 => DataType::UInt2,
            0x08 => DataType::UInt3,
            0x09 => DataType::Bool,
            0x0A => DataType::Color,
            0x0B => DataType::Matrix,
            0x0C => DataType::Long,
            0x10 => DataType::UInt,
            0x89 => DataType::InvertedBool,
            other => return Err(Error::UnsupportedType(other)),
        })
    }
}

/// RGBA color
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A decoded parameter value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum Value {
    Size([u16; 2]),
    Str(String),
    Int(i32),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    UInt2([u32; 2]),
    UInt3([u32; 3]),
    Bool(bool),
    Color(Color),
    Matrix([[f32; 3]; 4]),
    Long(i64),
    UInt(u32),
    /// Stored as zero for `true`
    InvertedBool(bool),
}

impl Value {
    /// The type tag this value is stored with
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Size(_) => DataType::Size,
            Value::Str(_) => DataType::Str,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Float2(_) => DataType::Float2,
            Value::Float3(_) => DataType::Float3,
            Value::Float4(_) => DataType::Float4,
            Value::UInt2(_) => DataType::UInt2,
            Value::UInt3(_) => DataType::UInt3,
            Value::Bool(_) => DataType::Bool,
            Value::Color(_) => DataType::Color,
            Value::Matrix(_) => DataType::Matrix,
            Value::Long(_) => DataType::Long,
            Value::UInt(_) => DataType::UInt,
            Value::InvertedBool(_) => DataType::InvertedBool,
        }
    }

    /// Get the value as a string slice if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if it holds one of the integer types
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v.into()),
            Value::UInt(v) => Some(v.into()),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as a bool if it holds either bool type
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) | Value::InvertedBool(v) => Some(v),
            _ => None,
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Size(v) => join(f, v),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Float2(v) => join(f, v),
            Value::Float3(v) => join(f, v),
            Value::Float4(v) => join(f, v),
            Value::UInt2(v) => join(f, v),
            Value::UInt3(v) => join(f, v),
            Value::Bool(v) | Value::InvertedBool(v) => f.write_str(if *v { "yes" } else { "no" }),
            Value::Color(c) => join(f, &[c.r, c.g, c.b, c.a]),
            Value::Matrix(rows) => {
                f.write_str("[")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str("[")?;
                    join(f, row)?;
                    f.write_str("]")?;
                }
                f.write_str("]")
            }
            Value::Long(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
        }
    }
}

/// Everything a parameter record may point into while it is being decoded
#[derive(Debug, Clone, Copy)]
pub struct ValueSource<'a> {
    /// Large data segment of the file
    pub large_data: &'a [u8],
    /// Name map embedded in the file
    pub names: &'a NameMap,
    /// Name map of the owning container, if the file has one
    pub parent: Option<&'a NameMap>,
}

impl<'a> ValueSource<'a> {
    /// Resolve a name id through the file's map or its container's
    pub fn name(&self, id: i64) -> Result<&'a str> {
        self.names.resolve(id, self.parent)
    }

    fn large(&self, index: i32, size: usize) -> Result<&'a [u8]> {
        usize::try_from(index)
            .ok()
            .and_then(|start| self.large_data.get(start..start.checked_add(size)?))
            .ok_or_else(|| {
                Error::out_of_bounds("large data", index.into(), size, self.large_data.len())
            })
    }

    fn large_str(&self, offset: i32) -> Result<String> {
        let tail = usize::try_from(offset)
            .ok()
            .and_then(|start| self.large_data.get(start..))
            .ok_or_else(|| {
                Error::out_of_bounds("large data", offset.into(), 0, self.large_data.len())
            })?;
        let end = tail
            .iter()
            .position(|&b| b == b'\0')
            .ok_or(Error::Unterminated("large data"))?;
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }

    /// Decode the value held by `record`
    pub fn decode(&self, record: &ParamRecord) -> Result<Value> {
        let p = record.payload;
        let index = LittleEndian::read_i32(&p);

        Ok(match DataType::try_from(record.type_tag)? {
            DataType::Size => Value::Size([
                LittleEndian::read_u16(&p[0..2]),
                LittleEndian::read_u16(&p[2..4]),
            ]),
            DataType::Str => {
                let offset = index.wrapping_sub(i32::from(p[3]) << 24);
                match self.parent {
                    None => Value::Str(self.large_str(offset)?),
                    Some(_) => Value::Str(self.name(offset.into())?.to_owned()),
                }
            }
            DataType::Int => Value::Int(index),
            DataType::Float => Value::Float(LittleEndian::read_f32(&p)),
            DataType::Float2 => {
                let mut v = [0f32; 2];
                LittleEndian::read_f32_into(self.large(index, 8)?, &mut v);
                Value::Float2(v)
            }
            DataType::Float3 => {
                let mut v = [0f32; 3];
                LittleEndian::read_f32_into(self.large(index, 12)?, &mut v);
                Value::Float3(v)
            }
            DataType::Float4 => {
                let mut v = [0f32; 4];
                LittleEndian::read_f32_into(self.large(index, 16)?, &mut v);
                Value::Float4(v)
            }
            DataType::UInt2 => {
                let mut v = [0u32; 2];
                LittleEndian::read_u32_into(self.large(index, 8)?, &mut v);
                Value::UInt2(v)
            }
            DataType::UInt3 => {
                let mut v = [0u32; 3];
                LittleEndian::read_u32_into(self.large(index, 12)?, &mut v);
                Value::UInt3(v)
            }
            DataType::Bool => Value::Bool(p[0] == 1),
            DataType::Color => Value::Color(Color {
                r: p[2],
                g: p[1],
                b: p[0],
                a: p[3],
            }),
            DataType::Matrix => {
                let raw = self.large(index, 48)?;
                let mut rows = [[0f32; 3]; 4];
                for (row, chunk) in rows.iter_mut().zip(raw.chunks_exact(12)) {
                    LittleEndian::read_f32_into(chunk, row);
                }
                Value::Matrix(rows)
            }
            DataType::Long => Value::Long(LittleEndian::read_i64(self.large(index, 8)?)),
            DataType::UInt => Value::UInt(LittleEndian::read_u32(&p)),
            DataType::InvertedBool => Value::InvertedBool(p[0] == 0),
        })
    }
}
