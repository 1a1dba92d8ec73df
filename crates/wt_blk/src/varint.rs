//! Variable length integers.
//!
//! Integers are stored in groups of 7 bits, least significant group first, with the high bit of every byte
//! set while more groups follow.

use std::io::Read;

use byteorder::ReadBytesExt;

use crate::error::{Error, Result};

/// Extends [`Read`] with methods for reading 7-bit encoded integers
pub trait ReadVarIntExt: Read {
    /// Read an unsigned integer of at most 64 bits
    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.read_u8()?;
            let group = u64::from(byte & 0x7F);
            if shift == 63 && group > 1 {
                return Err(Error::InvalidVarInt);
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::InvalidVarInt)
    }

    /// Read an unsigned integer that has to fit in 32 bits
    fn read_varint_u32(&mut self) -> Result<u32> {
        u32::try_from(self.read_varint()?).map_err(|_| Error::InvalidVarInt)
    }
}

impl<R: Read + ?Sized> ReadVarIntExt for R {}
