//! Base records of a binary BLK body.

use std::io::Read;

use binrw::BinRead;

use crate::error::Result;
use crate::value::{DataType, Value};
use crate::varint::ReadVarIntExt;

/// Fixed 8 byte parameter record
///
/// The name id only uses 24 bits, the type tag selects how the payload is interpreted.
/// All data is stored in little endian format
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct ParamRecord {
    /// Id of the parameter name in the active name map
    #[br(parse_with = binrw::helpers::read_u24)]
    pub name_id: u32,

    /// Raw type tag, see [`DataType`]
    pub type_tag: u8,

    /// Inline value or offset into the large data segment
    pub payload: [u8; 4],
}

/// Block descriptor as stored in the flat block array
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// Name id, `-1` for an unnamed block
    pub name_id: i64,

    /// Number of parameters owned by this block
    pub param_count: u32,

    /// Number of child blocks
    pub child_count: u32,

    /// Index of the first child in the flat block array, zero when there are no children
    pub child_offset: u32,
}

impl BlockRecord {
    /// Read a descriptor, the child offset is only present when the block has children
    pub fn read<R: Read>(reader: &mut R) -> Result<BlockRecord> {
        let name_id = i64::from(reader.read_varint_u32()?) - 1;
        let param_count = reader.read_varint_u32()?;
        let child_count = reader.read_varint_u32()?;
        let child_offset = if child_count > 0 {
            reader.read_varint_u32()?
        } else {
            0
        };

        Ok(BlockRecord {
            name_id,
            param_count,
            child_count,
            child_offset,
        })
    }
}

/// A named, typed value
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Id of the name in the name map it was resolved through
    pub id: u32,

    /// Resolved name
    pub name: String,

    /// Decoded value
    pub value: Value,
}

impl Parameter {
    /// Type tag of the value
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::types::{BlockRecord, ParamRecord};

    #[test]
    fn read_param_record() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x01, 0x02, 0x03,        // Name id
            0x02,                    // Type
            0x2A, 0x00, 0x00, 0x00,  // Payload
        ]);

        let expected = ParamRecord {
            name_id: 0x030201,
            type_tag: 0x02,
            payload: [0x2A, 0x00, 0x00, 0x00],
        };

        assert_eq!(ParamRecord::read(&mut input)?, expected);

        Ok(())
    }

    #[test]
    fn read_block_record_without_children() -> Result<()> {
        let mut input = Cursor::new(vec![0x00, 0x03, 0x00, 0x7F]);

        let expected = BlockRecord {
            name_id: -1,
            param_count: 3,
            ..Default::default()
        };

        assert_eq!(BlockRecord::read(&mut input)?, expected);
        assert_eq!(input.position(), 3);

        Ok(())
    }

    #[test]
    fn read_block_record_with_children() -> Result<()> {
        let mut input = Cursor::new(vec![0x05, 0x00, 0x02, 0x81, 0x01]);

        let expected = BlockRecord {
            name_id: 4,
            param_count: 0,
            child_count: 2,
            child_offset: 129,
        };

        assert_eq!(BlockRecord::read(&mut input)?, expected);

        Ok(())
    }
}
