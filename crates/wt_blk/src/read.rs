//! Types for reading BLK files
//!

use std::{
    fmt::{self, Debug},
    io::Cursor,
    ops::Range,
};

use binrw::BinRead;
use tracing::{debug, instrument, trace};

use crate::{
    error::{Error, Result},
    name_map::NameMap,
    packing::{unpack, BlkPacking},
    types::{BlockRecord, ParamRecord, Parameter},
    value::{Value, ValueSource},
    varint::ReadVarIntExt,
};

/// Shared state of the container a BLK file was read from
///
/// Slim files resolve their names through the container name map and may be compressed with the
/// container's shared dictionary.
#[derive(Debug, Clone, Copy)]
pub struct ParentContext<'a> {
    /// Name map of the container
    pub name_map: &'a NameMap,

    /// Shared zstd dictionary of the container
    pub dictionary: Option<&'a [u8]>,
}

#[derive(Debug, Clone, PartialEq)]
struct BlockData {
    id: i64,
    name: String,
    params: Range<usize>,
    children: Range<usize>,
}

/// A decoded BLK file
///
/// Blocks are kept in the order of the file's flat block array, the root is always the first one.
///
/// ```no_run
/// fn print_blk(data: &[u8]) -> wt_blk::error::Result<()> {
///     let blk = wt_blk::Blk::decode("config.blk", data, None)?;
///
///     for param in blk.root().params() {
///         println!("{} = {}", param.name, param.value);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Blk {
    name: Box<str>,
    packing: Option<BlkPacking>,
    name_map: NameMap,
    params: Vec<Parameter>,
    blocks: Vec<BlockData>,
}

impl Blk {
    /// Decode a BLK file, including its packing byte
    #[instrument(skip(data, parent), fields(len = data.len()))]
    pub fn decode(name: &str, data: &[u8], parent: Option<&ParentContext<'_>>) -> Result<Blk> {
        let (packing, body) = unpack(data, parent.and_then(|p| p.dictionary))?;
        let mut blk = Self::from_body(name, &body, parent.map(|p| p.name_map))?;
        blk.packing = Some(packing);
        Ok(blk)
    }

    /// Decode an already unpacked BLK body
    ///
    /// When `parent` is given, string values are resolved through the name maps instead of the large data
    /// segment.
    #[instrument(skip(body, parent), fields(len = body.len()))]
    pub fn from_body(name: &str, body: &[u8], parent: Option<&NameMap>) -> Result<Blk> {
        let mut reader = Cursor::new(body);

        let name_map = NameMap::read(&mut reader)?;
        let block_count = reader.read_varint_u32()? as usize;
        let param_count = reader.read_varint_u32()? as usize;
        let large_size = reader.read_varint_u32()? as usize;
        debug!(block_count, param_count, large_size, names = name_map.len());

        let large_data = take(&mut reader, "large data", large_size)?;
        let source = ValueSource {
            large_data,
            names: &name_map,
            parent,
        };

        let params = Self::read_params(&mut reader, &source, param_count)?;
        let records = Self::read_block_records(&mut reader, block_count)?;
        let blocks = Self::link(&source, &records, params.len())?;

        let trailing = body.len() as u64 - reader.position();
        if trailing > 0 {
            trace!(trailing, "ignoring bytes after block table");
        }

        let blocks = if blocks.is_empty() {
            vec![BlockData {
                id: -1,
                name: String::new(),
                params: 0..params.len(),
                children: 0..0,
            }]
        } else {
            blocks
        };

        Ok(Blk {
            name: name.into(),
            packing: None,
            name_map,
            params,
            blocks,
        })
    }

    fn read_params(
        reader: &mut Cursor<&[u8]>,
        source: &ValueSource<'_>,
        count: usize,
    ) -> Result<Vec<Parameter>> {
        let remaining = remaining(reader);
        if count.saturating_mul(8) > remaining {
            return Err(Error::out_of_bounds(
                "parameters",
                reader.position() as i64,
                count.saturating_mul(8),
                remaining,
            ));
        }

        (0..count)
            .map(|_| {
                let record = ParamRecord::read(reader)?;
                Ok(Parameter {
                    id: record.name_id,
                    name: source.name(record.name_id.into())?.to_owned(),
                    value: source.decode(&record)?,
                })
            })
            .collect()
    }

    fn read_block_records(reader: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<BlockRecord>> {
        // every descriptor takes at least three bytes
        let mut records = Vec::with_capacity(count.min(remaining(reader) / 3));
        for _ in 0..count {
            records.push(BlockRecord::read(reader)?);
        }
        Ok(records)
    }

    /// Attach parameters and children to the flat block array.
    ///
    /// Parameters are handed out from the back of the flat parameter array while walking the blocks from
    /// last to first, so every block owns a contiguous range. Every block has at most one parent, which
    /// comes before it in the flat array.
    fn link(
        source: &ValueSource<'_>,
        records: &[BlockRecord],
        param_count: usize,
    ) -> Result<Vec<BlockData>> {
        let mut blocks = records
            .iter()
            .map(|r| {
                let name = if r.name_id >= 0 {
                    source.name(r.name_id)?.to_owned()
                } else {
                    String::new()
                };
                Ok(BlockData {
                    id: r.name_id,
                    name,
                    params: 0..0,
                    children: 0..0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut claimed = vec![false; records.len()];
        let mut end = param_count;
        for (index, (block, record)) in blocks.iter_mut().zip(records).enumerate().rev() {
            let count = record.param_count as usize;
            let start = end.checked_sub(count).ok_or_else(|| {
                Error::out_of_bounds("parameters", end as i64 - count as i64, count, param_count)
            })?;
            block.params = start..end;
            end = start;

            if record.child_count > 0 {
                let first = record.child_offset as usize;
                let last = first + record.child_count as usize;
                if first <= index || last > records.len() {
                    return Err(Error::out_of_bounds(
                        "blocks",
                        first as i64,
                        record.child_count as usize,
                        records.len(),
                    ));
                }
                if let Some(shared) = (first..last).find(|&child| claimed[child]) {
                    return Err(Error::out_of_bounds(
                        "blocks",
                        shared as i64,
                        1,
                        records.len(),
                    ));
                }
                claimed[first..last].fill(true);
                block.children = first..last;
            }
        }

        if end > 0 {
            debug!(unowned = end, "parameters not owned by any block");
        }

        Ok(blocks)
    }

    /// Name the file was decoded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the file was packed, `None` when decoded from a bare body
    pub fn packing(&self) -> Option<BlkPacking> {
        self.packing
    }

    /// The name map embedded in the file, empty for slim files
    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    /// Every parameter of the file in storage order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Number of blocks, including the root
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The root block of the tree
    pub fn root(&self) -> Block<'_> {
        Block {
            blk: self,
            index: 0,
        }
    }

    /// Get a block by its index in the flat block array
    pub fn block(&self, index: usize) -> Option<Block<'_>> {
        (index < self.blocks.len()).then_some(Block { blk: self, index })
    }

    /// Iterate over all blocks in the order of the flat block array
    pub fn blocks(&self) -> impl ExactSizeIterator<Item = Block<'_>> {
        (0..self.blocks.len()).map(move |index| Block { blk: self, index })
    }
}

fn remaining(reader: &Cursor<&[u8]>) -> usize {
    reader
        .get_ref()
        .len()
        .saturating_sub(reader.position() as usize)
}

fn take<'a>(reader: &mut Cursor<&'a [u8]>, section: &'static str, size: usize) -> Result<&'a [u8]> {
    let data: &'a [u8] = *reader.get_ref();
    let start = reader.position() as usize;
    let slice = start
        .checked_add(size)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| Error::out_of_bounds(section, start as i64, size, data.len()))?;
    reader.set_position((start + size) as u64);
    Ok(slice)
}

/// A view of one block of a [`Blk`]
#[derive(Clone, Copy)]
pub struct Block<'a> {
    blk: &'a Blk,
    index: usize,
}

impl<'a> Block<'a> {
    fn data(&self) -> &'a BlockData {
        &self.blk.blocks[self.index]
    }

    /// Index in the flat block array
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name id, `None` for unnamed blocks
    pub fn id(&self) -> Option<u32> {
        u32::try_from(self.data().id).ok()
    }

    /// Resolved name, empty for unnamed blocks
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// Parameters owned by this block
    pub fn params(&self) -> &'a [Parameter] {
        &self.blk.params[self.data().params.clone()]
    }

    /// Value of the first parameter called `name`
    pub fn param(&self, name: &str) -> Option<&'a Value> {
        self.params()
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// Iterate over the direct children
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Block<'a>> + ExactSizeIterator {
        let blk = self.blk;
        self.data()
            .children
            .clone()
            .map(move |index| Block { blk, index })
    }

    /// The first child called `name`
    pub fn child(&self, name: &str) -> Option<Block<'a>> {
        self.children().find(|c| c.name() == name)
    }
}

impl PartialEq for Block<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(*self, *other)];
        while let Some((a, b)) = pending.pop() {
            if a.name() != b.name()
                || a.params() != b.params()
                || a.child_count() != b.child_count()
            {
                return false;
            }
            pending.extend(a.children().zip(b.children()));
        }
        true
    }
}

impl Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name())
            .field("params", &self.params())
            .field("index", &self.index)
            .field("children", &self.data().children)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{ErrorKind, Result};
    use crate::name_map::NameMap;
    use crate::read::{Blk, ParentContext};
    use crate::value::Value;

    #[test]
    fn read_empty_body() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x00,              // Name map
            0x00, 0x00, 0x00,  // Blocks, params, large data
        ];

        let blk = Blk::from_body("empty.blk", &input, None)?;
        assert_eq!(blk.block_count(), 1);
        assert!(blk.root().params().is_empty());
        assert_eq!(blk.root().child_count(), 0);
        assert_eq!(blk.root().id(), None);
        Ok(())
    }

    #[test]
    fn read_params_without_blocks() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x01, 0x02, b'a', 0x00,                          // Name map
            0x00, 0x02, 0x00,                                // Blocks, params, large data
            0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00,  // a:i=1
            0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00,  // a:i=2
        ];

        let blk = Blk::from_body("flat.blk", &input, None)?;
        let root = blk.root();
        assert_eq!(root.name(), "");
        assert_eq!(root.params().len(), 2);
        assert_eq!(root.params()[1].value, Value::Int(2));
        Ok(())
    }

    #[test]
    fn read_nested_blocks() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x03, 0x0A,                                      // Name map
            b'r', b'o', b'o', b't', 0x00,
            b'c', b'h', 0x00,
            b'v', 0x00,
            0x03, 0x03, 0x00,                                // Blocks, params, large data
            0x02, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00,  // v:i=1, owned by root
            0x02, 0x00, 0x00, 0x02, 0x02, 0x00, 0x00, 0x00,  // v:i=2, owned by block 1
            0x02, 0x00, 0x00, 0x02, 0x03, 0x00, 0x00, 0x00,  // v:i=3, owned by block 2
            0x00, 0x01, 0x02, 0x01,                          // unnamed root, 1 param, children 1..3
            0x02, 0x01, 0x00,                                // "ch", 1 param
            0x02, 0x01, 0x00,                                // "ch", 1 param
        ];

        let blk = Blk::from_body("nested.blk", &input, None)?;
        assert_eq!(blk.block_count(), 3);

        let root = blk.root();
        assert_eq!(root.param("v"), Some(&Value::Int(1)));

        let children = root.children().collect::<Vec<_>>();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name(), "ch");
        assert_eq!(children[0].id(), Some(1));
        assert_eq!(children[0].param("v"), Some(&Value::Int(2)));
        assert_eq!(children[1].param("v"), Some(&Value::Int(3)));
        assert_eq!(root.child("ch").map(|c| c.index()), Some(1));
        Ok(())
    }

    #[test]
    fn read_slim_body_with_parent() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x00,                                            // Name map
            0x00, 0x02, 0x00,                                // Blocks, params, large data
            0x00, 0x00, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00,  // name:t="value"
            0x01, 0x00, 0x00, 0x09, 0x01, 0x00, 0x00, 0x00,  // value:b=yes
        ];

        let parent: NameMap = ["name", "value"].into_iter().collect();
        let blk = Blk::from_body("slim.blk", &input, Some(&parent))?;
        assert_eq!(blk.root().param("name"), Some(&Value::Str("value".into())));
        assert_eq!(blk.root().param("value"), Some(&Value::Bool(true)));

        let err = Blk::from_body("slim.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        Ok(())
    }

    #[test]
    fn read_packed_file() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x03,                                            // Slim
            0x00,                                            // Name map
            0x00, 0x01, 0x00,                                // Blocks, params, large data
            0x00, 0x00, 0x00, 0x02, 0x2A, 0x00, 0x00, 0x00,  // answer:i=42
        ];

        let names: NameMap = ["answer"].into_iter().collect();
        let parent = ParentContext {
            name_map: &names,
            dictionary: None,
        };
        let blk = Blk::decode("answer.blk", &input, Some(&parent))?;
        assert_eq!(blk.root().param("answer"), Some(&Value::Int(42)));
        assert!(blk.packing().is_some_and(|p| p.is_slim()));
        Ok(())
    }

    #[test]
    fn read_rejects_child_span_before_parent() {
        #[rustfmt::skip]
        let input = [
            0x00,
            0x02, 0x00, 0x00,
            0x00, 0x00, 0x01, 0x01,  // root, child 1..2
            0x00, 0x00, 0x01, 0x00,  // block 1, child 0..1
        ];

        let err = Blk::from_body("cycle.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_rejects_shared_children() {
        #[rustfmt::skip]
        let input = [
            0x00,
            0x03, 0x00, 0x00,
            0x00, 0x00, 0x02, 0x01,  // root, children 1..3
            0x00, 0x00, 0x01, 0x02,  // block 1, child 2..3
            0x00, 0x00, 0x00,        // block 2
        ];

        let err = Blk::from_body("shared.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_rejects_child_span_past_end() {
        #[rustfmt::skip]
        let input = [
            0x00,
            0x01, 0x00, 0x00,
            0x00, 0x00, 0x02, 0x01,  // root, children 1..3 of 1 block
        ];

        let err = Blk::from_body("short.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_rejects_too_many_owned_params() {
        #[rustfmt::skip]
        let input = [
            0x00,
            0x01, 0x00, 0x00,
            0x00, 0x01, 0x00,  // root claims one parameter
        ];

        let err = Blk::from_body("params.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_rejects_truncated_large_data() {
        let input = [0x00, 0x00, 0x00, 0x10, 0x01, 0x02];
        let err = Blk::from_body("large.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_rejects_truncated_params() {
        let input = [0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x02];
        let err = Blk::from_body("params.blk", &input, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }
}
