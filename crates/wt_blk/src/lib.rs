//! This library handles decoding **BLK** files used by *War Thunder*.
//!
//! # BLK Format Documentation
//!
//! BLK files store a tree of named blocks holding typed parameters. The binary form flattens the tree into
//! one array of parameters and one array of block descriptors, children being referenced by their offset in
//! the block array.
//!
//! ## File Structure
//!
//! The first byte of a file selects its packing, see [`packing::BlkPacking`]. After unpacking, the body has
//! the following layout. All integers marked *varint* use the 7-bit encoding of [`varint`].
//!
//! | Field              | Description                                                          |
//! |--------------------|----------------------------------------------------------------------|
//! | Name map           | varint count, then (if non-zero) varint size and `size` bytes of names |
//! | Block count        | varint                                                               |
//! | Parameter count    | varint                                                               |
//! | Large data size    | varint                                                               |
//! | Large data         | `size` bytes holding values that do not fit in 4 bytes              |
//! | Parameters         | `count` 8 byte records                                               |
//! | Blocks             | `count` descriptors                                                  |
//!
//! ### Parameters
//!
//! | Offset (bytes) | Field     | Description                                                 |
//! |----------------|-----------|-------------------------------------------------------------|
//! | 0x0000         | Name id   | 3 bytes: index into the name map                            |
//! | 0x0003         | Type      | 1 byte: see [`value::DataType`]                             |
//! | 0x0004         | Payload   | 4 bytes: inline value or offset into the large data         |
//!
//! ### Blocks
//!
//! | Field          | Description                                                     |
//! |----------------|-----------------------------------------------------------------|
//! | Name id + 1    | varint, zero for an unnamed block                               |
//! | Parameters     | varint: number of parameters owned by the block                 |
//! | Children       | varint: number of child blocks                                  |
//! | Child offset   | varint, only present with children: index of the first child    |
//!
//! Parameters are assigned to blocks from the end of the parameter array while walking the blocks from the
//! last to the first. The first block is the root of the tree.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.blk`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod error;
pub mod name_map;
pub mod packing;
pub mod projection;
pub mod read;
pub mod types;
pub mod value;
pub mod varint;

#[cfg(feature = "serde")]
mod serde;

pub use name_map::NameMap;
pub use projection::{Node, OrderedMap};
pub use read::{Blk, Block, ParentContext};
pub use value::{DataType, Value};
