//! This library handles reading **VROMFS** archives used by *War Thunder*.
//!
//! # VROMFS Archive Format Documentation
//!
//! A VROMFS ("virtual ROM file system") file bundles game configuration and asset metadata, mostly BLK
//! files (see [`wt_blk`]), into a single obfuscated and compressed payload.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "VRFs", or "VRFx" when an extended header follows |
//! | 0x0004         | Platform               | 4 bytes: platform tag padded with NUL bytes                |
//! | 0x0008         | Original size          | 4 bytes: size of the payload once decompressed             |
//! | 0x000C         | Packed size            | 3 bytes: size of the stored payload, zero if not packed    |
//! | 0x000F         | Type                   | 1 byte: `0x40` plain, `0x80` zlib if packed, `0xC0` zstd   |
//!
//! ### Extended Header
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0010         | Size                   | 2 bytes: size of the extended header                       |
//! | 0x0012         | Flags                  | 2 bytes                                                    |
//! | 0x0014         | Version                | 4 bytes: one byte per version component                    |
//!
//! ### Payload
//!
//! Packed payloads are obfuscated before being decompressed, see [`obfuscation`]. Once decompressed the
//! payload starts with the file table:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Names offset           | 4 bytes: offset of the name table                          |
//! | 0x0004         | File count             | 4 bytes                                                    |
//! | 0x0008         | Reserved               | 8 bytes                                                    |
//! | 0x0010         | Data offset            | 4 bytes: offset of the data table                          |
//!
//! The name table starts with the offset of the first file name, the names follow each other as NUL
//! terminated strings. The data table holds one 16 byte entry per file:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Offset                 | 4 bytes: offset of the file contents in the payload        |
//! | 0x0004         | Size                   | 4 bytes: size of the file contents                         |
//! | 0x0008         | Reserved               | 8 bytes                                                    |
//!
//! ### Special Files
//!
//! - The first file ending in `.dict` is a zstd dictionary shared by the BLK files of the archive.
//! - The first other file ending in `?nm` is renamed to `nm`. It holds an 8 byte names digest, a 32 byte
//!   dictionary digest and a zstd frame with the name map shared by slim BLK files.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.vromfs.bin`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod compression;
pub mod error;
pub mod obfuscation;
pub mod read;
pub mod types;

pub use compression::CompressionMethod;
pub use read::{FileRecord, VromfsArchive};
