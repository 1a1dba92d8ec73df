//! Types for reading VROMFS archives
//!

use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Seek, SeekFrom},
};

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::{map::Entry, IndexMap};
use tracing::{debug, instrument, trace, warn};
use wt_blk::{packing::decode_zstd, Blk, NameMap, ParentContext};

use crate::{
    compression::decompress,
    error::{Error, FileNotFoundError, Result},
    obfuscation::deobfuscate,
    types::{DataEntry, FileTableHeader, VromfsExtHeader, VromfsHeader, VromfsMagic},
};

/// Suffix of the shared zstd dictionary
pub const DICTIONARY_SUFFIX: &str = ".dict";

/// Suffix of the shared name map file
pub const NAME_MAP_SUFFIX: &str = "?nm";

/// Name the shared name map file is stored under
pub const NAME_MAP_FILE: &str = "nm";

/// Bytes preceding the zstd frame of the name map file: a names digest and a dictionary digest
const NAME_MAP_DIGESTS: usize = 8 + 32;

/// A file stored in a VROMFS archive
#[derive(Clone, PartialEq, Eq)]
pub struct FileRecord {
    name: Box<str>,
    offset: u32,
    data: Box<[u8]>,
}

impl FileRecord {
    /// Get the name of the file
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of the file, in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Get the offset of the file in the decompressed payload
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Get the contents of the file
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the file is a BLK file
    pub fn is_blk(&self) -> bool {
        self.name.ends_with(".blk")
    }
}

impl AsRef<[u8]> for FileRecord {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Location of a file inside the payload, as listed by the file table
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableEntry {
    name: String,
    offset: u32,
    size: u32,
}

/// VROMFS archive reader
///
/// The whole archive is decoded up front, files are kept in the order of the file table.
///
/// ```no_run
/// fn list_vromfs_contents(reader: impl std::io::Read) -> wt_vromfs::error::Result<()> {
///     let vromfs = wt_vromfs::VromfsArchive::new(reader)?;
///
///     for file in vromfs.files() {
///         println!("{} ({} bytes)", file.name(), file.size());
///     }
///
///     for (name, blk) in vromfs.blk_files() {
///         println!("{name}:\n{}", blk?.to_text());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct VromfsArchive {
    header: VromfsHeader,
    ext_header: Option<VromfsExtHeader>,
    files: IndexMap<Box<str>, FileRecord>,
    name_map: NameMap,
    dictionary: Option<usize>,
}

impl VromfsArchive {
    /// Read a VROMFS archive collecting the files it contains.
    pub fn new<R: Read>(mut reader: R) -> Result<VromfsArchive> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Decode a VROMFS archive held in memory
    #[instrument(skip(data), fields(len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<VromfsArchive> {
        let mut reader = Cursor::new(data);
        let header = VromfsHeader::read(&mut reader)?;
        let ext_header = match header.magic {
            VromfsMagic::Extended => Some(VromfsExtHeader::read(&mut reader)?),
            VromfsMagic::Standard => None,
        };
        debug!(?header, ?ext_header);

        let payload = &data[reader.position() as usize..];
        let payload = Self::unpack_payload(&header, payload)?;
        let entries = Self::read_file_table(&payload)?;

        let mut files: IndexMap<Box<str>, FileRecord> = IndexMap::with_capacity(entries.len());
        for entry in entries {
            let start = entry.offset as usize;
            let data = start
                .checked_add(entry.size as usize)
                .and_then(|end| payload.get(start..end))
                .ok_or_else(|| {
                    Error::out_of_bounds(
                        "file data",
                        entry.offset.into(),
                        entry.size.into(),
                        payload.len(),
                    )
                })?;

            match files.entry(entry.name.into()) {
                Entry::Vacant(slot) => {
                    let name = slot.key().clone();
                    slot.insert(FileRecord {
                        name,
                        offset: entry.offset,
                        data: data.into(),
                    });
                }
                Entry::Occupied(slot) => warn!(name = %slot.key(), "skipping duplicate file"),
            }
        }

        let dictionary = files
            .keys()
            .position(|name| name.ends_with(DICTIONARY_SUFFIX));
        let name_map = match files.get(NAME_MAP_FILE) {
            Some(file) => Self::read_name_map(file.data())?,
            None => NameMap::default(),
        };
        debug!(
            files = files.len(),
            names = name_map.len(),
            dictionary = dictionary.is_some(),
            "read vromfs"
        );

        Ok(VromfsArchive {
            header,
            ext_header,
            files,
            name_map,
            dictionary,
        })
    }

    fn unpack_payload(header: &VromfsHeader, payload: &[u8]) -> Result<Vec<u8>> {
        let original_size = header.original_size as usize;
        if !header.is_packed() {
            trace!("payload is not packed");
            return payload
                .get(..original_size)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| {
                    Error::out_of_bounds("payload", 0, original_size as u64, payload.len())
                });
        }

        let payload = deobfuscate(payload, header.packed_size)?;
        decompress(&payload, header.compression(), None, original_size)
    }

    fn read_file_table(payload: &[u8]) -> Result<Vec<TableEntry>> {
        let mut reader = Cursor::new(payload);
        let FileTableHeader {
            names_offset,
            count,
            data_offset,
        } = FileTableHeader::read(&mut reader)?;
        trace!(names_offset, count, data_offset);
        let count = count as usize;

        // every file needs at least a terminator and a 16 byte data entry
        let capacity = count.min(payload.len() / 17);

        reader.seek(SeekFrom::Start(names_offset.into()))?;
        let first_name = reader.read_u32::<LittleEndian>()?;
        reader.seek(SeekFrom::Start(first_name.into()))?;

        let mut names = Vec::with_capacity(capacity);
        let mut dictionary_found = false;
        let mut name_map_found = false;
        for _ in 0..count {
            let mut name_raw = Vec::new();
            loop {
                let char = reader.read_u8()?;
                if char == b'\0' {
                    break;
                }
                name_raw.push(char);
            }

            let mut name = String::from_utf8_lossy(&name_raw).into_owned();
            if !dictionary_found && name.ends_with(DICTIONARY_SUFFIX) {
                dictionary_found = true;
            } else if !name_map_found && name.ends_with(NAME_MAP_SUFFIX) {
                trace!(%name, "found name map file");
                name = NAME_MAP_FILE.to_owned();
                name_map_found = true;
            }
            names.push(name);
        }

        reader.seek(SeekFrom::Start(data_offset.into()))?;
        names
            .into_iter()
            .map(|name| {
                let DataEntry { offset, size } = DataEntry::read(&mut reader)?;
                Ok(TableEntry { name, offset, size })
            })
            .collect()
    }

    fn read_name_map(data: &[u8]) -> Result<NameMap> {
        let frame = data.get(NAME_MAP_DIGESTS..).ok_or_else(|| {
            Error::out_of_bounds("name map file", 0, NAME_MAP_DIGESTS as u64, data.len())
        })?;
        let names = decode_zstd(frame, None)?;
        Ok(NameMap::decode(&names)?)
    }

    /// Number of files contained in this archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether this archive contains no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all the file names in this archive.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_ref())
    }

    /// Returns an iterator over all files in the order of the file table
    pub fn files(&self) -> impl ExactSizeIterator<Item = &FileRecord> {
        self.files.values()
    }

    /// Get the index of a file by name, if it's present.
    #[inline(always)]
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.files.get_index_of(name)
    }

    /// Get the name of a file, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.files.get_index(index).map(|(name, _)| name.as_ref())
    }

    /// Search for a file by name
    pub fn by_name(&self, name: &str) -> Result<&FileRecord> {
        self.files
            .get(name)
            .ok_or_else(|| FileNotFoundError::Name(name.to_owned()).into())
    }

    /// Get a contained file by index
    pub fn by_index(&self, index: usize) -> Result<&FileRecord> {
        self.files
            .get_index(index)
            .map(|(_, file)| file)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(index)))
    }

    /// The archive header
    pub fn header(&self) -> &VromfsHeader {
        &self.header
    }

    /// The extended header of `VRFx` archives
    pub fn ext_header(&self) -> Option<&VromfsExtHeader> {
        self.ext_header.as_ref()
    }

    /// Names shared by the slim BLK files of this archive, empty when the archive has no name map file
    pub fn name_map(&self) -> &NameMap {
        &self.name_map
    }

    /// The shared zstd dictionary, if the archive carries one
    pub fn dictionary(&self) -> Option<&[u8]> {
        self.dictionary
            .and_then(|i| self.files.get_index(i))
            .map(|(_, file)| file.data())
    }

    /// Shared state handed to BLK decoding
    pub fn context(&self) -> ParentContext<'_> {
        ParentContext {
            name_map: &self.name_map,
            dictionary: self.dictionary(),
        }
    }

    /// Total size of the files in the archive, if it can be known.
    pub fn decompressed_size(&self) -> Option<u128> {
        let mut total = 0u128;
        for file in self.files.values() {
            total = total.checked_add(file.size() as u128)?;
        }
        Some(total)
    }

    /// Decode a BLK file of this archive by name
    pub fn decode_blk(&self, name: &str) -> Result<Blk> {
        let file = self.by_name(name)?;
        Ok(Blk::decode(file.name(), file.data(), Some(&self.context()))?)
    }

    /// Decode every `.blk` file of this archive, in the order of the file table
    pub fn blk_files(&self) -> impl Iterator<Item = (&str, Result<Blk>)> + '_ {
        let context = self.context();
        self.files.values().filter(|f| f.is_blk()).map(move |file| {
            let blk = Blk::decode(file.name(), file.data(), Some(&context));
            (file.name(), blk.map_err(Error::from))
        })
    }

    /// Decode every `.blk` file of this archive on the rayon thread pool
    ///
    /// Results are returned in the order of the file table.
    #[cfg(feature = "parallel")]
    pub fn par_decode_blk_files(&self) -> Vec<(&str, Result<Blk>)> {
        use rayon::prelude::*;

        let context = self.context();
        let files: Vec<&FileRecord> = self.files.values().filter(|f| f.is_blk()).collect();
        files
            .into_par_iter()
            .map(|file| {
                let blk = Blk::decode(file.name(), file.data(), Some(&context));
                (file.name(), blk.map_err(Error::from))
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{ErrorKind, Result};
    use crate::read::{TableEntry, VromfsArchive};

    #[rustfmt::skip]
    const TABLE: [u8; 102] = [
        0x20, 0x00, 0x00, 0x00,  // Names offset
        0x03, 0x00, 0x00, 0x00,  // Count
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x32, 0x00, 0x00, 0x00,  // Data offset
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x24, 0x00, 0x00, 0x00,  // First name
        b'a', b'.', b'd', b'i', b'c', b't', 0x00,
        b'x', b'?', b'n', b'm', 0x00,
        b'b', 0x00,
        0x00, 0x00, 0x00, 0x00,  // a.dict
        0x02, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x00, 0x00,  // nm
        0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x62, 0x00, 0x00, 0x00,  // b
        0x04, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x01, 0x02, 0x03, 0x04,
    ];

    #[test]
    fn read_file_table() -> Result<()> {
        let entries = VromfsArchive::read_file_table(&TABLE)?;
        let expected = vec![
            TableEntry {
                name: "a.dict".into(),
                offset: 0,
                size: 2,
            },
            TableEntry {
                name: "nm".into(),
                offset: 0x10,
                size: 0,
            },
            TableEntry {
                name: "b".into(),
                offset: 0x62,
                size: 4,
            },
        ];
        assert_eq!(entries, expected);
        Ok(())
    }

    #[test]
    fn read_file_table_truncated_names() {
        let err = VromfsArchive::read_file_table(&TABLE[..0x28]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn read_file_table_truncated_entries() {
        let err = VromfsArchive::read_file_table(&TABLE[..0x50]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }
}
