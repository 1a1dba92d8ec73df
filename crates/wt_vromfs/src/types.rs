//! Base types for structure of VROMFS file.

use std::borrow::Cow;

use binrw::BinRead;

use crate::compression::CompressionMethod;

/// Leading magic of a VROMFS file
#[derive(BinRead, Debug, Copy, Clone, PartialEq, Eq)]
pub enum VromfsMagic {
    /// "VRFs", the payload follows the header directly
    #[br(magic = b"VRFs")]
    Standard,

    /// "VRFx", an extended header follows the header
    #[br(magic = b"VRFx")]
    Extended,
}

/// Raw format type selected by the last byte of the header
#[derive(BinRead, Debug, Copy, Clone, PartialEq, Eq)]
#[br(repr = u8)]
pub enum VromfsType {
    /// Payload is stored as it is
    Plain = 0x40,

    /// Payload is zlib compressed when a packed size is given
    MaybePacked = 0x80,

    /// Payload is a zstd frame
    ZstdPacked = 0xC0,
}

/// VROMFS file header
///
/// All data is stored in little endian format
#[derive(BinRead, Debug, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct VromfsHeader {
    /// Magic, decides whether a [`VromfsExtHeader`] follows
    pub magic: VromfsMagic,

    /// Target platform tag padded with NUL bytes, e.g. `"pc\0\0"`
    pub platform: [u8; 4],

    /// Size of the payload once decompressed
    pub original_size: u32,

    /// Size of the payload as stored, zero when it isn't compressed
    #[br(parse_with = binrw::helpers::read_u24)]
    pub packed_size: u32,

    /// Format of the payload
    pub vromfs_type: VromfsType,
}

impl VromfsHeader {
    /// Platform tag without its padding
    pub fn platform_name(&self) -> Cow<'_, str> {
        let end = self
            .platform
            .iter()
            .rposition(|&b| b != b'\0')
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.platform[..end])
    }

    /// Whether the payload is obfuscated and compressed
    pub fn is_packed(&self) -> bool {
        self.packed_size > 0
    }

    /// How the payload has to be decompressed
    pub fn compression(&self) -> CompressionMethod {
        match self.vromfs_type {
            VromfsType::ZstdPacked => CompressionMethod::Zstd,
            VromfsType::MaybePacked if self.is_packed() => CompressionMethod::Zlib,
            VromfsType::MaybePacked | VromfsType::Plain => CompressionMethod::None,
        }
    }
}

/// Extended header following a [`VromfsMagic::Extended`] header
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct VromfsExtHeader {
    /// Size of the extended header
    pub size: u16,

    /// Archive flags
    pub flags: u16,

    /// Packed content version, one byte per component
    pub version: u32,
}

impl VromfsExtHeader {
    /// Content version as `major.minor.patch.build`
    pub fn version_string(&self) -> String {
        let [build, patch, minor, major] = self.version.to_le_bytes();
        format!("{major}.{minor}.{patch}.{build}")
    }
}

/// Start of the decompressed payload, locating the name and data tables
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct FileTableHeader {
    /// Offset of the name table, which begins with the offset of the first name
    #[br(pad_after = 8)]
    pub names_offset: u32,

    /// Number of files
    pub count: u32,

    /// Offset of the data table
    #[br(pad_after = 8)]
    pub data_offset: u32,
}

/// One record of the data table
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct DataEntry {
    /// Offset of the file in the payload
    pub offset: u32,

    /// Size of the file
    #[br(pad_after = 8)]
    pub size: u32,
}
