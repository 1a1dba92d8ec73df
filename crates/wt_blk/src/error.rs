//! Error types that can be emitted from this library
//!

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// file uses a packing that cannot be decoded
    #[error("unsupported blk packing {0:#04x}")]
    #[diagnostic(help("packing bytes 1 to 5 are binary, anything else is the text encoding"))]
    UnsupportedPacking(u8),

    /// a variable length integer does not fit its target
    #[error("malformed variable length integer")]
    InvalidVarInt,

    /// parameter record carries an unknown type tag
    #[error("unknown value type {0:#04x}")]
    UnsupportedType(u8),

    /// an offset or length falls outside of its buffer
    #[error("{section} range {offset}..{end} is out of bounds (length {len})")]
    OutOfBounds {
        /// Buffer being indexed
        section: &'static str,
        /// Start of the requested range
        offset: i64,
        /// End of the requested range
        end: i64,
        /// Length of the buffer
        len: usize,
    },

    /// a string in {0} is missing its terminator
    #[error("unterminated string in {0}")]
    Unterminated(&'static str),

    /// name id can't be found in any reachable name map
    #[error("name id {0} can't be resolved")]
    NameNotFound(i64),

    /// zstd frame or dictionary rejected the data
    #[error("decompression failed")]
    Decompression(#[source] std::io::Error),

    /// file requires the shared dictionary of its container
    #[error("file is compressed with a shared dictionary but none is available")]
    MissingDictionary,
}

/// Broad classification of [`Error`] values
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Header, packing or encoding is malformed
    Format,
    /// Unknown value type tag
    UnsupportedType,
    /// Offset or length outside of a buffer, including truncated input
    Bounds,
    /// Name id not resolvable
    Lookup,
    /// Decompression failure or missing dictionary
    Codec,
}

impl Error {
    pub(crate) fn out_of_bounds(section: &'static str, offset: i64, size: usize, len: usize) -> Self {
        Error::OutOfBounds {
            section,
            offset,
            end: offset.saturating_add(size as i64),
            len,
        }
    }

    /// Which category this error falls in
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IOError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => ErrorKind::Bounds,
            Error::BinRWError(e) if e.is_eof() => ErrorKind::Bounds,
            Error::IOError(_) | Error::BinRWError(_) => ErrorKind::Format,
            Error::UnsupportedPacking(_) | Error::InvalidVarInt => ErrorKind::Format,
            Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::OutOfBounds { .. } | Error::Unterminated(_) => ErrorKind::Bounds,
            Error::NameNotFound(_) => ErrorKind::Lookup,
            Error::Decompression(_) | Error::MissingDictionary => ErrorKind::Codec,
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
