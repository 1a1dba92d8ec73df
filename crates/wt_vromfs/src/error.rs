//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

pub use wt_blk::error::ErrorKind;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent warpper for [`wt_blk::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    BlkError(#[from] wt_blk::error::Error),

    /// an offset or length falls outside of its buffer
    #[error("{section} range {offset}..{end} is out of bounds (length {len})")]
    OutOfBounds {
        /// Buffer being indexed
        section: &'static str,
        /// Start of the requested range
        offset: u64,
        /// End of the requested range
        end: u64,
        /// Length of the buffer
        len: usize,
    },

    /// payload could not be decompressed
    #[error("payload decompression failed")]
    Decompression(#[source] std::io::Error),

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

impl Error {
    pub(crate) fn out_of_bounds(section: &'static str, offset: u64, size: u64, len: usize) -> Self {
        Error::OutOfBounds {
            section,
            offset,
            end: offset.saturating_add(size),
            len,
        }
    }

    /// Which category this error falls in
    pub fn kind(&self) -> ErrorKind {
        use std::io::ErrorKind::UnexpectedEof;

        match self {
            Error::IOError(e) if e.kind() == UnexpectedEof => ErrorKind::Bounds,
            Error::BinRWError(e) if e.is_eof() => ErrorKind::Bounds,
            Error::IOError(_) | Error::BinRWError(_) => ErrorKind::Format,
            Error::BlkError(e) => e.kind(),
            Error::OutOfBounds { .. } => ErrorKind::Bounds,
            Error::Decompression(_) => ErrorKind::Codec,
            Error::FileNotFound(_) => ErrorKind::Lookup,
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
