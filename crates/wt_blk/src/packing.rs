//! Packing of BLK files.
//!
//! The first byte of a BLK file selects how the remaining bytes are stored. Fat files carry their own
//! name map, slim files borrow the name map of their container.

use std::{borrow::Cow, io::Read};

use byteorder::{ByteOrder, LittleEndian};
use tracing::{instrument, trace};

use crate::error::{Error, Result};

/// Identifies how the body of a BLK file is stored
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlkPacking {
    /// Uncompressed body with its own name map
    Fat = 1,

    /// Length prefixed zstd frame holding a fat body
    FatZstd = 2,

    /// Uncompressed body using the container name map
    Slim = 3,

    /// Zstd frame holding a slim body
    SlimZstd = 4,

    /// Zstd frame holding a slim body, compressed with the container's shared dictionary
    SlimZstdDict = 5,
}

impl TryFrom<u8> for BlkPacking {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            1 => BlkPacking::Fat,
            2 => BlkPacking::FatZstd,
            3 => BlkPacking::Slim,
            4 => BlkPacking::SlimZstd,
            5 => BlkPacking::SlimZstdDict,
            other => return Err(Error::UnsupportedPacking(other)),
        })
    }
}

impl BlkPacking {
    /// Whether names are expected to come from the container
    pub fn is_slim(&self) -> bool {
        matches!(
            self,
            BlkPacking::Slim | BlkPacking::SlimZstd | BlkPacking::SlimZstdDict
        )
    }
}

/// Decompress a single zstd frame, optionally with a shared dictionary
pub fn decode_zstd(data: &[u8], dictionary: Option<&[u8]>) -> Result<Vec<u8>> {
    let decoder = match dictionary {
        Some(dictionary) => zstd::Decoder::with_dictionary(data, dictionary),
        None => zstd::Decoder::with_buffer(data),
    }
    .map_err(Error::Decompression)?;

    let mut output = Vec::new();
    decoder
        .single_frame()
        .read_to_end(&mut output)
        .map_err(Error::Decompression)?;
    Ok(output)
}

/// Split a BLK file into its packing and its decompressed body
#[instrument(skip(data, dictionary), fields(len = data.len()))]
pub fn unpack<'a>(data: &'a [u8], dictionary: Option<&[u8]>) -> Result<(BlkPacking, Cow<'a, [u8]>)> {
    let (&tag, rest) = data
        .split_first()
        .ok_or_else(|| Error::out_of_bounds("blk file", 0, 1, 0))?;
    let packing = BlkPacking::try_from(tag)?;
    trace!(?packing);

    let body = match packing {
        BlkPacking::Fat | BlkPacking::Slim => Cow::Borrowed(rest),
        BlkPacking::FatZstd => {
            let len = rest
                .get(..3)
                .map(LittleEndian::read_u24)
                .ok_or_else(|| Error::out_of_bounds("blk file", 1, 3, rest.len()))?
                as usize;
            let frame = rest
                .get(3..3 + len)
                .ok_or_else(|| Error::out_of_bounds("blk file", 4, len, data.len()))?;
            Cow::Owned(decode_zstd(frame, None)?)
        }
        BlkPacking::SlimZstd => Cow::Owned(decode_zstd(rest, None)?),
        BlkPacking::SlimZstdDict => {
            let dictionary = dictionary.ok_or(Error::MissingDictionary)?;
            Cow::Owned(decode_zstd(rest, Some(dictionary))?)
        }
    };

    Ok((packing, body))
}
