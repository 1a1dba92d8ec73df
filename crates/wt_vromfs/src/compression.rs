//! Payload decompression handling.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use tracing::{instrument, warn};

use crate::error::{Error, Result};

/// Identifies the storage format of a VROMFS payload, see [`crate::types::VromfsHeader::compression`]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None,

    /// Compress the data using Zlib
    Zlib,

    /// Compress the data using a single Zstandard frame
    Zstd,
}

pub(crate) enum PayloadReader<'a> {
    Raw(&'a [u8]),
    Zlib(Box<ZlibDecoder<&'a [u8]>>),
    Zstd(Box<zstd::Decoder<'static, &'a [u8]>>),
}

impl<'a> PayloadReader<'a> {
    #[instrument(skip(data, dictionary), fields(len = data.len()))]
    pub fn new(
        data: &'a [u8],
        compression: CompressionMethod,
        dictionary: Option<&[u8]>,
    ) -> Result<Self> {
        Ok(match compression {
            CompressionMethod::None => PayloadReader::Raw(data),
            CompressionMethod::Zlib => PayloadReader::Zlib(Box::new(ZlibDecoder::new(data))),
            CompressionMethod::Zstd => {
                let decoder = match dictionary {
                    Some(dictionary) => zstd::Decoder::with_dictionary(data, dictionary),
                    None => zstd::Decoder::with_buffer(data),
                }
                .map_err(Error::Decompression)?;
                PayloadReader::Zstd(Box::new(decoder.single_frame()))
            }
        })
    }
}

impl Read for PayloadReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PayloadReader::Raw(r) => r.read(buf),
            PayloadReader::Zlib(r) => r.read(buf),
            PayloadReader::Zstd(r) => r.read(buf),
        }
    }

    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            PayloadReader::Raw(r) => r.read_to_end(buf),
            PayloadReader::Zlib(r) => r.read_to_end(buf),
            PayloadReader::Zstd(r) => r.read_to_end(buf),
        }
    }
}

/// Decompress a whole payload
///
/// `expected` is the size announced by the header, a mismatch is only reported.
pub fn decompress(
    data: &[u8],
    compression: CompressionMethod,
    dictionary: Option<&[u8]>,
    expected: usize,
) -> Result<Vec<u8>> {
    let mut reader = PayloadReader::new(data, compression, dictionary)?;
    let mut output = Vec::with_capacity(expected.min(data.len().saturating_mul(16)));
    reader
        .read_to_end(&mut output)
        .map_err(Error::Decompression)?;

    if output.len() != expected {
        warn!(expected, actual = output.len(), "decompressed size mismatch");
    }
    Ok(output)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use flate2::{write::ZlibEncoder, Compression};
    use pretty_assertions::assert_eq;

    use crate::compression::{decompress, CompressionMethod};
    use crate::error::{ErrorKind, Result};

    const HELLO: &[u8] = b"Hello World";

    #[test]
    fn decompress_raw() -> Result<()> {
        assert_eq!(decompress(HELLO, CompressionMethod::None, None, 11)?, HELLO);
        Ok(())
    }

    #[test]
    fn decompress_zlib() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x78, 0x9C, 0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x08, 0xCF,
            0x2F, 0xCA, 0x49, 0x01, 0x00, 0x18, 0x0B, 0x04, 0x1D,
        ];

        assert_eq!(decompress(&input, CompressionMethod::Zlib, None, 11)?, HELLO);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"Hello World Hello World Hello World")?;
        let encoded = encoder.finish()?;
        assert_eq!(
            decompress(&encoded, CompressionMethod::Zlib, None, 35)?,
            b"Hello World Hello World Hello World"
        );
        Ok(())
    }

    #[test]
    fn decompress_zstd_ignores_trailing_bytes() -> Result<()> {
        let mut input = zstd::encode_all(HELLO, 3)?;
        input.extend([0xAA; 16]);

        assert_eq!(decompress(&input, CompressionMethod::Zstd, None, 11)?, HELLO);
        Ok(())
    }

    #[test]
    fn decompress_zstd_with_dictionary() -> Result<()> {
        let dictionary = b"Hello World, shared content for the payload".to_vec();
        let mut compressor = zstd::bulk::Compressor::with_dictionary(3, &dictionary)?;
        let input = compressor.compress(HELLO)?;

        let output = decompress(&input, CompressionMethod::Zstd, Some(&dictionary), 11)?;
        assert_eq!(output, HELLO);
        Ok(())
    }

    #[test]
    fn decompress_corrupt_zstd() {
        let err = decompress(&[0x28, 0xB5, 0x2F, 0xFD, 0xFF], CompressionMethod::Zstd, None, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
    }
}
