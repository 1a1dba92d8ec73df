//! Payload obfuscation.
//!
//! Packed payloads have two 16 byte windows XORed with fixed keys: the first 16 bytes and the 16 bytes
//! following the middle section. The transform is its own inverse.

use tracing::instrument;

use crate::error::{Error, Result};

const HEAD_KEY: [u8; 16] = [
    0x55, 0xAA, 0x55, 0xAA, 0x0F, 0xF0, 0x0F, 0xF0, 0x55, 0xAA, 0x55, 0xAA, 0x48, 0x12, 0x48, 0x12,
];

const TAIL_KEY: [u8; 16] = [
    0x48, 0x12, 0x48, 0x12, 0x55, 0xAA, 0x55, 0xAA, 0x0F, 0xF0, 0x0F, 0xF0, 0x55, 0xAA, 0x55, 0xAA,
];

/// Size of the section between the two XORed windows
fn middle_size(packed_size: usize) -> usize {
    let tail = match packed_size {
        32.. => 32,
        16.. => 16,
        _ => 0,
    };
    packed_size - tail - packed_size % 4
}

/// Number of payload bytes covered by a packed size
pub fn obfuscated_len(packed_size: u32) -> usize {
    let packed_size = packed_size as usize;
    middle_size(packed_size) + 32 + packed_size % 4
}

/// Undo (or apply) the obfuscation of a packed payload
///
/// Only the leading [`obfuscated_len`] bytes of `data` are returned.
#[instrument(skip(data), fields(len = data.len()))]
pub fn deobfuscate(data: &[u8], packed_size: u32) -> Result<Vec<u8>> {
    let len = obfuscated_len(packed_size);
    let mut result = data
        .get(..len)
        .ok_or_else(|| Error::out_of_bounds("payload", 0, len as u64, data.len()))?
        .to_vec();

    let tail = 16 + middle_size(packed_size as usize);
    xor(&mut result[..16], &HEAD_KEY);
    xor(&mut result[tail..tail + 16], &TAIL_KEY);
    Ok(result)
}

fn xor(window: &mut [u8], key: &[u8; 16]) {
    window.iter_mut().zip(key).for_each(|(b, k)| *b ^= k);
}
