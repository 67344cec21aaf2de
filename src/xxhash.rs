//! Thin wrapper around the `xxhash-rust` crate providing the XXH32 API used
//! by the frame format.
//!
//! XXH32 is the only hash the LZ4 frame format uses: the descriptor checksum
//! byte, the optional per-block checksums, and the whole-frame content
//! checksum are all derived from it, always with seed 0.

pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// One-shot XXH32 hash of `data` with the given seed.
///
/// `xxh32_oneshot(b"", 0)` is `0x02CC5D05`, the checksum an empty frame
/// carries when content checksums are enabled.
#[inline]
pub fn xxh32_oneshot(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}
