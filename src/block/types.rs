//! Constants and primitives shared by the block encoders and decoder.
//!
//! The values here pin down the block wire format and the match-finder
//! geometry; see the [LZ4 block format specification] for the authoritative
//! description of the on-disk layout.
//!
//! [LZ4 block format specification]: https://github.com/lz4/lz4/blob/dev/doc/lz4_Block_format.md

/// Minimum length of a match; the 4-bit match field in the token encodes
/// `length - MIN_MATCH`.
pub(crate) const MIN_MATCH: usize = 4;

/// Log2 of the back-reference window.
pub(crate) const WIN_SIZE_LOG: usize = 16;

/// Size of the back-reference window.
pub(crate) const WIN_SIZE: usize = 1 << WIN_SIZE_LOG;

/// Largest encodable match offset; also the window mask for the chained
/// match-finder tables.
pub(crate) const WIN_MASK: usize = WIN_SIZE - 1;

/// Log2 of the hash-table slot count. 16 is the sweet spot between locality
/// and collision rate for the fast encoder.
pub(crate) const HASH_LOG: u32 = 16;

/// Hash-table slot count (64K entries).
pub(crate) const HT_SIZE: usize = 1 << HASH_LOG;

const HASH_SHIFT: u32 = 32 - HASH_LOG;

/// Knuth's multiplicative constant; spreads the low bytes of the hashed word
/// across the table well for typical inputs.
const HASHER: u32 = 2_654_435_761;

/// No match may start within this many bytes of the end of the block.
pub(crate) const MF_LIMIT: usize = 12;

/// Every block ends with at least this many literals, unless the whole block
/// is shorter than `MF_LIMIT + 1` bytes and is a single literal run.
pub(crate) const LAST_LITERALS: usize = 5;

/// Controls how aggressively the fast encoder widens its stride while it
/// fails to find matches. The step is `fma >> SKIP_STRENGTH` with `fma`
/// incremented per miss, so the stride stays 1 for the first 64 misses and
/// then grows.
pub(crate) const SKIP_STRENGTH: u32 = 6;

/// Token nibble ceiling: literal or match lengths at or above this value
/// continue into 0xFF-saturated extension bytes.
pub(crate) const NIBBLE_MASK: usize = 0xF;

/// Hashes a 4-byte little-endian word into a table slot.
#[inline]
pub(crate) fn block_hash(word: u32) -> usize {
    (word.wrapping_mul(HASHER) >> HASH_SHIFT) as usize
}

/// Reads the 4-byte little-endian word at `src[i..i + 4]`.
#[inline]
pub(crate) fn read_u32_le(src: &[u8], i: usize) -> u32 {
    u32::from_le_bytes([src[i], src[i + 1], src[i + 2], src[i + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_fits_table() {
        for word in [0u32, 1, 0xFFFF_FFFF, 0xDEAD_BEEF, HASHER] {
            assert!(block_hash(word) < HT_SIZE);
        }
    }

    #[test]
    fn hash_separates_nearby_words() {
        // Not a distribution test, just a sanity check that consecutive
        // words do not collapse onto one slot.
        let slots: std::collections::HashSet<_> = (0u32..64).map(block_hash).collect();
        assert!(slots.len() > 32);
    }

    #[test]
    fn read_u32_le_is_little_endian() {
        assert_eq!(read_u32_le(&[0x04, 0x22, 0x4D, 0x18], 0), 0x184D_2204);
        assert_eq!(read_u32_le(&[0, 0x04, 0x22, 0x4D, 0x18], 1), 0x184D_2204);
    }
}
