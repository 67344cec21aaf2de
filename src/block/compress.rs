//! LZ4 block compression, fast mode.
//!
//! Single-pass greedy match finder: a 64K-entry hash table maps the 4-byte
//! word at each probed position to the most recent position that hashed to
//! the same slot. A candidate is accepted when it lies inside the 64 KiB
//! window and its first four bytes match, then extended forward as far as
//! the format allows. Between matches the probe stride widens adaptively so
//! incompressible regions are crossed quickly.
//!
//! The encoder never reads outside `src` nor writes outside `dst`; a
//! destination too small for the encoded result fails with
//! [`Error::InvalidSourceShortBuffer`], and inputs with no match at all
//! report 0 so callers can store the bytes uncompressed.

use crate::block::encode::{put_last_literals, put_sequence};
use crate::block::types::{
    block_hash, read_u32_le, HT_SIZE, LAST_LITERALS, MF_LIMIT, MIN_MATCH, SKIP_STRENGTH, WIN_MASK,
};
use crate::error::Error;
use crate::pool;

/// Largest input a single block may carry.
pub const MAX_INPUT_SIZE: usize = 0x7E00_0000;

/// Worst-case compressed size for an `n`-byte input: the whole input as
/// literals, the length-extension bytes needed to describe it, and the
/// token/trailer overhead.
#[inline]
pub fn compress_block_bound(n: usize) -> usize {
    n + n / 255 + 16
}

/// Compresses `src` into `dst` using a pooled hash table.
///
/// Returns the compressed size, or 0 when the input is too small or carries
/// no match of at least 4 bytes inside a 64 KiB window (the caller stores
/// such input uncompressed). Fails with [`Error::InvalidSourceShortBuffer`]
/// when matches were found but `dst` cannot hold the encoded result.
pub fn compress_block(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let mut table = pool::get_hash_table();
    let written = compress_cleared(src, dst, &mut table);
    pool::put_hash_table(table);
    written
}

/// Like [`compress_block`], but using the caller's hash table: no allocation
/// on the hot path. The table is cleared on entry.
///
/// # Panics
///
/// Panics when `table` has fewer than 65 536 slots.
pub fn compress_block_with_table(
    src: &[u8],
    dst: &mut [u8],
    table: &mut [u32],
) -> Result<usize, Error> {
    assert!(
        table.len() >= HT_SIZE,
        "hash table must have at least {HT_SIZE} slots"
    );
    let table = &mut table[..HT_SIZE];
    table.fill(0);
    compress_cleared(src, dst, table)
}

/// Core encoder. `table` must hold [`HT_SIZE`] zeroed slots; slots store
/// `position + 1` so that 0 means "unset".
pub(crate) fn compress_cleared(
    src: &[u8],
    dst: &mut [u8],
    table: &mut [u32],
) -> Result<usize, Error> {
    debug_assert!(table.len() >= HT_SIZE && table.iter().all(|&s| s == 0));

    let n = src.len();
    if n == 0 {
        return Ok(0);
    }
    if n > MAX_INPUT_SIZE {
        return Err(Error::InvalidSourceShortBuffer);
    }
    if n <= MF_LIMIT {
        // Too small to carry a match.
        return Ok(0);
    }

    // Matches may start no later than `sn` and may not extend past
    // `ml_limit`, which leaves the closing literal run the format requires.
    let sn = n - MF_LIMIT;
    let ml_limit = n - LAST_LITERALS;

    let mut si = 0usize;
    let mut di = 0usize;
    let mut anchor = 0usize;
    let mut fma = 1usize << SKIP_STRENGTH;

    while si <= sn {
        let word = read_u32_le(src, si);
        let slot = block_hash(word);
        let candidate = table[slot] as usize;
        table[slot] = (si + 1) as u32;

        if candidate == 0 {
            si += fma >> SKIP_STRENGTH;
            fma += 1;
            continue;
        }
        let r = candidate - 1;
        if si - r > WIN_MASK || read_u32_le(src, r) != word {
            si += fma >> SKIP_STRENGTH;
            fma += 1;
            continue;
        }

        // Match found; extend it forward.
        fma = 1 << SKIP_STRENGTH;
        let offset = si - r;
        let mut m_end = si + MIN_MATCH;
        let mut rj = r + MIN_MATCH;
        while m_end < ml_limit && src[m_end] == src[rj] {
            m_end += 1;
            rj += 1;
        }

        di = put_sequence(
            dst,
            di,
            &src[anchor..si],
            offset,
            m_end - si - MIN_MATCH,
        )?;
        si = m_end;
        anchor = si;
    }

    if anchor == 0 {
        // Not a single match: incompressible.
        return Ok(0);
    }

    put_last_literals(dst, di, &src[anchor..])
}
