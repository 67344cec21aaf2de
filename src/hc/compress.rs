//! Chained-hash match search and the high-compression encode loop.
//!
//! Two tables drive the search: `head` maps a hash to the most recent
//! position whose 4-byte word produced it, and `chain` maps each position
//! (modulo the window) to the previous position with the same hash. Both
//! store `position + 1` so 0 means "unset". Walking a chain therefore
//! visits candidates from nearest to farthest; the walk stops at the depth
//! budget, at the window edge, or when a recycled chain slot no longer
//! descends.
//!
//! On top of the chain search sits one step of lazy evaluation: a match at
//! `i` is held back when the position `i + 1` starts a strictly longer one,
//! in which case the byte at `i` joins the pending literal run.

use crate::block::encode::{put_last_literals, put_sequence};
use crate::block::types::{
    block_hash, read_u32_le, LAST_LITERALS, MF_LIMIT, MIN_MATCH, WIN_MASK,
};
use crate::block::MAX_INPUT_SIZE;
use crate::error::Error;
use crate::options::CompressionLevel;
use crate::pool;

/// Compresses `src` into `dst` with the high-compression search.
///
/// Output decodes with [`uncompress_block`](crate::uncompress_block) exactly
/// like the fast encoder's. Returns 0 for inputs that are too small or carry
/// no match, [`Error::InvalidSourceShortBuffer`] when `dst` cannot hold the
/// result, and [`Error::InvalidCompressionLevel`] when `level` is
/// [`CompressionLevel::Fast`].
pub fn compress_block_hc(
    src: &[u8],
    dst: &mut [u8],
    level: CompressionLevel,
) -> Result<usize, Error> {
    if level == CompressionLevel::Fast {
        return Err(Error::InvalidCompressionLevel);
    }
    let mut head = pool::get_hash_table();
    let mut chain = pool::get_hash_table();
    let written = compress_hc_cleared(src, dst, &mut head, &mut chain, level.depth());
    pool::put_hash_table(chain);
    pool::put_hash_table(head);
    written
}

/// Core high-compression encoder; both tables must be zeroed and hold
/// [`HT_SIZE`](crate::block::types::HT_SIZE) slots.
pub(crate) fn compress_hc_cleared(
    src: &[u8],
    dst: &mut [u8],
    head: &mut [u32],
    chain: &mut [u32],
    depth: usize,
) -> Result<usize, Error> {
    let n = src.len();
    if n == 0 {
        return Ok(0);
    }
    if n > MAX_INPUT_SIZE {
        return Err(Error::InvalidSourceShortBuffer);
    }
    if n <= MF_LIMIT {
        return Ok(0);
    }

    let sn = n - MF_LIMIT;
    let ml_limit = n - LAST_LITERALS;

    let mut si = 0usize;
    let mut di = 0usize;
    let mut anchor = 0usize;

    while si <= sn {
        let found = find_best(src, head, chain, si, ml_limit, depth, MIN_MATCH);
        insert(src, head, chain, si);

        let (m_len, offset) = match found {
            Some(m) => m,
            None => {
                si += 1;
                continue;
            }
        };

        // Lazy step: prefer a strictly longer match starting one byte later.
        if si + 1 <= sn
            && find_best(src, head, chain, si + 1, ml_limit, depth, m_len + 1).is_some()
        {
            si += 1;
            continue;
        }

        let m_end = si + m_len;
        di = put_sequence(dst, di, &src[anchor..si], offset, m_len - MIN_MATCH)?;

        // Index the positions the match covers so later searches can reach
        // into it.
        let index_end = m_end.min(sn + 1);
        for p in si + 1..index_end {
            insert(src, head, chain, p);
        }

        si = m_end;
        anchor = si;
    }

    if anchor == 0 {
        return Ok(0);
    }
    put_last_literals(dst, di, &src[anchor..])
}

#[inline]
fn insert(src: &[u8], head: &mut [u32], chain: &mut [u32], pos: usize) {
    let slot = block_hash(read_u32_le(src, pos));
    chain[pos & WIN_MASK] = head[slot];
    head[slot] = (pos + 1) as u32;
}

/// Walks the candidate chain for `si`, keeping the longest match of at
/// least `min_len` bytes. Returns `(length, offset)`.
fn find_best(
    src: &[u8],
    head: &[u32],
    chain: &[u32],
    si: usize,
    ml_limit: usize,
    depth: usize,
    min_len: usize,
) -> Option<(usize, usize)> {
    let word = read_u32_le(src, si);
    let mut cand = head[block_hash(word)] as usize;
    let mut best_len = min_len - 1;
    let mut best_off = 0usize;
    let mut tries = depth;

    while cand > 0 && tries > 0 {
        let c = cand - 1;
        if si - c > WIN_MASK {
            // Out of window; the chain only gets older from here.
            break;
        }
        // A candidate can only improve the result if it also matches at the
        // byte just past the current best length.
        if src[c + best_len] == src[si + best_len] {
            let len = match_length(src, c, si, ml_limit);
            if len > best_len {
                best_len = len;
                best_off = si - c;
            }
        }
        tries -= 1;
        let next = chain[c & WIN_MASK] as usize;
        if next == 0 || next - 1 >= c {
            // Recycled slot: the stored link no longer descends.
            break;
        }
        cand = next;
    }

    if best_off == 0 {
        None
    } else {
        Some((best_len, best_off))
    }
}

#[inline]
fn match_length(src: &[u8], c: usize, si: usize, ml_limit: usize) -> usize {
    let mut len = 0;
    while si + len < ml_limit && src[c + len] == src[si + len] {
        len += 1;
    }
    len
}
