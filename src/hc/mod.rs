//! High-compression block encoder.
//!
//! Same wire format as [`crate::block`], better ratio at lower speed: a
//! chained hash table keeps every prior occurrence of a hash reachable, and
//! the search walks the chain from nearest to farthest candidate within the
//! compression level's depth budget.

mod compress;

pub use compress::compress_block_hc;

pub(crate) use compress::compress_hc_cleared;
