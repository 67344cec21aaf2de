//! Configuration surface for the streaming reader and writer.
//!
//! A single [`Opt`] enum covers both directions; applying an option to an
//! object that does not support it fails with
//! [`Error::OptionNotApplicable`](crate::Error::OptionNotApplicable), and the
//! state machine restricts application to freshly created (or reset) objects.

use core::fmt;

use crate::error::Error;
use crate::pool;

/// Maximum uncompressed size of the data blocks inside a frame.
///
/// The discriminant is the size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum BlockSize {
    Max64Kb = 1 << 16,
    Max256Kb = 1 << 18,
    Max1Mb = 1 << 20,
    /// Default block size.
    #[default]
    Max4Mb = 1 << 22,
}

impl BlockSize {
    pub(crate) fn index(self) -> BlockSizeIndex {
        match self {
            BlockSize::Max64Kb => BlockSizeIndex(4),
            BlockSize::Max256Kb => BlockSizeIndex(5),
            BlockSize::Max1Mb => BlockSizeIndex(6),
            BlockSize::Max4Mb => BlockSizeIndex(7),
        }
    }
}

/// Descriptor form of [`BlockSize`]: the 3-bit index stored in the frame
/// header, valid values 4 through 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockSizeIndex(u8);

impl BlockSizeIndex {
    /// Validates a raw descriptor field.
    pub(crate) fn new(bits: u8) -> Result<Self, Error> {
        match bits {
            4..=7 => Ok(BlockSizeIndex(bits)),
            _ => Err(Error::InvalidBlockSize),
        }
    }

    pub(crate) fn bits(self) -> u8 {
        self.0
    }

    /// Block size in bytes: index 4 → 64 KiB, 5 → 256 KiB, 6 → 1 MiB,
    /// 7 → 4 MiB.
    pub(crate) fn size(self) -> usize {
        1 << (2 * self.0 as usize + 8)
    }

    /// Borrows a full-length block buffer from the pool for this size.
    pub(crate) fn get(self) -> Vec<u8> {
        pool::get_block(self.size())
    }

    /// Returns a block buffer to the pool for this size.
    pub(crate) fn put(self, buf: Vec<u8>) {
        pool::put_block(self.size(), buf);
    }
}

/// Effort the block encoder spends searching for matches. [`Fast`] selects
/// the single-probe hash-table encoder; the numbered levels select the
/// high-compression encoder with increasing chain-search depth.
///
/// [`Fast`]: CompressionLevel::Fast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    #[default]
    Fast,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
    Level6,
    Level7,
    Level8,
    Level9,
}

impl CompressionLevel {
    /// Chain-traversal budget of the high-compression search.
    pub(crate) fn depth(self) -> usize {
        match self {
            CompressionLevel::Fast => 0,
            CompressionLevel::Level1 => 1 << 1,
            CompressionLevel::Level2 => 1 << 2,
            CompressionLevel::Level3 => 1 << 3,
            CompressionLevel::Level4 => 1 << 4,
            CompressionLevel::Level5 => 1 << 5,
            CompressionLevel::Level6 => 1 << 6,
            CompressionLevel::Level7 => 1 << 7,
            CompressionLevel::Level8 => 1 << 8,
            CompressionLevel::Level9 => 1 << 9,
        }
    }
}

impl TryFrom<u32> for CompressionLevel {
    type Error = Error;

    /// Maps the numeric levels 0 (fast) through 9; anything else is
    /// [`Error::InvalidCompressionLevel`].
    fn try_from(level: u32) -> Result<Self, Error> {
        Ok(match level {
            0 => CompressionLevel::Fast,
            1 => CompressionLevel::Level1,
            2 => CompressionLevel::Level2,
            3 => CompressionLevel::Level3,
            4 => CompressionLevel::Level4,
            5 => CompressionLevel::Level5,
            6 => CompressionLevel::Level6,
            7 => CompressionLevel::Level7,
            8 => CompressionLevel::Level8,
            9 => CompressionLevel::Level9,
            _ => return Err(Error::InvalidCompressionLevel),
        })
    }
}

/// Callback receiving the uncompressed size of each completed block.
pub type BlockDoneFn = Box<dyn FnMut(usize) + Send>;

/// A single configuration item for [`Writer::apply`] or [`Reader::apply`].
///
/// All variants except [`Opt::OnBlockDone`] are writer-only.
///
/// [`Writer::apply`]: crate::Writer::apply
/// [`Reader::apply`]: crate::Reader::apply
pub enum Opt {
    /// Maximum uncompressed data-block size (default [`BlockSize::Max4Mb`]).
    BlockSize(BlockSize),
    /// Append an XXH32 checksum to every stored block (default `false`).
    BlockChecksum(bool),
    /// Append an XXH32 checksum of the whole uncompressed content after the
    /// end mark (default `true`).
    ContentChecksum(bool),
    /// Record the uncompressed content size in the frame header. A non-zero
    /// value sets the descriptor size flag; zero clears it (default `0`).
    Size(u64),
    /// Number of concurrent block compressors: `0` or `1` for sequential
    /// operation, a negative value for all available parallelism
    /// (default `1`).
    Concurrency(i32),
    /// Compression level (default [`CompressionLevel::Fast`]).
    CompressionLevel(CompressionLevel),
    /// Emit the legacy frame format (default `false`).
    LegacyFrame(bool),
    /// Block-completion callback; applicable to both directions.
    OnBlockDone(BlockDoneFn),
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opt::BlockSize(s) => write!(f, "BlockSize({s:?})"),
            Opt::BlockChecksum(b) => write!(f, "BlockChecksum({b})"),
            Opt::ContentChecksum(b) => write!(f, "ContentChecksum({b})"),
            Opt::Size(n) => write!(f, "Size({n})"),
            Opt::Concurrency(n) => write!(f, "Concurrency({n})"),
            Opt::CompressionLevel(l) => write!(f, "CompressionLevel({l:?})"),
            Opt::LegacyFrame(b) => write!(f, "LegacyFrame({b})"),
            Opt::OnBlockDone(_) => f.write_str("OnBlockDone(..)"),
        }
    }
}

/// Resolves a [`Opt::Concurrency`] value to a worker count: `0` and `1` are
/// sequential, negative values mean all available parallelism.
pub(crate) fn normalized_concurrency(n: i32) -> usize {
    match n {
        0 | 1 => 1,
        n if n < 0 => std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        n => n as usize,
    }
}
