//! Error kinds shared by the block and frame codecs.
//!
//! Every failure mode of the library maps to exactly one variant, and the
//! message strings are stable: callers may match on the variant, log the
//! message, or convert to [`std::io::Error`] when driving the codec through
//! the standard `Read`/`Write` traits.

use core::fmt;
use std::io;

/// Errors returned by the block codec, the frame codec, and the streaming
/// reader/writer objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A compressed block is corrupted, or the destination buffer cannot
    /// hold the result. Covers both decode-side malformed input and the
    /// encode-side output-buffer-too-small condition.
    InvalidSourceShortBuffer,
    /// The stream does not start with a known frame magic number and is not
    /// a skippable frame.
    InvalidFrame,
    /// The frame descriptor requests dependent blocks, which this
    /// implementation does not support.
    BlockDependency,
    /// The one-byte descriptor checksum does not match the descriptor.
    InvalidHeaderChecksum,
    /// A per-block checksum does not match the stored block payload.
    InvalidBlockChecksum,
    /// The whole-frame content checksum does not match the decoded bytes.
    InvalidFrameChecksum,
    /// The descriptor block-size index is out of range, or a block declares
    /// a payload larger than the frame's negotiated maximum.
    InvalidBlockSize,
    /// The compression level is not in the accepted set.
    InvalidCompressionLevel,
    /// An option was applied to an object that is closed or in error.
    OptionClosedOrError,
    /// An option was applied to an object that does not support it.
    OptionNotApplicable,
    /// `reset` was called on a writer that has not been closed.
    WriterNotClosed,
    /// A read or write was issued on a closed streaming object.
    Closed,
    /// Reading from the underlying source failed or ended mid-field.
    IoRead,
    /// Writing to the underlying sink failed.
    IoWrite,
    /// Internal invariant violation.
    InternalUnhandledState,
}

impl Error {
    /// Stable message string for this error kind.
    pub fn message(self) -> &'static str {
        match self {
            Error::InvalidSourceShortBuffer => {
                "lz4: invalid source or destination buffer too short"
            }
            Error::InvalidFrame => "lz4: bad magic number",
            Error::BlockDependency => "lz4: block dependency not supported",
            Error::InvalidHeaderChecksum => "lz4: invalid header checksum",
            Error::InvalidBlockChecksum => "lz4: invalid block checksum",
            Error::InvalidFrameChecksum => "lz4: invalid frame checksum",
            Error::InvalidBlockSize => "lz4: invalid block size",
            Error::InvalidCompressionLevel => "lz4: invalid compression level",
            Error::OptionClosedOrError => "lz4: cannot apply options on closed or in error object",
            Error::OptionNotApplicable => "lz4: option not applicable",
            Error::WriterNotClosed => "lz4: writer not closed",
            Error::Closed => "lz4: closed object",
            Error::IoRead => "lz4: error reading from the source",
            Error::IoWrite => "lz4: error writing to the sink",
            Error::InternalUnhandledState => "lz4: unhandled state",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        let kind = match e {
            Error::InvalidSourceShortBuffer
            | Error::InvalidFrame
            | Error::BlockDependency
            | Error::InvalidHeaderChecksum
            | Error::InvalidBlockChecksum
            | Error::InvalidFrameChecksum
            | Error::InvalidBlockSize => io::ErrorKind::InvalidData,
            Error::InvalidCompressionLevel
            | Error::OptionClosedOrError
            | Error::OptionNotApplicable
            | Error::WriterNotClosed
            | Error::Closed => io::ErrorKind::InvalidInput,
            Error::IoRead => io::ErrorKind::UnexpectedEof,
            Error::IoWrite | Error::InternalUnhandledState => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}
