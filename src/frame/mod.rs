//! LZ4 frame codec: the self-describing container around the block codec.
//!
//! A frame is a magic word, a descriptor, a run of data blocks, a zero end
//! mark, and an optional content checksum. This module owns the prologue
//! and epilogue on both directions plus the per-frame bookkeeping; the
//! streaming state machines live in [`crate::writer`] and [`crate::reader`],
//! and the concurrent write path in [`pipeline`].

pub(crate) mod block;
pub(crate) mod header;
pub(crate) mod pipeline;
pub(crate) mod types;

use std::io::{self, Read, Write};

use crate::block::compress_block_bound;
use crate::error::Error;
use crate::frame::header::FrameDescriptor;
use crate::frame::types::{
    FRAME_MAGIC, FRAME_MAGIC_LEGACY, FRAME_SKIP_MAGIC, LEGACY_BLOCK_SIZE,
};
use crate::xxhash::Xxh32State;

/// What the reader found in front of the cursor.
#[derive(Debug)]
pub(crate) enum Prologue {
    /// A frame header was consumed; blocks follow.
    Frame,
    /// Clean end of the stream.
    Eof,
}

/// One frame in flight: its identity, configuration, and the running
/// content checksum.
pub(crate) struct Frame {
    pub(crate) magic: u32,
    pub(crate) descriptor: FrameDescriptor,
    pub(crate) checksum: Xxh32State,
    /// Maximum uncompressed block size negotiated for this frame.
    pub(crate) block_size: usize,
}

impl Frame {
    pub(crate) fn new() -> Frame {
        Frame {
            magic: 0,
            descriptor: FrameDescriptor::default(),
            checksum: Xxh32State::new(0),
            block_size: 0,
        }
    }

    pub(crate) fn is_legacy(&self) -> bool {
        self.magic == FRAME_MAGIC_LEGACY
    }

    pub(crate) fn block_checksum(&self) -> bool {
        !self.is_legacy() && self.descriptor.flags.block_checksum()
    }

    pub(crate) fn content_checksum(&self) -> bool {
        !self.is_legacy() && self.descriptor.flags.content_checksum()
    }

    /// Largest stored payload a conforming block of this frame may declare.
    /// Legacy payloads are compressed and may slightly exceed the block
    /// size, up to the encoder's bound.
    pub(crate) fn max_payload(&self) -> usize {
        if self.is_legacy() {
            compress_block_bound(LEGACY_BLOCK_SIZE)
        } else {
            self.block_size
        }
    }

    /// Arms the frame for writing. The descriptor configuration set through
    /// options is preserved across frames.
    pub(crate) fn init_w(&mut self, legacy: bool) -> Result<(), Error> {
        self.magic = if legacy { FRAME_MAGIC_LEGACY } else { FRAME_MAGIC };
        self.descriptor.init_w();
        self.checksum.reset(0);
        self.block_size = if legacy {
            LEGACY_BLOCK_SIZE
        } else {
            self.descriptor.flags.block_size_index()?.size()
        };
        Ok(())
    }

    /// Emits the frame prologue: magic plus descriptor for standard frames,
    /// bare magic for legacy ones.
    pub(crate) fn write_prologue(&self, dst: &mut impl Write) -> Result<(), Error> {
        self.descriptor.write(self.magic, dst)
    }

    /// Emits the end mark and, when enabled, the content checksum. Legacy
    /// frames end implicitly and get neither.
    pub(crate) fn close_w(&mut self, dst: &mut impl Write) -> Result<(), Error> {
        if self.is_legacy() {
            return Ok(());
        }
        let mut buf = [0u8; 8];
        let mut end = 4;
        if self.descriptor.flags.content_checksum() {
            buf[4..8].copy_from_slice(&self.checksum.digest().to_le_bytes());
            end = 8;
        }
        write_all(dst, &buf[..end])
    }

    /// Consumes the next frame prologue, skipping over skippable frames.
    pub(crate) fn init_r(&mut self, src: &mut impl Read) -> Result<Prologue, Error> {
        loop {
            let magic = match try_read_u32(src)? {
                Some(m) => m,
                None => return Ok(Prologue::Eof),
            };
            match magic {
                FRAME_MAGIC => {
                    self.magic = magic;
                    self.descriptor.read(src)?;
                    self.block_size = self.descriptor.flags.block_size_index()?.size();
                    self.checksum.reset(0);
                    return Ok(Prologue::Frame);
                }
                FRAME_MAGIC_LEGACY => {
                    self.magic = magic;
                    self.block_size = LEGACY_BLOCK_SIZE;
                    self.checksum.reset(0);
                    return Ok(Prologue::Frame);
                }
                m if m >> 8 == FRAME_SKIP_MAGIC >> 8 => {
                    // Skippable frame: a length word, then that many bytes
                    // of payload to discard.
                    let skip = read_u32(src)?;
                    let copied = io::copy(&mut src.by_ref().take(u64::from(skip)), &mut io::sink())
                        .map_err(|_| Error::IoRead)?;
                    if copied != u64::from(skip) {
                        return Err(Error::IoRead);
                    }
                }
                _ => return Err(Error::InvalidFrame),
            }
        }
    }

    /// Verifies the frame trailer after the end mark.
    pub(crate) fn close_r(&mut self, src: &mut impl Read) -> Result<(), Error> {
        if !self.content_checksum() {
            return Ok(());
        }
        let mut buf = [0u8; 4];
        read_exact(src, &mut buf)?;
        if self.checksum.digest() != u32::from_le_bytes(buf) {
            return Err(Error::InvalidFrameChecksum);
        }
        Ok(())
    }

    /// Forgets the current frame so the next [`init_r`](Self::init_r) or
    /// [`init_w`](Self::init_w) starts fresh. Descriptor configuration is
    /// kept.
    pub(crate) fn forget(&mut self) {
        self.magic = 0;
        self.block_size = 0;
    }
}

// ── Bounded I/O helpers ──────────────────────────────────────────────────────

/// Reads a little-endian u32, returning `None` on a clean EOF before the
/// first byte. EOF inside the word is an error.
pub(crate) fn try_read_u32(src: &mut impl Read) -> Result<Option<u32>, Error> {
    let mut buf = [0u8; 4];
    let mut at = 0;
    while at < 4 {
        match src.read(&mut buf[at..]) {
            Ok(0) => {
                return if at == 0 {
                    Ok(None)
                } else {
                    Err(Error::IoRead)
                }
            }
            Ok(n) => at += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return Err(Error::IoRead),
        }
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

/// Reads a little-endian u32 that must be present.
pub(crate) fn read_u32(src: &mut impl Read) -> Result<u32, Error> {
    try_read_u32(src)?.ok_or(Error::IoRead)
}

pub(crate) fn read_exact(src: &mut impl Read, buf: &mut [u8]) -> Result<(), Error> {
    src.read_exact(buf).map_err(|_| Error::IoRead)
}

pub(crate) fn write_all(dst: &mut impl Write, buf: &[u8]) -> Result<(), Error> {
    dst.write_all(buf).map_err(|_| Error::IoWrite)
}
