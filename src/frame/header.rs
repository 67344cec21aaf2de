//! Frame descriptor: the 2-to-10-byte FLG/BD/content-size record plus its
//! one-byte checksum, and the magic word in front of it.

use std::io::{Read, Write};

use crate::error::Error;
use crate::frame::types::{DescriptorFlags, FRAME_MAGIC_LEGACY};
use crate::frame::{read_exact, write_all};
use crate::xxhash::xxh32_oneshot;

/// One-byte descriptor checksum: the second byte of the XXH32 of the
/// descriptor fields.
#[inline]
pub(crate) fn descriptor_checksum(descriptor: &[u8]) -> u8 {
    (xxh32_oneshot(descriptor, 0) >> 8) as u8
}

/// Parsed or to-be-emitted frame descriptor. The configuration (flags and
/// content size) survives a stream reset; only per-frame parse state does
/// not.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FrameDescriptor {
    pub(crate) flags: DescriptorFlags,
    pub(crate) content_size: u64,
}

impl FrameDescriptor {
    /// Stamps the fields every emitted descriptor carries.
    pub(crate) fn init_w(&mut self) {
        self.flags.set_version(1);
        self.flags.set_block_independence(true);
    }

    /// Emits `magic` plus, for standard frames, the descriptor and its
    /// checksum, as a single write.
    pub(crate) fn write(&self, magic: u32, dst: &mut impl Write) -> Result<(), Error> {
        let mut buf = [0u8; 15];
        buf[..4].copy_from_slice(&magic.to_le_bytes());
        if magic == FRAME_MAGIC_LEGACY {
            // Legacy frames are magic-only.
            return write_all(dst, &buf[..4]);
        }

        buf[4..6].copy_from_slice(&self.flags.to_wire().to_le_bytes());
        let mut end = 6;
        if self.flags.size() {
            buf[6..14].copy_from_slice(&self.content_size.to_le_bytes());
            end = 14;
        }
        buf[end] = descriptor_checksum(&buf[4..end]);
        write_all(dst, &buf[..end + 1])
    }

    /// Parses the descriptor that follows a standard frame magic and
    /// validates everything that can be validated up front.
    pub(crate) fn read(&mut self, src: &mut impl Read) -> Result<(), Error> {
        // Read flags plus one more byte, hoping there is no content size: the
        // third byte is then already the checksum.
        let mut buf = [0u8; 11];
        read_exact(src, &mut buf[..3])?;
        self.flags = DescriptorFlags::from_wire(u16::from_le_bytes([buf[0], buf[1]]));

        let fields = if self.flags.size() {
            read_exact(src, &mut buf[3..11])?;
            let mut size = [0u8; 8];
            size.copy_from_slice(&buf[2..10]);
            self.content_size = u64::from_le_bytes(size);
            10
        } else {
            self.content_size = 0;
            2
        };

        let checksum = buf[fields];
        if descriptor_checksum(&buf[..fields]) != checksum {
            return Err(Error::InvalidHeaderChecksum);
        }
        if self.flags.version() != 1 {
            return Err(Error::InvalidFrame);
        }
        if !self.flags.block_independence() {
            return Err(Error::BlockDependency);
        }
        self.flags.block_size_index()?;
        Ok(())
    }
}
