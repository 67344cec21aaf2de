//! Frame data blocks: the `{size word, payload, optional checksum}` unit a
//! frame is made of, with the compress/store decision on the write side and
//! the read/verify/decode steps on the read side.

use std::io::{Read, Write};

use crate::block::encode::put_last_literals;
use crate::block::{compress_block_bound, compress_cleared, uncompress_block};
use crate::error::Error;
use crate::frame::types::{DataBlockSize, FRAME_MAGIC_LEGACY, LEGACY_BLOCK_SIZE};
use crate::frame::{read_exact, try_read_u32, write_all};
use crate::hc::compress_hc_cleared;
use crate::options::{BlockSizeIndex, CompressionLevel};
use crate::pool;
use crate::xxhash::{xxh32_oneshot, Xxh32State};

/// Per-frame parameters a block compression needs; small and `Copy` so the
/// concurrent pipeline can hand one to every worker.
#[derive(Clone, Copy)]
pub(crate) struct BlockParams {
    pub(crate) level: CompressionLevel,
    pub(crate) block_checksum: bool,
    pub(crate) legacy: bool,
    pub(crate) index: BlockSizeIndex,
}

impl BlockParams {
    /// Returns a stored-payload buffer to its pool. Legacy payloads are not
    /// pooled and simply drop.
    pub(crate) fn recycle(&self, data: Vec<u8>) {
        if !self.legacy {
            self.index.put(data);
        }
    }
}

#[derive(Default)]
pub(crate) struct FrameDataBlock {
    pub(crate) size: DataBlockSize,
    /// Stored payload (write side) or payload buffer (read side).
    pub(crate) data: Vec<u8>,
    /// Valid prefix of `data` on the read side.
    pub(crate) payload_len: usize,
    pub(crate) checksum: Option<u32>,
    /// Legacy streams end at the first block that decodes short.
    pub(crate) done: bool,
}

impl FrameDataBlock {
    /// Builds the stored form of one uncompressed block, consuming the
    /// staging buffer. Incompressible input is kept raw (standard frames)
    /// or re-encoded as a literal-only block (legacy frames have no raw
    /// flag). When `table` is given the fast encoder uses it instead of a
    /// pooled one.
    pub(crate) fn compress(
        src: Vec<u8>,
        params: &BlockParams,
        table: Option<&mut [u32]>,
    ) -> FrameDataBlock {
        let mut block = FrameDataBlock::default();

        if params.legacy {
            let mut zdata = vec![0u8; compress_block_bound(src.len())];
            let mut n = compress_into(&src, &mut zdata, params.level, table).unwrap_or(0);
            if n == 0 {
                // No match found: a literal-only block always fits a
                // bound-sized destination.
                n = put_last_literals(&mut zdata, 0, &src)
                    .expect("bound-sized destination holds a literal run");
            }
            zdata.truncate(n);
            block.size.set_size(n);
            block.payload_len = n;
            block.data = zdata;
            return block;
        }

        // Cap the destination at the source length so that any outcome not
        // smaller than the input surfaces as incompressible.
        let mut zdata = params.index.get();
        let cap = src.len();
        let n = compress_into(&src, &mut zdata[..cap], params.level, table).unwrap_or(0);
        if n == 0 {
            block.size.set_uncompressed(true);
            block.size.set_size(src.len());
            block.payload_len = src.len();
            params.index.put(zdata);
            block.data = src;
        } else {
            block.size.set_size(n);
            block.payload_len = n;
            zdata.truncate(n);
            block.data = zdata;
            params.index.put(src);
        }

        if params.block_checksum {
            // Checksum scope is the payload as stored on the wire.
            block.checksum = Some(xxh32_oneshot(&block.data, 0));
        }
        block
    }

    /// Emits the size word, the payload, and the checksum if present.
    pub(crate) fn write(&self, dst: &mut impl Write) -> Result<(), Error> {
        write_all(dst, &self.size.to_wire().to_le_bytes())?;
        write_all(dst, &self.data)?;
        if let Some(checksum) = self.checksum {
            write_all(dst, &checksum.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads the next block into `self.data` and verifies its checksum.
    /// Returns `Ok(false)` at the end of the frame: the zero end mark, or
    /// for legacy streams a clean EOF (or an earlier short block).
    pub(crate) fn read(
        &mut self,
        src: &mut impl Read,
        legacy: bool,
        block_checksum: bool,
        max_payload: usize,
    ) -> Result<bool, Error> {
        if self.done {
            return Ok(false);
        }
        let word = loop {
            match try_read_u32(src)? {
                None if legacy => return Ok(false),
                None => return Err(Error::IoRead),
                // A legacy magic in block position starts a concatenated
                // legacy frame; its blocks continue the stream.
                Some(x) if legacy && x == FRAME_MAGIC_LEGACY => continue,
                Some(x) => break x,
            }
        };
        if !legacy && word == 0 {
            return Ok(false);
        }

        self.size = DataBlockSize::from_wire(word);
        let len = if legacy {
            word as usize
        } else {
            self.size.size()
        };
        if len > max_payload {
            return Err(Error::InvalidBlockSize);
        }
        read_exact(src, &mut self.data[..len])?;
        self.payload_len = len;

        self.checksum = None;
        if !legacy && block_checksum {
            let mut buf = [0u8; 4];
            read_exact(src, &mut buf)?;
            let stored = u32::from_le_bytes(buf);
            if xxh32_oneshot(&self.data[..len], 0) != stored {
                return Err(Error::InvalidBlockChecksum);
            }
            self.checksum = Some(stored);
        }
        Ok(true)
    }

    /// Decodes the current payload into `dst`, feeding the decoded bytes to
    /// the content-checksum accumulator when one is given.
    pub(crate) fn uncompress(
        &mut self,
        dst: &mut [u8],
        legacy: bool,
        checksum: Option<&mut Xxh32State>,
    ) -> Result<usize, Error> {
        let payload = &self.data[..self.payload_len];
        let n = if !legacy && self.size.uncompressed() {
            if payload.len() > dst.len() {
                return Err(Error::InvalidSourceShortBuffer);
            }
            dst[..payload.len()].copy_from_slice(payload);
            payload.len()
        } else {
            uncompress_block(payload, dst)?
        };
        if legacy && n < LEGACY_BLOCK_SIZE {
            self.done = true;
        }
        if let Some(acc) = checksum {
            acc.update(&dst[..n]);
        }
        Ok(n)
    }
}

/// Level dispatch for the block encoders. A caller-provided table serves
/// the fast encoder; the high-compression tables always come from the pool.
fn compress_into(
    src: &[u8],
    dst: &mut [u8],
    level: CompressionLevel,
    table: Option<&mut [u32]>,
) -> Result<usize, Error> {
    match level {
        CompressionLevel::Fast => match table {
            Some(table) => {
                table.fill(0);
                compress_cleared(src, dst, table)
            }
            None => {
                let mut table = pool::get_hash_table();
                let written = compress_cleared(src, dst, &mut table);
                pool::put_hash_table(table);
                written
            }
        },
        level => {
            let mut head = pool::get_hash_table();
            let mut chain = pool::get_hash_table();
            let written = compress_hc_cleared(src, dst, &mut head, &mut chain, level.depth());
            pool::put_hash_table(chain);
            pool::put_hash_table(head);
            written
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BlockSize;
    use std::io::Cursor;

    fn params(block_checksum: bool) -> BlockParams {
        BlockParams {
            level: CompressionLevel::Fast,
            block_checksum,
            legacy: false,
            index: BlockSize::Max64Kb.index(),
        }
    }

    fn staged(data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    #[test]
    fn compressible_block_is_stored_compressed() {
        let src = b"blockblockblockblockblockblock".repeat(8);
        let block = FrameDataBlock::compress(staged(&src), &params(false), None);
        assert!(!block.size.uncompressed());
        assert!(block.data.len() < src.len());
        assert_eq!(block.size.size(), block.data.len());
    }

    #[test]
    fn incompressible_block_is_stored_raw() {
        let src: Vec<u8> = (0u16..512).flat_map(|i| (256 + i).to_be_bytes()).collect();
        let block = FrameDataBlock::compress(staged(&src), &params(false), None);
        assert!(block.size.uncompressed());
        assert_eq!(block.data, src);
        assert_eq!(block.size.size(), src.len());
    }

    #[test]
    fn checksum_covers_the_stored_payload() {
        let src = b"checksum scope is the wire payload ".repeat(20);
        let block = FrameDataBlock::compress(staged(&src), &params(true), None);
        assert!(!block.size.uncompressed());
        assert_eq!(block.checksum, Some(xxh32_oneshot(&block.data, 0)));
        // Raw block: the stored payload is the input itself.
        let raw: Vec<u8> = (0u16..512).flat_map(|i| (256 + i).to_be_bytes()).collect();
        let block = FrameDataBlock::compress(staged(&raw), &params(true), None);
        assert!(block.size.uncompressed());
        assert_eq!(block.checksum, Some(xxh32_oneshot(&raw, 0)));
    }

    #[test]
    fn write_read_uncompress_roundtrip() {
        let src = b"roundtrip through the wire form ".repeat(30);
        let block = FrameDataBlock::compress(staged(&src), &params(true), None);
        let mut wire = Vec::new();
        block.write(&mut wire).unwrap();

        let mut incoming = FrameDataBlock {
            data: vec![0u8; 64 * 1024],
            ..FrameDataBlock::default()
        };
        let mut cur = Cursor::new(&wire);
        assert!(incoming.read(&mut cur, false, true, 64 * 1024).unwrap());
        let mut out = vec![0u8; 64 * 1024];
        let n = incoming.uncompress(&mut out, false, None).unwrap();
        assert_eq!(&out[..n], &src[..]);
    }

    #[test]
    fn corrupted_block_checksum_is_rejected() {
        let src = b"corrupt me ".repeat(30);
        let block = FrameDataBlock::compress(staged(&src), &params(true), None);
        let mut wire = Vec::new();
        block.write(&mut wire).unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0x01;

        let mut incoming = FrameDataBlock {
            data: vec![0u8; 64 * 1024],
            ..FrameDataBlock::default()
        };
        assert_eq!(
            incoming
                .read(&mut Cursor::new(&wire), false, true, 64 * 1024)
                .unwrap_err(),
            Error::InvalidBlockChecksum
        );
    }

    #[test]
    fn oversized_size_word_is_rejected() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&(70_000u32).to_le_bytes());
        wire.resize(wire.len() + 70_000, 0);
        let mut incoming = FrameDataBlock {
            data: vec![0u8; 64 * 1024],
            ..FrameDataBlock::default()
        };
        assert_eq!(
            incoming
                .read(&mut Cursor::new(&wire), false, false, 64 * 1024)
                .unwrap_err(),
            Error::InvalidBlockSize
        );
    }

    #[test]
    fn end_mark_stops_the_block_loop() {
        let wire = 0u32.to_le_bytes();
        let mut incoming = FrameDataBlock {
            data: vec![0u8; 64],
            ..FrameDataBlock::default()
        };
        assert!(!incoming
            .read(&mut Cursor::new(&wire), false, false, 64)
            .unwrap());
    }

    #[test]
    fn legacy_incompressible_payload_still_decodes() {
        let src: Vec<u8> = (0u16..512).flat_map(|i| (256 + i).to_be_bytes()).collect();
        let legacy = BlockParams {
            legacy: true,
            ..params(false)
        };
        let block = FrameDataBlock::compress(staged(&src), &legacy, None);
        // Literal-only fallback: slightly larger than the input, never raw.
        assert!(!block.size.uncompressed());
        assert!(block.data.len() > src.len());
        let mut out = vec![0u8; src.len()];
        let mut reread = FrameDataBlock {
            data: block.data.clone(),
            payload_len: block.data.len(),
            ..FrameDataBlock::default()
        };
        let n = reread.uncompress(&mut out, true, None).unwrap();
        assert_eq!(&out[..n], &src[..]);
        assert!(reread.done, "short legacy block must end the frame");
    }

    #[test]
    fn content_checksum_accumulates_decoded_bytes() {
        let src = b"content checksum input ".repeat(10);
        let block = FrameDataBlock::compress(staged(&src), &params(false), None);
        let mut wire = Vec::new();
        block.write(&mut wire).unwrap();

        let mut incoming = FrameDataBlock {
            data: vec![0u8; 64 * 1024],
            ..FrameDataBlock::default()
        };
        incoming
            .read(&mut Cursor::new(&wire), false, false, 64 * 1024)
            .unwrap();
        let mut out = vec![0u8; 64 * 1024];
        let mut acc = Xxh32State::new(0);
        let n = incoming.uncompress(&mut out, false, Some(&mut acc)).unwrap();
        assert_eq!(n, src.len());
        assert_eq!(acc.digest(), xxh32_oneshot(&src, 0));
    }
}
