//! Streaming frame writer.
//!
//! Accumulates caller bytes into block-sized staging buffers, hands full
//! blocks to the block codec (inline, or through the ordered pipeline when
//! concurrency is enabled), and brackets the blocks with the frame prologue
//! and epilogue. The prologue is emitted lazily on the first write; `close`
//! flushes the partial block and finishes the frame.

use std::io::{self, Write};

use crate::error::Error;
use crate::frame::block::{BlockParams, FrameDataBlock};
use crate::frame::pipeline::Pipeline;
use crate::frame::types::LEGACY_BLOCK_SIZE;
use crate::frame::Frame;
use crate::options::{
    normalized_concurrency, BlockDoneFn, BlockSize, CompressionLevel, Opt,
};
use crate::pool;
use crate::state::{State, StateMachine, WRITER_TRANSITIONS};

/// Streaming LZ4 frame compressor over any [`io::Write`] sink.
///
/// ```
/// use std::io::Write;
///
/// let mut zw = lz4_stream::Writer::new(Vec::new());
/// zw.write_all(b"streamed through an lz4 frame").unwrap();
/// zw.close().unwrap();
/// ```
///
/// Options are applied with [`apply`](Writer::apply) before the first write.
/// Dropping an unclosed writer finishes the frame on a best-effort basis;
/// call [`close`](Writer::close) to observe errors.
pub struct Writer<W: Write> {
    state: StateMachine,
    dst: W,
    frame: Frame,
    level: CompressionLevel,
    num: usize,
    legacy: bool,
    params: BlockParams,
    /// Staging buffer for not-yet-compressed caller bytes.
    data: Vec<u8>,
    /// Fill level of `data`.
    idx: usize,
    /// Sequential-mode hash table; empty when unused.
    table: Vec<u32>,
    pipeline: Option<Pipeline>,
    handler: Option<BlockDoneFn>,
}

impl<W: Write> Writer<W> {
    /// Creates a writer with the default options: 4 MiB blocks, content
    /// checksum on, block checksums off, sequential, fast level.
    pub fn new(dst: W) -> Writer<W> {
        let mut frame = Frame::new();
        frame
            .descriptor
            .flags
            .set_block_size_index(BlockSize::Max4Mb.index());
        frame.descriptor.flags.set_content_checksum(true);
        Writer {
            state: StateMachine::new(&WRITER_TRANSITIONS),
            dst,
            frame,
            level: CompressionLevel::Fast,
            num: 1,
            legacy: false,
            params: BlockParams {
                level: CompressionLevel::Fast,
                block_checksum: false,
                legacy: false,
                index: BlockSize::Max4Mb.index(),
            },
            data: Vec::new(),
            idx: 0,
            table: Vec::new(),
            pipeline: None,
            handler: None,
        }
    }

    /// Applies options. Valid only on a freshly created (or reset) writer;
    /// an errored writer reports its stored error instead.
    pub fn apply(&mut self, options: impl IntoIterator<Item = Opt>) -> Result<(), Error> {
        match self.state.state() {
            State::New => {}
            State::Error => return Err(self.state.stored()),
            _ => return Err(Error::OptionClosedOrError),
        }
        for opt in options {
            match opt {
                Opt::BlockSize(bs) => {
                    self.frame.descriptor.flags.set_block_size_index(bs.index())
                }
                Opt::BlockChecksum(on) => self.frame.descriptor.flags.set_block_checksum(on),
                Opt::ContentChecksum(on) => {
                    self.frame.descriptor.flags.set_content_checksum(on)
                }
                Opt::Size(size) => {
                    self.frame.descriptor.flags.set_size(size > 0);
                    self.frame.descriptor.content_size = size;
                }
                Opt::Concurrency(n) => self.num = normalized_concurrency(n),
                Opt::CompressionLevel(level) => self.level = level,
                Opt::LegacyFrame(on) => self.legacy = on,
                Opt::OnBlockDone(handler) => self.handler = Some(handler),
            }
        }
        Ok(())
    }

    /// Finishes the frame: flushes any partial block, waits for in-flight
    /// blocks, writes the end mark and the content checksum when enabled.
    /// The underlying sink is not closed. Closing a writer that never
    /// received a byte still emits a complete (empty) frame; closing twice
    /// is a no-op.
    pub fn close(&mut self) -> Result<(), Error> {
        match self.state.state() {
            State::Active => {}
            State::New => {
                if let Err(e) = self.start() {
                    return Err(self.state.fault(e));
                }
            }
            State::Closed => return Ok(()),
            State::Error => return Err(self.state.stored()),
            State::Header | State::Fresh => {
                return Err(self.state.fault(Error::InternalUnhandledState))
            }
        }
        match self.finish() {
            Ok(()) => {
                self.state.advance(); // active → closed
                Ok(())
            }
            Err(e) => Err(self.state.fault(e)),
        }
    }

    /// Re-arms a closed (or errored, or unused) writer over a new sink,
    /// keeping the applied options. Fails with [`Error::WriterNotClosed`]
    /// when the writer is mid-frame.
    pub fn reset(&mut self, dst: W) -> Result<(), Error> {
        match self.state.state() {
            State::Header | State::Active => Err(Error::WriterNotClosed),
            _ => {
                self.dst = dst;
                self.state.reset();
                self.frame.forget();
                self.idx = 0;
                Ok(())
            }
        }
    }

    /// Shared reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.dst
    }

    /// Mutable reference to the underlying sink. Writing to it directly
    /// will corrupt the frame.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.dst
    }

    /// First-write transition: arms the frame, emits the prologue, and sets
    /// up buffers and the pipeline.
    fn start(&mut self) -> Result<(), Error> {
        self.state.advance(); // new → header
        self.frame.init_w(self.legacy)?;
        self.frame.write_prologue(&mut self.dst)?;
        self.params = BlockParams {
            level: self.level,
            block_checksum: self.frame.block_checksum(),
            legacy: self.legacy,
            index: self.frame.descriptor.flags.block_size_index()?,
        };
        self.data = self.staging();
        self.idx = 0;
        if self.num > 1 {
            self.pipeline = Some(Pipeline::new(self.num, self.params));
        } else if self.level == CompressionLevel::Fast {
            self.table = pool::get_hash_table();
        }
        self.state.advance(); // header → active
        Ok(())
    }

    fn staging(&self) -> Vec<u8> {
        if self.legacy {
            // Legacy blocks are 8 MiB and not pooled.
            vec![0u8; LEGACY_BLOCK_SIZE]
        } else {
            self.params.index.get()
        }
    }

    /// Compresses and emits the staged bytes as one block. `last` skips the
    /// staging-buffer replacement on the final flush.
    fn dispatch(&mut self, last: bool) -> Result<(), Error> {
        let size = self.idx;
        self.idx = 0;
        if size == 0 {
            return Ok(());
        }
        let mut src = if last {
            std::mem::take(&mut self.data)
        } else {
            let fresh = self.staging();
            std::mem::replace(&mut self.data, fresh)
        };
        src.truncate(size);

        // The content checksum covers the uncompressed bytes in input
        // order, accumulated here before any worker sees the block.
        if self.frame.content_checksum() {
            self.frame.checksum.update(&src);
        }
        if let Some(handler) = &mut self.handler {
            handler(size);
        }

        match &mut self.pipeline {
            Some(pipeline) => pipeline.dispatch(src, &mut self.dst),
            None => {
                let table = if self.table.is_empty() {
                    None
                } else {
                    Some(&mut self.table[..])
                };
                let block = FrameDataBlock::compress(src, &self.params, table);
                let written = block.write(&mut self.dst);
                self.params.recycle(block.data);
                written
            }
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.dispatch(true)?;
        let mut result = Ok(());
        if let Some(mut pipeline) = self.pipeline.take() {
            result = pipeline.finish(&mut self.dst);
        }
        // Hand the per-writer resources back to their pools.
        let staging = std::mem::take(&mut self.data);
        if !staging.is_empty() && !self.legacy {
            self.params.index.put(staging);
        }
        let table = std::mem::take(&mut self.table);
        if !table.is_empty() {
            pool::put_hash_table(table);
        }
        result?;
        self.frame.close_w(&mut self.dst)
    }

    fn write_bytes(&mut self, mut buf: &[u8]) -> Result<usize, Error> {
        match self.state.state() {
            State::Active => {}
            State::New => {
                if let Err(e) = self.start() {
                    return Err(self.state.fault(e));
                }
            }
            State::Closed => return Err(Error::Closed),
            State::Error => return Err(self.state.stored()),
            State::Header | State::Fresh => {
                return Err(self.state.fault(Error::InternalUnhandledState))
            }
        }

        let mut n = 0;
        while !buf.is_empty() {
            let space = self.data.len() - self.idx;
            let m = space.min(buf.len());
            self.data[self.idx..self.idx + m].copy_from_slice(&buf[..m]);
            self.idx += m;
            n += m;
            buf = &buf[m..];
            if self.idx == self.data.len() {
                if let Err(e) = self.dispatch(false) {
                    return Err(self.state.fault(e));
                }
            }
        }
        Ok(n)
    }
}

impl<W: Write> Write for Writer<W> {
    /// Consumes all of `buf`, emitting data blocks as the staging buffer
    /// fills. The frame prologue is written on the first call.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf).map_err(io::Error::from)
    }

    /// Flushes the underlying sink. Buffered input shorter than a block is
    /// emitted by [`close`](Writer::close), not by `flush`.
    fn flush(&mut self) -> io::Result<()> {
        self.dst.flush()
    }
}

impl<W: Write> Drop for Writer<W> {
    /// Finishes the frame if the writer is still live; errors are
    /// discarded. Call [`close`](Writer::close) first to observe them.
    fn drop(&mut self) {
        if matches!(self.state.state(), State::Active | State::Header) {
            let _ = self.close();
        }
    }
}
