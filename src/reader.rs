//! Streaming frame reader.
//!
//! Parses the frame prologue on the first read (skipping skippable frames),
//! then serves decoded bytes block by block, verifying block checksums and
//! the frame trailer as it goes. Concatenated frames are read through
//! transparently: the reader only reports end-of-stream at a clean EOF on a
//! frame boundary.

use std::io::{self, Read};
use std::mem;

use crate::error::Error;
use crate::frame::block::FrameDataBlock;
use crate::frame::{Frame, Prologue};
use crate::options::{BlockDoneFn, Opt};
use crate::pool;
use crate::state::{State, StateMachine, READER_TRANSITIONS};

/// Streaming LZ4 frame decompressor over any [`io::Read`] source.
///
/// ```
/// use std::io::{Cursor, Read, Write};
///
/// let mut compressed = Vec::new();
/// let mut zw = lz4_stream::Writer::new(&mut compressed);
/// zw.write_all(b"frame me").unwrap();
/// zw.close().unwrap();
/// drop(zw);
///
/// let mut zr = lz4_stream::Reader::new(Cursor::new(compressed));
/// let mut out = Vec::new();
/// zr.read_to_end(&mut out).unwrap();
/// assert_eq!(&out[..], b"frame me");
/// ```
pub struct Reader<R: Read> {
    state: StateMachine,
    src: R,
    frame: Frame,
    /// Wire-side block (payload buffer, size word, checksum).
    block: FrameDataBlock,
    /// Decoded bytes not yet handed to the caller.
    data: Vec<u8>,
    dlen: usize,
    idx: usize,
    frame_open: bool,
    handler: Option<BlockDoneFn>,
}

impl<R: Read> Reader<R> {
    /// Creates a reader. The stream is not touched until the first read.
    pub fn new(src: R) -> Reader<R> {
        Reader {
            state: StateMachine::new(&READER_TRANSITIONS),
            src,
            frame: Frame::new(),
            block: FrameDataBlock::default(),
            data: Vec::new(),
            dlen: 0,
            idx: 0,
            frame_open: false,
            handler: None,
        }
    }

    /// Applies options. Only [`Opt::OnBlockDone`] applies to a reader; the
    /// writer-side options fail with [`Error::OptionNotApplicable`].
    pub fn apply(&mut self, options: impl IntoIterator<Item = Opt>) -> Result<(), Error> {
        match self.state.state() {
            State::New => {}
            State::Error => return Err(self.state.stored()),
            _ => return Err(Error::OptionClosedOrError),
        }
        for opt in options {
            match opt {
                Opt::OnBlockDone(handler) => self.handler = Some(handler),
                _ => return Err(Error::OptionNotApplicable),
            }
        }
        Ok(())
    }

    /// Uncompressed content size recorded in the current frame's header, or
    /// 0 when the stream did not declare one (or no header has been read
    /// yet).
    pub fn size(&self) -> u64 {
        match self.state.state() {
            State::Active | State::Closed if self.frame.descriptor.flags.size() => {
                self.frame.descriptor.content_size
            }
            _ => 0,
        }
    }

    /// Re-arms the reader over a new source, keeping the applied options.
    pub fn reset(&mut self, src: R) {
        self.src = src;
        self.recycle_buffers();
        self.frame.forget();
        self.frame_open = false;
        self.block = FrameDataBlock::default();
        self.dlen = 0;
        self.idx = 0;
        self.state.reset();
    }

    fn open_frame(&mut self) {
        self.block = FrameDataBlock {
            data: pool::get_block(self.frame.max_payload()),
            ..FrameDataBlock::default()
        };
        self.data = pool::get_block(self.frame.block_size);
        self.dlen = 0;
        self.idx = 0;
        self.frame_open = true;
    }

    fn recycle_buffers(&mut self) {
        if !self.block.data.is_empty() {
            pool::put_block(self.frame.max_payload(), mem::take(&mut self.block.data));
        }
        if !self.data.is_empty() {
            pool::put_block(self.frame.block_size, mem::take(&mut self.data));
        }
    }

    /// End of the current frame: verify the trailer and forget the frame so
    /// a concatenated one can follow.
    fn close_frame(&mut self) -> Result<(), Error> {
        let trailer = self.frame.close_r(&mut self.src);
        self.recycle_buffers();
        self.block = FrameDataBlock::default();
        self.frame.forget();
        self.frame_open = false;
        trailer
    }

    /// Shared reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.src
    }

    /// Mutable reference to the underlying source. Reading from it directly
    /// will corrupt the frame parse.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.src
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.state.state() {
            State::Active => {}
            State::New => self.state.advance(), // new → header
            State::Closed => return Ok(0),
            State::Error => return Err(self.state.stored()),
            State::Header | State::Fresh => {
                return Err(self.state.fault(Error::InternalUnhandledState))
            }
        }

        loop {
            // Leftover decoded bytes are served before anything else.
            if self.idx < self.dlen {
                let m = (self.dlen - self.idx).min(buf.len());
                buf[..m].copy_from_slice(&self.data[self.idx..self.idx + m]);
                self.idx += m;
                if self.idx == self.dlen {
                    self.idx = 0;
                    self.dlen = 0;
                }
                return Ok(m);
            }

            if !self.frame_open {
                match self.frame.init_r(&mut self.src) {
                    Ok(Prologue::Frame) => {
                        self.open_frame();
                        if self.state.state() == State::Header {
                            self.state.advance(); // header → active
                        }
                    }
                    Ok(Prologue::Eof) => {
                        if self.state.state() == State::Header {
                            self.state.advance();
                        }
                        self.state.advance(); // active → closed
                        return Ok(0);
                    }
                    Err(e) => return Err(self.state.fault(e)),
                }
            }

            // Next data block.
            let legacy = self.frame.is_legacy();
            let block_checksum = self.frame.block_checksum();
            let max_payload = self.frame.max_payload();
            let have = match self
                .block
                .read(&mut self.src, legacy, block_checksum, max_payload)
            {
                Ok(have) => have,
                Err(e) => return Err(self.state.fault(e)),
            };
            if !have {
                if let Err(e) = self.close_frame() {
                    return Err(self.state.fault(e));
                }
                continue; // another frame may follow
            }

            // Decode: straight into the caller's buffer when it can hold a
            // whole block, otherwise into the internal buffer.
            let content = self.frame.content_checksum();
            let direct = buf.len() >= self.frame.block_size;
            let target: &mut [u8] = if direct { &mut *buf } else { &mut self.data[..] };
            let acc = if content {
                Some(&mut self.frame.checksum)
            } else {
                None
            };
            let n = match self.block.uncompress(target, legacy, acc) {
                Ok(n) => n,
                Err(e) => return Err(self.state.fault(e)),
            };
            if let Some(handler) = &mut self.handler {
                handler(n);
            }
            if direct {
                if n > 0 {
                    return Ok(n);
                }
            } else {
                self.dlen = n;
                self.idx = 0;
            }
        }
    }
}

impl<R: Read> Read for Reader<R> {
    /// Returns decoded bytes, 0 only at the end of the stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(io::Error::from)
    }
}
