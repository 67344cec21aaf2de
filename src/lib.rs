//! `lz4-stream` — a pure-Rust implementation of the LZ4 block and frame
//! codecs.
//!
//! The block codec turns one buffer into one buffer: [`compress_block`]
//! (fast match finder), [`compress_block_hc`] (deeper chained search, same
//! wire format), and [`uncompress_block`] (bounds-checked decoder that
//! rejects malformed input). The frame codec wraps blocks into the
//! self-describing LZ4 frame container: [`Writer`] compresses a byte stream
//! into frames — optionally on several compressor threads with strictly
//! ordered output — and [`Reader`] decodes standard, skippable, legacy, and
//! concatenated frames back into the original bytes.
//!
//! # Crate layout
//!
//! | Module    | Contents |
//! |-----------|----------|
//! | `block`   | Block wire format: fast encoder, bounded decoder. |
//! | `hc`      | High-compression encoder (chained match search). |
//! | `frame`   | Frame container: descriptor, data blocks, checksums, concurrent write pipeline. |
//! | `writer`  | Streaming frame compressor (`std::io::Write`). |
//! | `reader`  | Streaming frame decompressor (`std::io::Read`). |
//! | `options` | Configuration surface shared by both directions. |
//! | `pool`    | Reusable block buffers and hash-table slabs. |
//! | `state`   | Call-order state machine with sticky errors. |
//! | `xxhash`  | XXH32 wrapper used by every frame checksum. |
//! | `error`   | Stable error kinds. |
//!
//! # Example
//!
//! ```
//! use std::io::{Cursor, Read, Write};
//! use lz4_stream::{BlockSize, Opt, Reader, Writer};
//!
//! let mut compressed = Vec::new();
//! let mut zw = Writer::new(&mut compressed);
//! zw.apply([Opt::BlockSize(BlockSize::Max64Kb), Opt::BlockChecksum(true)])
//!     .unwrap();
//! zw.write_all(b"hello world ".repeat(100).as_slice()).unwrap();
//! zw.close().unwrap();
//! drop(zw);
//!
//! let mut zr = Reader::new(Cursor::new(compressed));
//! let mut out = Vec::new();
//! zr.read_to_end(&mut out).unwrap();
//! assert_eq!(out, b"hello world ".repeat(100));
//! ```

mod block;
mod error;
mod frame;
mod hc;
mod options;
mod pool;
mod reader;
mod state;
mod writer;

pub mod xxhash;

pub use block::{
    compress_block, compress_block_bound, compress_block_with_table, uncompress_block,
    MAX_INPUT_SIZE,
};
pub use error::Error;
pub use hc::compress_block_hc;
pub use options::{BlockDoneFn, BlockSize, CompressionLevel, Opt};
pub use reader::Reader;
pub use writer::Writer;
