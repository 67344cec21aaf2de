//! Helpers shared by the integration suites: deterministic data generators
//! and error plumbing. No randomness dependency — reproducibility matters
//! more than entropy quality here.

// Each suite uses a different subset of these helpers.
#![allow(dead_code)]

use std::io;

/// Xorshift32; good enough to defeat the match finder deterministically.
pub struct XorShift32(pub u32);

impl XorShift32 {
    pub fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// `len` bytes of pseudo-random, effectively incompressible data.
pub fn pseudo_random(len: usize, seed: u32) -> Vec<u8> {
    let mut rng = XorShift32(seed | 1);
    (0..len).map(|_| (rng.next() >> 24) as u8).collect()
}

/// `len` bytes of repetitive, highly compressible text.
pub fn compressible_text(len: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// A mixed corpus: runs, text, and incompressible stretches.
pub fn mixed_corpus(len: usize, seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut rng = XorShift32(seed | 1);
    while out.len() < len {
        match rng.next() % 3 {
            0 => out.extend(std::iter::repeat((rng.next() >> 24) as u8).take(900)),
            1 => out.extend(compressible_text(1100)),
            _ => out.extend(pseudo_random(700, rng.next())),
        }
    }
    out.truncate(len);
    out
}

/// Extracts the crate error stored inside an `io::Error`.
pub fn codec_error(err: io::Error) -> lz4_stream::Error {
    *err.get_ref()
        .and_then(|inner| inner.downcast_ref::<lz4_stream::Error>())
        .expect("io::Error does not wrap a codec error")
}
