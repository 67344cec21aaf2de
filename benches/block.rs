//! Criterion benchmarks for the one-shot block codec.
//!
//! Run with:
//!   cargo bench --bench block

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lz4_stream::{
    compress_block, compress_block_bound, compress_block_hc, uncompress_block, CompressionLevel,
};

/// Deterministic mixed corpus: text, runs, and noise.
fn corpus(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let mut x: u32 = 0x2545_F491;
    while out.len() < len {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        match x % 3 {
            0 => out.extend(std::iter::repeat((x >> 24) as u8).take(800)),
            1 => out.extend(b"a moderately compressible line of benchmark text. ".repeat(20)),
            _ => out.extend((0..600).map(|i| (x.rotate_left(i % 32) >> 24) as u8)),
        }
    }
    out.truncate(len);
    out
}

fn bench_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("block");

    for &size in &[65_536usize, 1 << 20] {
        let src = corpus(size);
        let bound = compress_block_bound(size);
        group.throughput(Throughput::Bytes(size as u64));

        {
            let mut dst = vec![0u8; bound];
            group.bench_with_input(BenchmarkId::new("compress_fast", size), &src, |b, src| {
                b.iter(|| compress_block(src, &mut dst).unwrap())
            });
        }

        for level in [CompressionLevel::Level1, CompressionLevel::Level9] {
            let mut dst = vec![0u8; bound];
            group.bench_with_input(
                BenchmarkId::new(format!("compress_hc_{level:?}"), size),
                &src,
                |b, src| b.iter(|| compress_block_hc(src, &mut dst, level).unwrap()),
            );
        }

        {
            let mut tmp = vec![0u8; bound];
            let n = compress_block(&src, &mut tmp).unwrap();
            let compressed = tmp[..n].to_vec();
            let mut dst = vec![0u8; size];
            group.bench_with_input(
                BenchmarkId::new("uncompress", size),
                &compressed,
                |b, compressed| b.iter(|| uncompress_block(compressed, &mut dst).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_block);
criterion_main!(benches);
