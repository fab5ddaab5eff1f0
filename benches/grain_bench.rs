//! Benchmarks for the grain resampling path.
//!
//! Run with: cargo bench
//!
//! The resampler runs on every block of the audio callback, so it must
//! complete well within the block's real-time deadline.
//!
//! Reference timing at 48kHz sample rate:
//!   - 1024 samples = 21.3ms deadline
//!   - 2048 samples = 42.7ms deadline
//!   - 4096 samples = 85.3ms deadline

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use karashift::dsp::grain::GrainResampler;

/// Grain sizes worth measuring; 4096 is the production size.
const GRAIN_SIZES: &[usize] = &[1024, 2048, 4096];

fn bench_grain(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/grain");

    for &size in GRAIN_SIZES {
        let resampler = GrainResampler::new(size);
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut output = vec![0.0f32; size];

        group.bench_with_input(BenchmarkId::new("unity", size), &size, |b, _| {
            b.iter(|| resampler.process(black_box(&input), black_box(1.0), black_box(&mut output)))
        });

        group.bench_with_input(BenchmarkId::new("octave_up", size), &size, |b, _| {
            b.iter(|| resampler.process(black_box(&input), black_box(2.0), black_box(&mut output)))
        });

        group.bench_with_input(BenchmarkId::new("octave_down", size), &size, |b, _| {
            b.iter(|| resampler.process(black_box(&input), black_box(0.5), black_box(&mut output)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grain);
criterion_main!(benches);
