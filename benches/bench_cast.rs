//! fp16 <-> fp32 cast throughput at activation-tensor sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use qnbit_kernels::{cast_f16_to_f32, cast_f32_to_f16};

fn bench_widen(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast/f16_to_f32");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for &count in &[4096usize, 4096 * 32, 4096 * 512] {
        group.throughput(Throughput::Elements(count as u64));
        let src: Vec<u16> = (0..count).map(|i| (i % 0x7c00) as u16).collect();
        let mut dst = vec![0f32; count];

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, &count| {
            bench.iter(|| {
                cast_f16_to_f32(black_box(&src), black_box(&mut dst), count).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_narrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("cast/f32_to_f16");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for &count in &[4096usize, 4096 * 32, 4096 * 512] {
        group.throughput(Throughput::Elements(count as u64));
        let src: Vec<f32> = (0..count).map(|i| i as f32 * 0.125 - 1024.0).collect();
        let mut dst = vec![0u16; count];

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bench, &count| {
            bench.iter(|| {
                cast_f32_to_f16(black_box(&src), black_box(&mut dst), count).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_widen, bench_narrow);
criterion_main!(benches);
