//! Weight prepack throughput.
//!
//! Shapes follow common LLM projection matrices; throughput is reported in
//! packed bytes so tile and tail paths are directly comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use qnbit_kernels::{pack_quant_b_data, packed_buf_size, ComputeType};

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepack/pack_q4");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    let shapes: &[(usize, usize, usize)] = &[
        (4096, 4096, 32),  // hidden x hidden
        (4096, 11008, 32), // FFN projection
        (11008, 4096, 64),
    ];

    for &(n, k, block_len) in shapes {
        let size = packed_buf_size(n, k, 4, block_len).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        let src: Vec<u8> = (0..size).map(|i| (i as u8).wrapping_mul(31)).collect();
        let mut dst = vec![0u8; size];

        group.bench_with_input(
            BenchmarkId::new("q4", format!("{n}x{k}/blk{block_len}")),
            &(n, k, block_len),
            |bench, &(n, k, block_len)| {
                bench.iter(|| {
                    pack_quant_b_data(
                        black_box(n),
                        black_box(k),
                        4,
                        block_len,
                        ComputeType::Fp16,
                        black_box(&src),
                        black_box(&mut dst),
                        None,
                    )
                    .unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_pack_tail_heavy(c: &mut Criterion) {
    // n % 8 != 0 keeps a slice of every call on the per-column tail path.
    let mut group = c.benchmark_group("prepack/pack_q4_tail");
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(3));

    for &n in &[7usize, 33, 4101] {
        let k = 4096;
        let size = packed_buf_size(n, k, 4, 32).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        let src: Vec<u8> = (0..size).map(|i| (i as u8).wrapping_mul(31)).collect();
        let mut dst = vec![0u8; size];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, &n| {
            bench.iter(|| {
                pack_quant_b_data(
                    black_box(n),
                    black_box(k),
                    4,
                    32,
                    ComputeType::Fp16,
                    black_box(&src),
                    black_box(&mut dst),
                    None,
                )
                .unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pack, bench_pack_tail_heavy);
criterion_main!(benches);
