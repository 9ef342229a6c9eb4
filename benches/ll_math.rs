//! Criterion benchmark for the hot math kernels: axpy, dot, sigmoid,
//! softmax and the reference gemm.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use deepx_core::math::ll_math;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_buffer(rng: &mut SmallRng, n: usize) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn bench_vector_kernels(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut group = c.benchmark_group("vector_kernels");
    for n in [64usize, 1024, 16 * 1024] {
        let x = random_buffer(&mut rng, n);
        let mut y = random_buffer(&mut rng, n);

        group.bench_with_input(BenchmarkId::new("axpy", n), &n, |b, _| {
            b.iter(|| ll_math::axpy(black_box(0.5f32), black_box(&x), black_box(&mut y)));
        });
        group.bench_with_input(BenchmarkId::new("dot", n), &n, |b, _| {
            b.iter(|| ll_math::dot(black_box(&x), black_box(&y)));
        });
        group.bench_with_input(BenchmarkId::new("sigmoid", n), &n, |b, _| {
            b.iter(|| ll_math::sigmoid(black_box(&x), black_box(&mut y)));
        });
        group.bench_with_input(BenchmarkId::new("softmax", n), &n, |b, _| {
            b.iter(|| ll_math::softmax(black_box(&x), black_box(&mut y)));
        });
    }
    group.finish();
}

fn bench_gemm(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(43);
    let mut group = c.benchmark_group("gemm");
    for n in [16usize, 64, 128] {
        let x = random_buffer(&mut rng, n * n);
        let y = random_buffer(&mut rng, n * n);
        let mut z = vec![0.0f32; n * n];
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                ll_math::gemm(
                    false,
                    false,
                    n,
                    n,
                    n,
                    black_box(1.0f32),
                    black_box(&x),
                    black_box(&y),
                    black_box(0.0f32),
                    black_box(&mut z),
                );
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_vector_kernels, bench_gemm);
criterion_main!(benches);
