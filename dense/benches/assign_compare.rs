use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dense::{ExprMut, MatrixBase, MatrixX};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn make_random(n: usize, seed: u64) -> MatrixX<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    MatrixX::random_with(n, n, &mut rng)
}

/// Fused `a + b * s` against two separate passes through a temporary.
fn bench_fused_axpy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fused_axpy");
    for size in [100usize, 500, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let a = make_random(size, 0);
        let b = make_random(size, 1);
        let mut out = MatrixX::<f64>::zeros(size, size);

        group.bench_with_input(BenchmarkId::new("two_pass", size), &size, |bench, _| {
            bench.iter(|| {
                let scaled = (&b * 2.0).eval();
                out.assign(&a + &scaled);
                black_box(&out);
            })
        });

        group.bench_with_input(BenchmarkId::new("fused", size), &size, |bench, _| {
            bench.iter(|| {
                out.assign(&a + &b * 2.0);
                black_box(&out);
            })
        });
    }
    group.finish();
}

/// Transposed source: strided kernel against the coefficient loop.
fn bench_transposed_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("transposed_copy");
    for size in [100usize, 500, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let a = make_random(size, 2);
        let mut out = MatrixX::<f64>::zeros(size, size);

        group.bench_with_input(BenchmarkId::new("kernel", size), &size, |bench, _| {
            bench.iter(|| {
                out.assign((&a).transpose());
                black_box(&out);
            })
        });

        group.bench_with_input(BenchmarkId::new("coeff_loop", size), &size, |bench, _| {
            bench.iter(|| {
                out.assign((&a).transpose().map(|x| x));
                black_box(&out);
            })
        });
    }
    group.finish();
}

/// Aliasing check cost on a product destination.
fn bench_product_aliasing(c: &mut Criterion) {
    let mut group = c.benchmark_group("product_aliasing");
    for size in [32usize, 128, 256] {
        let a = make_random(size, 3);
        let b = make_random(size, 4);
        let mut out = MatrixX::<f64>::zeros(size, size);

        group.bench_with_input(BenchmarkId::new("checked", size), &size, |bench, _| {
            bench.iter(|| {
                out.assign(&a * &b);
                black_box(&out);
            })
        });

        group.bench_with_input(BenchmarkId::new("noalias", size), &size, |bench, _| {
            bench.iter(|| {
                out.noalias().assign(&a * &b);
                black_box(&out);
            })
        });
    }
    group.finish();
}

fn bench_reductions(c: &mut Criterion) {
    let mut group = c.benchmark_group("reductions");
    for size in [100usize, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let a = make_random(size, 5);

        group.bench_with_input(BenchmarkId::new("sum", size), &size, |bench, _| {
            bench.iter(|| black_box((&a).sum()))
        });

        group.bench_with_input(BenchmarkId::new("squared_norm", size), &size, |bench, _| {
            bench.iter(|| black_box((&a).squared_norm()))
        });

        group.bench_with_input(BenchmarkId::new("colwise_sum", size), &size, |bench, _| {
            bench.iter(|| black_box((&a).colwise().sum().eval()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_fused_axpy,
    bench_transposed_copy,
    bench_product_aliasing,
    bench_reductions
);
criterion_main!(benches);
