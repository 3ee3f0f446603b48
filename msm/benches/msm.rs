use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use msm512::{mul_each, mul_vec, Fr, G1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Chained points (`P_{i+1} = P_i + P_0`) make setup cheap at large n, the
/// way MSM benchmarks usually seed their inputs.
fn inputs(n: usize) -> (Vec<G1>, Vec<Fr>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0xb5);
    let p0 = G1::from_seed(b"bench");
    let mut points = Vec::with_capacity(n);
    points.push(p0);
    for i in 1..n {
        let p = points[i - 1] + p0;
        points.push(p);
    }
    let scalars = (0..n).map(|_| Fr::rand_from_rng(&mut rng)).collect();
    (points, scalars)
}

fn bench_mul_vec(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul_vec");
    group.sample_size(10);
    for log_n in [10usize, 12, 14] {
        let n = 1 << log_n;
        let (points, scalars) = inputs(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| mul_vec(&points, &scalars))
        });
    }
    group.finish();
}

fn bench_mul_each(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul_each");
    group.sample_size(10);
    for n in [256usize, 1024] {
        let (points, scalars) = inputs(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut p = points.clone();
                mul_each(&mut p, &scalars);
                p
            })
        });
    }
    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_mul_vec_mt(c: &mut Criterion) {
    let mut group = c.benchmark_group("mul_vec_mt");
    group.sample_size(10);
    let n = 1 << 14;
    let (points, scalars) = inputs(n);
    group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
        b.iter(|| msm512::mul_vec_mt(&points, &scalars))
    });
    group.finish();
}

fn init_logging(_c: &mut Criterion) {
    let _ = env_logger::Builder::from_default_env().try_init();
}

#[cfg(feature = "parallel")]
criterion_group!(
    benches,
    init_logging,
    bench_mul_vec,
    bench_mul_vec_mt,
    bench_mul_each
);
#[cfg(not(feature = "parallel"))]
criterion_group!(benches, init_logging, bench_mul_vec, bench_mul_each);
criterion_main!(benches);
