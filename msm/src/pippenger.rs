//! Windowed bucket multi-scalar multiplication.
//!
//! Pipeline: pack the points eight wide, batch-normalize them to affine
//! (`z = 1`, where Jacobian and projective coordinates coincide), double the
//! point set with the endomorphism to halve the scalars to 128 bits, then
//! sweep the scalar windows from most significant to least, accumulating
//! into `2^b` projective buckets per lane. Each lane accumulates an
//! independent partial MSM; the eight partial sums are folded with the
//! reference addition at the end, together with the scalar tail for inputs
//! not divisible by the SIMD width.

use itertools::izip;
use log::debug;
use msm512_field::fr::Fr;
use msm512_field::simd::{and64, V8};

use crate::g1::G1;
use crate::glv;
use crate::point::{normalize_jacobi_vec, Ec8};

/// Empirically tuned window width by `log2` of the packed point count.
///
/// The theoretical optimum overshoots in wall-clock because large bucket
/// tables stop fitting in cache; this table trades a few extra additions for
/// locality. Above the measured range the width clamps to 16.
pub(crate) fn bucket_width(n: usize) -> usize {
    const TBL_MIN_LOG2: usize = 6;
    const TBL: [usize; 21] = [
        3, 4, 5, 5, 6, 7, 8, 8, 10, 10, 10, 10, 10, 13, 15, 15, 16, 16, 16, 16, 16,
    ];
    if n == 0 {
        return 2;
    }
    let log2n = n.ilog2() as usize;
    if log2n < TBL_MIN_LOG2 {
        return 2;
    }
    if log2n - TBL_MIN_LOG2 >= TBL.len() {
        return 16;
    }
    TBL[log2n - TBL_MIN_LOG2]
}

/// One window: clear the buckets, route every packed point into the bucket
/// selected by its digit, then combine the buckets into the window sum with
/// the linear recurrence (`2 * (2^b - 1)` additions for `sum_j j * bucket_j`).
fn update_table(
    win: &mut Ec8,
    tbl: &mut [Ec8],
    xvec: &[Ec8],
    yvec: &[V8],
    pos: usize,
    first: bool,
) {
    let tbl_n = tbl.len();
    let mask = V8::splat(tbl_n as u64 - 1);
    for e in tbl.iter_mut() {
        *e = Ec8::ZERO_PROJ;
    }
    for (p, digits) in izip!(xvec.iter(), yvec.chunks_exact(2)) {
        let v = and64(glv::get_unit_at(digits, pos), mask);
        let t = Ec8::gather(tbl, v);
        let t = Ec8::add_proj_mixed(&t, p);
        t.scatter(tbl, v);
    }
    let mut sum = tbl[tbl_n - 1];
    *win = if first {
        sum
    } else {
        Ec8::add_proj(win, &sum)
    };
    for i in 1..tbl_n - 1 {
        sum = Ec8::add_proj(&sum, &tbl[tbl_n - 1 - i]);
        *win = Ec8::add_proj(win, &sum);
    }
}

/// The packed accumulation over 128-bit scalar halves: `xvec` holds the
/// points then their endomorphism images, `yvec` two digit vectors per
/// entry.
fn mul_vec_packed(xvec: &[Ec8], yvec: &[V8], bucket_override: usize) -> Ec8 {
    let n = xvec.len();
    let b = if bucket_override != 0 {
        bucket_override
    } else {
        bucket_width(n)
    };
    debug!("msm: {} packed points, window width {}", n, b);
    let tbl_n = 1usize << b;
    let mut tbl = vec![Ec8::ZERO_PROJ; tbl_n];
    let win_n = (128 + b - 1) / b;

    let mut acc = Ec8::ZERO_PROJ;
    update_table(&mut acc, &mut tbl, xvec, yvec, b * (win_n - 1), true);
    for w in 1..win_n {
        for _ in 0..b {
            acc = Ec8::dbl_proj(&acc);
        }
        update_table(&mut acc, &mut tbl, xvec, yvec, b * (win_n - 1 - w), false);
    }
    acc
}

/// Unpack the packed accumulator and fold the eight lanes with the
/// reference addition.
fn reduce_sum(p: &Ec8) -> G1 {
    let mut lanes = [G1::ZERO; 8];
    p.write_g1_lanes(&mut lanes, true);
    lanes.into_iter().fold(G1::ZERO, |acc, q| acc + q)
}

/// `sum_i scalars[i] * points[i]` with the window width chosen by the
/// heuristic.
pub fn mul_vec(points: &[G1], scalars: &[Fr]) -> G1 {
    mul_vec_with_bucket_width(points, scalars, 0)
}

/// As [`mul_vec`], with a caller-supplied bucket window width; zero means
/// use the heuristic. Correctness does not depend on the choice.
pub fn mul_vec_with_bucket_width(points: &[G1], scalars: &[Fr], bucket_override: usize) -> G1 {
    assert_eq!(points.len(), scalars.len());
    if bucket_override != 0 {
        assert!(
            (2..=20).contains(&bucket_override),
            "bucket width override out of range"
        );
    }
    let n = points.len();
    let d = n / 8;
    let mut acc = G1::ZERO;
    if d > 0 {
        // Pack, then normalize everything with one inversion; affine points
        // make the bucket additions mixed and serve both coordinate systems.
        let mut xvec: Vec<Ec8> = Vec::with_capacity(2 * d);
        for i in 0..d {
            xvec.push(Ec8::from_g1_lanes(&points[i * 8..(i + 1) * 8], false));
        }
        normalize_jacobi_vec(&mut xvec, true);
        for i in 0..d {
            let img = xvec[i].mul_lambda();
            xvec.push(img);
        }

        // Split scalars; the `a` halves drive the first `d` packed points,
        // the `b` halves their endomorphism images.
        let mut yvec = vec![V8::ZERO; 4 * d];
        for i in 0..d {
            for j in 0..8 {
                let (a, b) = glv::decompose(&scalars[i * 8 + j]);
                yvec[2 * i].0[j] = a[0];
                yvec[2 * i + 1].0[j] = a[1];
                yvec[2 * (d + i)].0[j] = b[0];
                yvec[2 * (d + i) + 1].0[j] = b[1];
            }
        }

        acc = reduce_sum(&mul_vec_packed(&xvec, &yvec, bucket_override));
    }
    // Scalar tail.
    for (p, s) in points[d * 8..].iter().zip(&scalars[d * 8..]) {
        acc += p.mul(s);
    }
    acc
}

/// Parallel driver: disjoint chunks through the single-threaded engine, one
/// bucket table per thread, partial sums folded at the end.
#[cfg(feature = "parallel")]
pub fn mul_vec_mt(points: &[G1], scalars: &[Fr]) -> G1 {
    use rayon::prelude::*;

    assert_eq!(points.len(), scalars.len());
    let n = points.len();
    let threads = rayon::current_num_threads().max(1);
    // Round chunks to the SIMD width so only the last chunk has a tail.
    let chunk = ((n + threads - 1) / threads + 7) & !7;
    if n <= chunk.max(8) {
        return mul_vec(points, scalars);
    }
    points
        .par_chunks(chunk)
        .zip(scalars.par_chunks(chunk))
        .map(|(p, s)| mul_vec(p, s))
        .reduce(|| G1::ZERO, |a, b| a + b)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    /// Points with known discrete logs so huge cases have a cheap oracle:
    /// `sum s_i * (k_i G) = (sum s_i k_i) G`. Chained additions keep the
    /// setup linear in `n`.
    fn known_dlog_inputs(rng: &mut ChaCha8Rng, n: usize) -> (Vec<G1>, Vec<Fr>, Vec<Fr>) {
        let mut points = Vec::with_capacity(n);
        let mut dlogs = Vec::with_capacity(n);
        let mut scalars = Vec::with_capacity(n);
        let k0 = Fr::rand_from_rng(rng);
        let p0 = G1::GENERATOR.mul(&k0);
        let mut k = k0;
        let mut p = p0;
        for i in 0..n {
            if i > 0 {
                k += k0;
                p += p0;
            }
            points.push(p);
            dlogs.push(k);
            scalars.push(Fr::rand_from_rng(rng));
        }
        (points, dlogs, scalars)
    }

    fn dlog_oracle(dlogs: &[Fr], scalars: &[Fr]) -> G1 {
        let total: Fr = dlogs
            .iter()
            .zip(scalars)
            .map(|(k, s)| *k * *s)
            .fold(Fr::ZERO, |a, b| a + b);
        G1::GENERATOR.mul(&total)
    }

    fn naive_msm(points: &[G1], scalars: &[Fr]) -> G1 {
        points
            .iter()
            .zip(scalars)
            .fold(G1::ZERO, |acc, (p, s)| acc + p.mul(s))
    }

    #[test]
    fn test_single_point_among_identities() {
        // One real (point, scalar) pair in lane 0, identities elsewhere.
        let mut points = [G1::ZERO; 8];
        let mut scalars = [Fr::ZERO; 8];
        points[0] = G1::from_seed(b"abc");
        scalars[0] = G1::scalar_from_seed(b"abc");
        let r = mul_vec(&points, &scalars);
        assert_eq!(r, points[0].mul(&scalars[0]));
    }

    #[test]
    fn test_small_against_naive() {
        let mut rng = ChaCha8Rng::seed_from_u64(40);
        for n in [8usize, 64] {
            let (mut points, _, mut scalars) = known_dlog_inputs(&mut rng, n);
            // Identity points, zero scalars, and equal consecutive points.
            points[1] = G1::ZERO;
            scalars[2] = Fr::ZERO;
            points[4] = points[3];
            if n > 8 {
                points[33] = points[32];
                scalars[33] = scalars[32];
                points[63] = G1::ZERO;
            }
            assert_eq!(mul_vec(&points, &scalars), naive_msm(&points, &scalars));
        }
    }

    #[test]
    fn test_medium_with_identities() {
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let n = 1024;
        let (mut points, mut dlogs, scalars) = known_dlog_inputs(&mut rng, n);
        points[32] = G1::ZERO;
        dlogs[32] = Fr::ZERO;
        points[512] = G1::ZERO;
        dlogs[512] = Fr::ZERO;
        assert_eq!(mul_vec(&points, &scalars), dlog_oracle(&dlogs, &scalars));
    }

    #[test]
    fn test_scalar_tail() {
        // 8203 is prime, so the final three points go down the scalar path.
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 8203;
        let (points, dlogs, scalars) = known_dlog_inputs(&mut rng, n);
        assert_eq!(mul_vec(&points, &scalars), dlog_oracle(&dlogs, &scalars));
    }

    #[test]
    fn test_tiny_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        assert_eq!(mul_vec(&[], &[]), G1::ZERO);
        for n in 1..8 {
            let (points, dlogs, scalars) = known_dlog_inputs(&mut rng, n);
            assert_eq!(mul_vec(&points, &scalars), dlog_oracle(&dlogs, &scalars));
        }
    }

    #[test]
    fn test_bucket_width_override_is_correctness_neutral() {
        let mut rng = ChaCha8Rng::seed_from_u64(44);
        let n = 512;
        let (points, dlogs, scalars) = known_dlog_inputs(&mut rng, n);
        let want = dlog_oracle(&dlogs, &scalars);
        for b in [0usize, 2, 5, 8] {
            assert_eq!(
                mul_vec_with_bucket_width(&points, &scalars, b),
                want,
                "bucket width {b}"
            );
        }
    }

    #[test]
    fn test_heuristic_table() {
        assert_eq!(bucket_width(0), 2);
        assert_eq!(bucket_width(63), 2);
        assert_eq!(bucket_width(64), 3);
        assert_eq!(bucket_width(1 << 10), 6);
        assert_eq!(bucket_width(1 << 20), 15);
        assert_eq!(bucket_width(1 << 26), 16);
        assert_eq!(bucket_width(1 << 30), 16);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = ChaCha8Rng::seed_from_u64(45);
        let n = 1000;
        let (points, _, scalars) = known_dlog_inputs(&mut rng, n);
        assert_eq!(mul_vec_mt(&points, &scalars), mul_vec(&points, &scalars));
    }
}
