//! In-place per-point scalar multiplication, `P_i <- s_i * P_i`.
//!
//! Each group of sixteen points gets a 17-entry multiple table in Jacobian
//! form, its endomorphism image, and a window-5 NAF walk over the two GLV
//! halves of its scalars. Tables for four groups are built before a single
//! batched normalization so the mixed addition applies throughout. A rare
//! mid-ladder collision between the accumulator and a gathered table entry
//! would defeat the mixed formula; inputs are not adversary-controlled here
//! and the collision probability is cryptographically negligible, which is
//! the same stance the scalar reference takes on exceptional inputs.

use msm512_field::fp16::M16;
use msm512_field::fr::Fr;
use msm512_field::packed::PackedFp;
use msm512_field::simd::{M8, V8};

use crate::g1::G1;
use crate::glv::{self, NAF_DIGITS, NAF_TABLE, NAF_WINDOW};
use crate::point::{normalize_jacobi_vec, Ec16};

/// Groups per batched table normalization.
const GROUPS_PER_BATCH: usize = 4;
const WIDTH: usize = 16;

/// Multiply every point by its scalar, in place.
/// `points.len()` must equal `scalars.len()` and be divisible by eight.
pub fn mul_each(points: &mut [G1], scalars: &[Fr]) {
    assert_eq!(points.len(), scalars.len());
    assert_eq!(points.len() % 8, 0);

    // One batched inversion up front; the table construction relies on
    // normalized inputs for its mixed additions.
    G1::normalize_vec(points);

    let n = points.len();
    let d = n / WIDTH;
    let mut i = 0;
    while i < d {
        let take = (d - i).min(GROUPS_PER_BATCH);
        let mut q: Vec<Ec16> = (0..take)
            .map(|k| Ec16::from_g1_lanes(&points[(i + k) * WIDTH..(i + k + 1) * WIDTH], false))
            .collect();
        mul_glv(&mut q, &scalars[i * WIDTH..(i + take) * WIDTH]);
        for (k, qk) in q.iter().enumerate() {
            qk.write_g1_lanes(
                &mut points[(i + k) * WIDTH..(i + k + 1) * WIDTH],
                false,
            );
        }
        i += take;
    }

    // Trailing group of eight: pad with identities and zero scalars, run a
    // full sixteen-wide ladder, write back only the real lanes.
    if n % WIDTH != 0 {
        let base = d * WIDTH;
        let mut pts = [G1::ZERO; WIDTH];
        pts[..8].copy_from_slice(&points[base..base + 8]);
        let mut scs = [Fr::ZERO; WIDTH];
        scs[..8].copy_from_slice(&scalars[base..base + 8]);
        let mut q = vec![Ec16::from_g1_lanes(&pts, false)];
        mul_glv(&mut q, &scs);
        let mut out = [G1::ZERO; WIDTH];
        q[0].write_g1_lanes(&mut out, false);
        points[base..base + 8].copy_from_slice(&out[..8]);
    }
}

/// The windowed GLV ladder over a batch of packed groups. `q` is both input
/// and output; `scalars` holds sixteen scalars per group.
fn mul_glv(q: &mut [Ec16], scalars: &[Fr]) {
    let n = q.len();
    assert_eq!(scalars.len(), n * WIDTH);

    // Tables for the whole batch, normalized with one inversion. The global
    // first entry is the canonical identity and stays out of the sweep;
    // identity entries of later tables pass through it unchanged.
    let mut tbl1 = vec![Ec16::ZERO_JACOBI; NAF_TABLE * n];
    for k in 0..n {
        let p = q[k];
        Ec16::make_table(&mut tbl1[k * NAF_TABLE..(k + 1) * NAF_TABLE], &p);
    }
    normalize_jacobi_vec(&mut tbl1[1..], false);

    for k in 0..n {
        let t1 = &tbl1[k * NAF_TABLE..(k + 1) * NAF_TABLE];
        let mut t2 = [Ec16::ZERO_JACOBI; NAF_TABLE];
        for (dst, src) in t2.iter_mut().zip(t1) {
            *dst = src.mul_lambda();
        }

        // GLV split of this group's scalars, lane-major per half.
        let mut a_half = [[V8::ZERO; 2]; 2];
        let mut b_half = [[V8::ZERO; 2]; 2];
        for j in 0..WIDTH {
            let (a, b) = glv::decompose(&scalars[k * WIDTH + j]);
            let (h, l) = (j / 8, j % 8);
            a_half[h][0].0[l] = a[0];
            a_half[h][1].0[l] = a[1];
            b_half[h][0].0[l] = b[0];
            b_half[h][1].0[l] = b[1];
        }
        let mut a_idx = [[V8::ZERO; NAF_DIGITS]; 2];
        let mut a_neg = [[M8::NONE; NAF_DIGITS]; 2];
        let mut b_idx = [[V8::ZERO; NAF_DIGITS]; 2];
        let mut b_neg = [[M8::NONE; NAF_DIGITS]; 2];
        for h in 0..2 {
            glv::make_naf_tbl(&mut a_idx[h], &mut a_neg[h], &a_half[h]);
            glv::make_naf_tbl(&mut b_idx[h], &mut b_neg[h], &b_half[h]);
        }

        // MSB to LSB: five doublings, then one signed digit from each half.
        for i in 0..NAF_DIGITS {
            if i > 0 {
                for _ in 0..NAF_WINDOW {
                    q[k] = Ec16::dbl_jacobi(&q[k]);
                }
            }
            let pos = NAF_DIGITS - 1 - i;

            let idx = [b_idx[0][pos], b_idx[1][pos]];
            let neg = M16([b_neg[0][pos], b_neg[1][pos]]);
            let mut t = Ec16::gather(&t2, &idx);
            t.y = PackedFp::select(neg, t.y.neg(), t.y);
            q[k] = if i == 0 {
                t
            } else {
                Ec16::add_jacobi_mixed(&q[k], &t)
            };

            let idx = [a_idx[0][pos], a_idx[1][pos]];
            let neg = M16([a_neg[0][pos], a_neg[1][pos]]);
            let mut t = Ec16::gather(t1, &idx);
            t.y = PackedFp::select(neg, t.y.neg(), t.y);
            q[k] = Ec16::add_jacobi_mixed(&q[k], &t);
        }
    }
}
