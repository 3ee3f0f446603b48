//! Packed curve points: eight or sixteen G1 points operated on in lockstep.
//!
//! Two coordinate interpretations share the `(x, y, z)` container and are
//! used by distinct code paths:
//!
//! - *projective* `(X : Y : Z)` with identity `(0, 1, 0)` — the complete
//!   Renes-Costello-Batina formulas, used by the bucket accumulator where a
//!   lane may hit any special case;
//! - *Jacobian* `(X : Y : Z)`, affine point `(X/Z^2, Y/Z^3)`, identity
//!   `z = 0` — the cheaper formulas used by the per-point GLV ladder, where
//!   the table construction rules the special cases out and two lane selects
//!   patch the identities.
//!
//! The formulas are generic over [`PackedFp`] and monomorphize to both
//! widths; only the strided conversions and table gathers are width
//! specific.

use msm512_field::fp16::Fp16;
use msm512_field::fp8::Fp8;
use msm512_field::packed::PackedFp;
use msm512_field::radix52::G1_PICKUP;
use msm512_field::simd::{add64, gather64, madd52lo, scatter64, LANE_IDX, V8};

use crate::g1::G1;

/// `3 * b = 12` in the packed Montgomery domain.
pub(crate) const B3_WORDS: [u64; 8] = [
    0x460afeaf7b431,
    0xcd5122beb5b19,
    0xc4664aadd2de0,
    0x1d78417c77713,
    0xa4d7d1f9b9711,
    0x004b2b884890e,
    0x717302e000d24,
    0x000000000f618,
];

/// `beta`, the cube root of unity pairing with `lambda`, packed Montgomery.
pub(crate) const BETA_WORDS: [u64; 8] = [
    0xa424657e25648,
    0xc75706049e739,
    0xb59085299e0e2,
    0xd9cf17286a964,
    0x069ec7cb33aa8,
    0x35e995b239c7e,
    0x82faa0ff3c329,
    0x0000000017601,
];

#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct PackedEc<F: PackedFp> {
    pub x: F,
    pub y: F,
    pub z: F,
}

pub type Ec8 = PackedEc<Fp8>;
pub type Ec16 = PackedEc<Fp16>;

impl<F: PackedFp> PackedEc<F> {
    /// Projective identity `(0, 1, 0)` in every lane.
    pub const ZERO_PROJ: Self = Self {
        x: F::ZERO,
        y: F::ONE,
        z: F::ZERO,
    };

    /// Jacobian identity: any `(x, y, 0)`; kept canonical as `(1, 1, 0)`.
    pub const ZERO_JACOBI: Self = Self {
        x: F::ONE,
        y: F::ONE,
        z: F::ZERO,
    };

    #[inline]
    pub fn select(mask: F::Mask, a: &Self, b: &Self) -> Self {
        Self {
            x: F::select(mask, a.x, b.x),
            y: F::select(mask, a.y, b.y),
            z: F::select(mask, a.z, b.z),
        }
    }

    #[inline]
    pub fn cset(&mut self, mask: F::Mask, v: &Self) {
        self.x.cset(mask, v.x);
        self.y.cset(mask, v.y);
        self.z.cset(mask, v.z);
    }

    #[inline]
    pub fn is_zero(&self) -> F::Mask {
        self.z.is_zero()
    }

    #[inline]
    pub fn neg(&self) -> Self {
        Self {
            x: self.x,
            y: self.y.neg(),
            z: self.z,
        }
    }

    /// Apply the curve endomorphism: `x` is scaled by `beta`, which
    /// multiplies the point by `lambda`.
    #[inline]
    pub fn mul_lambda(&self) -> Self {
        Self {
            x: self.x.mul_by_words(&BETA_WORDS),
            y: self.y,
            z: self.z,
        }
    }

    /// Complete projective addition (Renes-Costello-Batina, `a = 0`).
    /// Total: correct for identities, doubling and inverse pairs.
    pub fn add_proj(p: &Self, q: &Self) -> Self {
        let t0 = p.x * q.x;
        let t1 = p.y * q.y;
        let t2 = p.z * q.z;
        let t3 = (p.x + p.y) * (q.x + q.y) - (t0 + t1);
        let t4 = (p.y + p.z) * (q.y + q.z) - (t1 + t2);
        let t5 = (p.x + p.z) * (q.x + q.z) - (t0 + t2);
        let t0 = t0.double() + t0;
        let t2 = t2.mul_by_words(&B3_WORDS);
        let z3 = t1 + t2;
        let t1 = t1 - t2;
        let t5 = t5.mul_by_words(&B3_WORDS);
        Self {
            x: t3 * t1 - t4 * t5,
            y: t5 * t0 + t1 * z3,
            z: z3 * t4 + t0 * t3,
        }
    }

    /// Complete mixed projective addition: `q.z` is assumed to be one, and
    /// identity lanes of `q` (marked `z = 0`) are patched by a final select.
    pub fn add_proj_mixed(p: &Self, q: &Self) -> Self {
        let t0 = p.x * q.x;
        let t1 = p.y * q.y;
        let t3 = (q.x + q.y) * (p.x + p.y) - (t0 + t1);
        let t4 = q.y * p.z + p.y;
        let t5 = q.x * p.z + p.x;
        let t0 = t0.double() + t0;
        let t2 = p.z.mul_by_words(&B3_WORDS);
        let z3 = t1 + t2;
        let t1 = t1 - t2;
        let t5 = t5.mul_by_words(&B3_WORDS);
        let r = Self {
            x: t3 * t1 - t4 * t5,
            y: t5 * t0 + t1 * z3,
            z: z3 * t4 + t0 * t3,
        };
        Self::select(q.is_zero(), p, &r)
    }

    /// Complete projective doubling (`a = 0`).
    pub fn dbl_proj(p: &Self) -> Self {
        let t0 = p.y.square();
        let s = t0.double().double().double();
        let t1 = p.y * p.z;
        let t2 = p.z.square().mul_by_words(&B3_WORDS);
        let x3 = t2 * s;
        let y3 = t0 + t2;
        let z3 = t1 * s;
        let t2 = t2.double() + t2;
        let t0 = t0 - t2;
        Self {
            x: (t0 * (p.x * p.y)).double(),
            y: t0 * y3 + x3,
            z: z3,
        }
    }

    /// Jacobian addition, 12M + 4S. The raw formula assumes `p != +-q` and
    /// no identities; the two trailing selects patch identity lanes, and the
    /// callers keep `p = +-q` out of the hot loop by construction.
    pub fn add_jacobi(p: &Self, q: &Self) -> Self {
        let r = p.z.square();
        let s1 = q.z.square();
        let u1 = p.x * s1;
        let h = q.x * r - u1;
        let s1 = s1 * q.z * p.y;
        let r = r * p.z * q.y - s1;
        let z3 = p.z * q.z * h;
        let h2 = h.square();
        let mut y3 = r.square();
        let u1 = u1 * h2;
        let h3 = h2 * h;
        y3 = y3 - u1 - u1;
        let x3 = y3 - h3;
        let t = Self {
            x: x3,
            y: (u1 - x3) * r - h3 * s1,
            z: z3,
        };
        let t = Self::select(p.is_zero(), q, &t);
        Self::select(q.is_zero(), p, &t)
    }

    /// Mixed Jacobian addition, 8M + 3S; `q` must be normalized (`z = 1`
    /// or an identity lane).
    pub fn add_jacobi_mixed(p: &Self, q: &Self) -> Self {
        let r = p.z.square();
        let u1 = p.x;
        let h = q.x * r - u1;
        let s1 = p.y;
        let r = r * p.z * q.y - s1;
        let z3 = p.z * h;
        let h2 = h.square();
        let mut y3 = r.square();
        let u1 = u1 * h2;
        let h3 = h2 * h;
        y3 = y3 - u1 - u1;
        let x3 = y3 - h3;
        let t = Self {
            x: x3,
            y: (u1 - x3) * r - h3 * s1,
            z: z3,
        };
        let t = Self::select(p.is_zero(), q, &t);
        Self::select(q.is_zero(), p, &t)
    }

    /// Jacobian doubling, `a = 0`, 3M + 4S. Identity lanes keep `z = 0`.
    pub fn dbl_jacobi(p: &Self) -> Self {
        let x2 = p.x.square();
        let y2 = p.y.square();
        let xy = (p.x * y2).double().double();
        let y4 = y2.square();
        let w = x2.double() + x2;
        let x3 = w.square() - xy.double();
        let z3 = (p.y * p.z).double();
        let y3 = (xy - x3) * w - y4.double().double().double();
        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Per-lane Jacobian equality (identity lanes compare by `z` only at the
    /// callers; here both sides are assumed non-identity).
    pub fn is_equal_jacobi_all(&self, rhs: &Self) -> F::Mask {
        let s1 = self.z.square();
        let s2 = rhs.z.square();
        let v1 = (self.x * s2).is_equal_all(&(rhs.x * s1));
        let t1 = self.y * s2 * rhs.z;
        let t2 = rhs.y * s1 * self.z;
        F::mask_and(v1, t1.is_equal_all(&t2))
    }

    /// Jacobian `(X, Y, Z)` to projective `(XZ, Y, Z^3)`.
    pub fn jacobi_to_proj(p: &Self) -> Self {
        Self {
            x: p.x * p.z,
            y: p.y,
            z: p.z.square() * p.z,
        }
    }

    /// Projective `(X, Y, Z)` to Jacobian `(XZ, YZ^2, Z)`.
    pub fn proj_to_jacobi(p: &Self) -> Self {
        let z2 = p.z.square();
        Self {
            x: p.x * p.z,
            y: p.y * z2,
            z: p.z,
        }
    }

    /// Fill `tbl` with `{O, P, 2P, ..., (len-1)P}` in Jacobian form.
    /// `p` must be normalized, as the odd entries use the mixed addition.
    pub fn make_table(tbl: &mut [Self], p: &Self) {
        tbl[0] = Self::ZERO_JACOBI;
        tbl[1] = *p;
        tbl[2] = Self::dbl_jacobi(p);
        for i in 3..tbl.len() {
            tbl[i] = if i & 1 == 1 {
                let prev = tbl[i - 1];
                Self::add_jacobi_mixed(&prev, p)
            } else {
                let half = tbl[i / 2];
                Self::dbl_jacobi(&half)
            };
        }
    }
}

/// Normalize a slice of Jacobian packed points to `z = 1` with a single
/// batched inversion: forward prefix products of the `z` values (identity
/// lanes substituted by one), one inverse, then a backward sweep that peels
/// one `z` per step. Identity lanes keep `z = 0`; when the points are about
/// to be fed to the projective formulas, `for_proj` also forces their `y`
/// to one so the lanes read `(x, 1, 0)`-shaped identities.
pub fn normalize_jacobi_vec<F: PackedFp>(pts: &mut [PackedEc<F>], for_proj: bool) {
    let n = pts.len();
    if n == 0 {
        return;
    }
    let mut tbl: Vec<F> = Vec::with_capacity(n);
    tbl.push(F::select(pts[0].z.is_zero(), F::ONE, pts[0].z));
    for i in 1..n {
        let t = F::select(pts[i].z.is_zero(), F::ONE, pts[i].z);
        let prev = tbl[i - 1];
        tbl.push(prev * t);
    }
    let mut r = tbl[n - 1].inverse();
    for i in (0..n).rev() {
        let z_is_zero = pts[i].z.is_zero();
        let rz = if i == 0 {
            r
        } else {
            let rz = r * tbl[i - 1];
            r = r * F::select(z_is_zero, F::ONE, pts[i].z);
            rz
        };
        let rz2 = rz.square();
        pts[i].x = pts[i].x * rz2;
        pts[i].y = pts[i].y * (rz2 * rz);
        pts[i].z = F::select(z_is_zero, pts[i].z, F::ONE);
        if for_proj {
            pts[i].y = F::select(z_is_zero, F::ONE, pts[i].y);
        }
    }
}

#[inline]
fn g1_words(points: &[G1]) -> &[u64] {
    // G1 is three transparent [u64; 6] coordinates, repr(C).
    unsafe { core::slice::from_raw_parts(points.as_ptr().cast::<u64>(), points.len() * 18) }
}

#[inline]
fn g1_words_mut(points: &mut [G1]) -> &mut [u64] {
    unsafe { core::slice::from_raw_parts_mut(points.as_mut_ptr().cast::<u64>(), points.len() * 18) }
}

#[inline]
fn ec8_words(tbl: &[Ec8]) -> &[u64] {
    unsafe { core::slice::from_raw_parts(tbl.as_ptr().cast::<u64>(), tbl.len() * 192) }
}

#[inline]
fn ec8_words_mut(tbl: &mut [Ec8]) -> &mut [u64] {
    unsafe { core::slice::from_raw_parts_mut(tbl.as_mut_ptr().cast::<u64>(), tbl.len() * 192) }
}

#[inline]
fn ec16_words(tbl: &[Ec16]) -> &[u64] {
    unsafe { core::slice::from_raw_parts(tbl.as_ptr().cast::<u64>(), tbl.len() * 384) }
}

impl Ec8 {
    /// Pack eight reference points. With `to_proj` the Jacobian input is
    /// converted to projective and identity lanes are canonicalized to
    /// `(0, 1, 0)`.
    pub fn from_g1_lanes(points: &[G1], to_proj: bool) -> Self {
        assert_eq!(points.len(), 8);
        let words = g1_words(points);
        let mut coords = [Fp8::ZERO; 3];
        for (c, coord) in coords.iter_mut().enumerate() {
            let mut t = [V8::ZERO; 6];
            for (j, tj) in t.iter_mut().enumerate() {
                *tj = gather64(words, add64(G1_PICKUP, V8::splat((c * 6 + j) as u64)));
            }
            *coord = Fp8::from_dense_vectors(&t);
        }
        let mut p = Self {
            x: coords[0],
            y: coords[1],
            z: coords[2],
        };
        if to_proj {
            p = Self::jacobi_to_proj(&p);
            p.y = Fp8::select(p.z.is_zero(), Fp8::ONE, p.y);
        }
        p
    }

    /// Unpack into eight reference points; with `from_proj` the projective
    /// accumulator is converted back to Jacobian first.
    pub fn write_g1_lanes(&self, out: &mut [G1], from_proj: bool) {
        assert_eq!(out.len(), 8);
        let t = if from_proj {
            Self::proj_to_jacobi(self)
        } else {
            *self
        };
        let words = g1_words_mut(out);
        for (c, f) in [t.x, t.y, t.z].iter().enumerate() {
            let d = f.to_dense_vectors();
            for (j, dj) in d.iter().enumerate() {
                scatter64(words, add64(G1_PICKUP, V8::splat((c * 6 + j) as u64)), *dj);
            }
        }
    }

    /// Fetch, per lane `j`, lane `j` of `tbl[idx[j]]`.
    pub fn gather(tbl: &[Self], idx: V8) -> Self {
        let words = ec8_words(tbl);
        let off = madd52lo(LANE_IDX, idx, V8::splat(192));
        let mut coords = [Fp8::ZERO; 3];
        for (c, coord) in coords.iter_mut().enumerate() {
            let mut v = [V8::ZERO; 8];
            for (k, vk) in v.iter_mut().enumerate() {
                *vk = gather64(words, add64(off, V8::splat((c * 64 + k * 8) as u64)));
            }
            *coord = Fp8(v);
        }
        Self {
            x: coords[0],
            y: coords[1],
            z: coords[2],
        }
    }

    /// Store, per lane `j`, lane `j` of `self` into `tbl[idx[j]]`.
    pub fn scatter(&self, tbl: &mut [Self], idx: V8) {
        let words = ec8_words_mut(tbl);
        let off = madd52lo(LANE_IDX, idx, V8::splat(192));
        for (c, f) in [self.x, self.y, self.z].iter().enumerate() {
            for k in 0..8 {
                scatter64(words, add64(off, V8::splat((c * 64 + k * 8) as u64)), f.0[k]);
            }
        }
    }
}

impl Ec16 {
    pub fn from_g1_lanes(points: &[G1], to_proj: bool) -> Self {
        assert_eq!(points.len(), 16);
        let lo = Ec8::from_g1_lanes(&points[..8], to_proj);
        let hi = Ec8::from_g1_lanes(&points[8..], to_proj);
        Self {
            x: Fp16([lo.x, hi.x]),
            y: Fp16([lo.y, hi.y]),
            z: Fp16([lo.z, hi.z]),
        }
    }

    pub fn write_g1_lanes(&self, out: &mut [G1], from_proj: bool) {
        assert_eq!(out.len(), 16);
        let lo = Ec8 {
            x: self.x.0[0],
            y: self.y.0[0],
            z: self.z.0[0],
        };
        let hi = Ec8 {
            x: self.x.0[1],
            y: self.y.0[1],
            z: self.z.0[1],
        };
        let (a, b) = out.split_at_mut(8);
        lo.write_g1_lanes(a, from_proj);
        hi.write_g1_lanes(b, from_proj);
    }

    /// Sixteen-wide table gather, one index vector per half.
    pub fn gather(tbl: &[Self], idx: &[V8; 2]) -> Self {
        let words = ec16_words(tbl);
        let mut halves = [[Fp8::ZERO; 3]; 2];
        for (h, half) in halves.iter_mut().enumerate() {
            let off = madd52lo(LANE_IDX, idx[h], V8::splat(384));
            for (c, coord) in half.iter_mut().enumerate() {
                let mut v = [V8::ZERO; 8];
                for (k, vk) in v.iter_mut().enumerate() {
                    *vk = gather64(
                        words,
                        add64(off, V8::splat((c * 128 + h * 64 + k * 8) as u64)),
                    );
                }
                *coord = Fp8(v);
            }
        }
        Self {
            x: Fp16([halves[0][0], halves[1][0]]),
            y: Fp16([halves[0][1], halves[1][1]]),
            z: Fp16([halves[0][2], halves[1][2]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use msm512_field::fr::Fr;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::glv::LAMBDA_FR;

    fn rand_points(rng: &mut ChaCha8Rng, n: usize) -> Vec<G1> {
        (0..n).map(|_| G1::rand_from_rng(rng)).collect()
    }

    /// Points with non-trivial z coordinates.
    fn rough_points(rng: &mut ChaCha8Rng, n: usize) -> Vec<G1> {
        rand_points(rng, n)
            .into_iter()
            .map(|p| p.double() + p)
            .collect()
    }

    #[test]
    fn test_proj_add_dbl() {
        let mut rng = ChaCha8Rng::seed_from_u64(30);
        let mut p = rough_points(&mut rng, 8);
        let q = rough_points(&mut rng, 8);
        p[3] = G1::ZERO;
        let pm = Ec8::from_g1_lanes(&p, true);
        let qm = Ec8::from_g1_lanes(&q, true);

        let mut out = [G1::ZERO; 8];
        Ec8::add_proj(&pm, &qm).write_g1_lanes(&mut out, true);
        for i in 0..8 {
            assert_eq!(out[i], p[i] + q[i], "add lane {i}");
        }

        // The complete formula handles doubling and inverse lanes too.
        Ec8::add_proj(&pm, &pm).write_g1_lanes(&mut out, true);
        for i in 0..8 {
            assert_eq!(out[i], p[i].double(), "self-add lane {i}");
        }
        Ec8::add_proj(&pm, &pm.neg()).write_g1_lanes(&mut out, true);
        for i in 0..8 {
            assert_eq!(out[i], G1::ZERO, "inverse lane {i}");
        }

        Ec8::dbl_proj(&pm).write_g1_lanes(&mut out, true);
        for i in 0..8 {
            assert_eq!(out[i], p[i].double(), "dbl lane {i}");
        }
    }

    #[test]
    fn test_proj_mixed_add() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let p = rough_points(&mut rng, 8);
        let mut q = rand_points(&mut rng, 8);
        q[1] = G1::ZERO;
        q[6] = G1::ZERO;
        G1::normalize_vec(&mut q);
        let pm = Ec8::from_g1_lanes(&p, true);
        let qm = Ec8::from_g1_lanes(&q, true);
        let mut out = [G1::ZERO; 8];
        Ec8::add_proj_mixed(&pm, &qm).write_g1_lanes(&mut out, true);
        for i in 0..8 {
            assert_eq!(out[i], p[i] + q[i], "mixed lane {i}");
        }
    }

    #[test]
    fn test_jacobi_add_dbl() {
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let mut p = rough_points(&mut rng, 8);
        let q = rough_points(&mut rng, 8);
        p[5] = G1::ZERO;
        let pm = Ec8::from_g1_lanes(&p, false);
        let qm = Ec8::from_g1_lanes(&q, false);

        let mut out = [G1::ZERO; 8];
        Ec8::add_jacobi(&pm, &qm).write_g1_lanes(&mut out, false);
        for i in 0..8 {
            assert_eq!(out[i], p[i] + q[i], "jacobi add lane {i}");
        }

        Ec8::dbl_jacobi(&pm).write_g1_lanes(&mut out, false);
        for i in 0..8 {
            assert_eq!(out[i], p[i].double(), "jacobi dbl lane {i}");
        }

        // Mixed: normalized second operand (with an identity lane).
        let mut qn = q.clone();
        qn[2] = G1::ZERO;
        G1::normalize_vec(&mut qn);
        let qm = Ec8::from_g1_lanes(&qn, false);
        Ec8::add_jacobi_mixed(&pm, &qm).write_g1_lanes(&mut out, false);
        for i in 0..8 {
            assert_eq!(out[i], p[i] + qn[i], "jacobi mixed lane {i}");
        }
    }

    #[test]
    fn test_wide_jacobi_matches_narrow() {
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let mut p = rough_points(&mut rng, 16);
        let q = rough_points(&mut rng, 16);
        p[3] = G1::ZERO;
        p[12] = G1::ZERO;
        let pm = Ec16::from_g1_lanes(&p, false);
        let qm = Ec16::from_g1_lanes(&q, false);
        let mut out = [G1::ZERO; 16];
        Ec16::add_jacobi(&pm, &qm).write_g1_lanes(&mut out, false);
        for i in 0..16 {
            assert_eq!(out[i], p[i] + q[i], "wide lane {i}");
        }
        Ec16::dbl_jacobi(&pm).write_g1_lanes(&mut out, false);
        for i in 0..16 {
            assert_eq!(out[i], p[i].double(), "wide dbl lane {i}");
        }
    }

    #[test]
    fn test_mul_lambda() {
        let mut rng = ChaCha8Rng::seed_from_u64(34);
        let p = rand_points(&mut rng, 8);
        let pm = Ec8::from_g1_lanes(&p, false);
        let mut out = [G1::ZERO; 8];
        pm.mul_lambda().write_g1_lanes(&mut out, false);
        for i in 0..8 {
            assert_eq!(out[i], p[i].mul(&LAMBDA_FR), "endomorphism lane {i}");
        }
    }

    #[test]
    fn test_normalize_jacobi_vec() {
        let mut rng = ChaCha8Rng::seed_from_u64(35);
        for n in [1usize, 2, 5, 8] {
            let mut pts = Vec::new();
            let mut expect = Vec::new();
            for i in 0..n {
                let mut lanes = rough_points(&mut rng, 8);
                if i == 0 {
                    lanes[2] = G1::ZERO;
                    lanes[7] = G1::ZERO;
                }
                expect.push(lanes.clone());
                pts.push(Ec8::from_g1_lanes(&lanes, false));
            }
            normalize_jacobi_vec(&mut pts, false);
            let mut out = [G1::ZERO; 8];
            for (i, p) in pts.iter().enumerate() {
                // z must now be one (or zero on identity lanes).
                let z_mask = p.z.is_equal_all(&Fp8::ONE).0 | p.z.is_zero().0;
                assert_eq!(z_mask, 0xff);
                p.write_g1_lanes(&mut out, false);
                for j in 0..8 {
                    assert_eq!(out[j], expect[i][j], "point {i} lane {j}");
                }
            }
        }
    }

    #[test]
    fn test_gather_scatter() {
        let mut rng = ChaCha8Rng::seed_from_u64(36);
        let tbl: Vec<Ec8> = (0..17)
            .map(|_| Ec8::from_g1_lanes(&rand_points(&mut rng, 8), false))
            .collect();
        let idx = V8([0, 16, 3, 3, 9, 12, 1, 7]);
        let g = Ec8::gather(&tbl, idx);
        let mut out = [G1::ZERO; 8];
        let mut lanes = [G1::ZERO; 8];
        g.write_g1_lanes(&mut out, false);
        for (j, &ti) in idx.0.iter().enumerate() {
            tbl[ti as usize].write_g1_lanes(&mut lanes, false);
            assert_eq!(out[j], lanes[j], "gather lane {j}");
        }

        // Scattering back to the same indices restores the table lanes.
        let mut tbl2 = tbl.clone();
        g.scatter(&mut tbl2, idx);
        for (j, &ti) in idx.0.iter().enumerate() {
            let mut a = [G1::ZERO; 8];
            let mut b = [G1::ZERO; 8];
            tbl[ti as usize].write_g1_lanes(&mut a, false);
            tbl2[ti as usize].write_g1_lanes(&mut b, false);
            assert_eq!(a[j], b[j]);
        }
    }

    #[test]
    fn test_make_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(37);
        let mut pts = rand_points(&mut rng, 8);
        pts[4] = G1::ZERO;
        G1::normalize_vec(&mut pts);
        let pm = Ec8::from_g1_lanes(&pts, false);
        let mut tbl = [Ec8::ZERO_JACOBI; 17];
        Ec8::make_table(&mut tbl, &pm);
        let mut out = [G1::ZERO; 8];
        for (k, entry) in tbl.iter().enumerate() {
            entry.write_g1_lanes(&mut out, false);
            for j in 0..8 {
                let want = pts[j].mul(&Fr::from_canonical_u64(k as u64));
                assert_eq!(out[j], want, "table entry {k} lane {j}");
            }
        }
    }

    #[test]
    fn test_is_equal_jacobi_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(38);
        let p = rough_points(&mut rng, 8);
        let pm = Ec8::from_g1_lanes(&p, false);
        // Same points under a different z scaling.
        let mut pn = p.clone();
        G1::normalize_vec(&mut pn);
        let qm = Ec8::from_g1_lanes(&pn, false);
        assert_eq!(pm.is_equal_jacobi_all(&qm).0, 0xff);
        let mut r = pn.clone();
        r[4] = G1::rand_from_rng(&mut rng);
        let rm = Ec8::from_g1_lanes(&r, false);
        assert_eq!(pm.is_equal_jacobi_all(&rm).0, 0xff ^ (1 << 4));
    }
}
