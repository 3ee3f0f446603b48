//! Eight base-field elements packed limb-major into eight lane vectors.
//!
//! Arithmetic is Montgomery arithmetic in radix 2^52 with `R = 2^416 mod p`:
//! eight 52-bit limbs leave twelve bits of headroom per 64-bit lane, which is
//! what lets the multiplier defer carry propagation to a single sweep at the
//! end of the reduction. Moving between this domain and the dense 2^64-radix
//! Montgomery domain is a single multiplication by a precomputed constant.

use unroll::unroll_for_loops;

use crate::fp::Fp;
use crate::inversion::batch_multiplicative_inverse;
use crate::packed::PackedFp;
use crate::radix52::{concat_52, split_52, FP_PICKUP, MASK52};
use crate::simd::{
    add64, and64, eq_mask, gather64, madd52hi, madd52lo, neq_mask, or64, scatter64, select, shr64,
    sub64, xor64, LANE_IDX, M8, V8,
};

/// The prime in 52-bit limbs.
pub(crate) const P52: [u64; 8] = [
    0xeffffffffaaab,
    0xfeb153ffffb9f,
    0x6b0f6241eabff,
    0x12bf6730d2a0f,
    0x764774b84f385,
    0x1ba7b6434bacd,
    0x1ea397fe69a4b,
    0x000000001a011,
];

/// `-p^-1 mod 2^52`.
const RP52: u64 = 0x3fffcfffcfffd;

/// `2^416 mod p`: the packed-Montgomery image of one.
const ONE52: [u64; 8] = [
    0x6480ea8e9b9af,
    0x65766c8fe444f,
    0x8b540fea96f7d,
    0x3b2ee82efd422,
    0xa6723e5f0ade5,
    0xff6eb6fdd4230,
    0xe06ef23c24a25,
    0x0000000014c8e,
];

/// `2^448 mod p`: multiplying by this moves a dense-Montgomery value (radix
/// 2^64, `R = 2^384`) into the packed domain.
const M64TO52: [u64; 8] = [
    0x7fde37dba9366,
    0x4e27525bc342b,
    0x1f5b1e9778489,
    0xb872b2b91b9dc,
    0xb206f497dfcaf,
    0x4137cc89a9b0b,
    0xd9d20d7e39959,
    0x000000000411c,
];

/// `2^384 mod p`: the way back out.
const M52TO64: [u64; 8] = [
    0x900000002fffd,
    0x0bc40c0002760,
    0x3c758baebf400,
    0x57455f4898575,
    0xd77ce58537052,
    0x071a97a256ec6,
    0xec3fa80e4935c,
    0x0000000015f65,
];

const fn splat_limbs(k: [u64; 8]) -> [V8; 8] {
    [
        V8::splat(k[0]),
        V8::splat(k[1]),
        V8::splat(k[2]),
        V8::splat(k[3]),
        V8::splat(k[4]),
        V8::splat(k[5]),
        V8::splat(k[6]),
        V8::splat(k[7]),
    ]
}

const P52V: [V8; 8] = splat_limbs(P52);
const MASKV: V8 = V8::splat(MASK52);
const RPV: V8 = V8::splat(RP52);

/// Eight packed base-field elements; `self.0[j]` holds limb `j` of all lanes.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct Fp8(pub [V8; 8]);

impl core::fmt::Debug for Fp8 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut lanes = [Fp::ZERO; 8];
        self.write_fp_lanes(&mut lanes);
        f.debug_list().entries(lanes.iter()).finish()
    }
}

// Carry-save addition of 52-bit limb vectors; the top limb keeps its carry.
#[inline]
#[unroll_for_loops]
fn vadd_pre(z: &mut [V8; 8], x: &[V8; 8], y: &[V8; 8]) {
    let mut t = add64(x[0], y[0]);
    let mut c = shr64(t, 52);
    z[0] = and64(t, MASKV);
    for i in 1..7 {
        t = add64(add64(x[i], y[i]), c);
        c = shr64(t, 52);
        z[i] = and64(t, MASKV);
    }
    z[7] = add64(add64(x[7], y[7]), c);
}

// Borrow-propagating subtraction; the returned mask flags lanes that
// underflowed.
#[inline]
#[unroll_for_loops]
fn vsub_pre(z: &mut [V8; 8], x: &[V8; 8], y: &[V8; 8]) -> M8 {
    let mut t = sub64(x[0], y[0]);
    let mut c = shr64(t, 63);
    z[0] = and64(t, MASKV);
    for i in 1..8 {
        t = sub64(sub64(x[i], y[i]), c);
        c = shr64(t, 63);
        z[i] = and64(t, MASKV);
    }
    neq_mask(c, V8::ZERO)
}

#[inline]
fn vselect(c: M8, a: &[V8; 8], b: &[V8; 8]) -> [V8; 8] {
    let mut z = [V8::ZERO; 8];
    for i in 0..8 {
        z[i] = select(c, a[i], b[i]);
    }
    z
}

#[inline]
fn vadd(x: &[V8; 8], y: &[V8; 8]) -> [V8; 8] {
    let mut s = [V8::ZERO; 8];
    vadd_pre(&mut s, x, y);
    let mut t = [V8::ZERO; 8];
    let c = vsub_pre(&mut t, &s, &P52V);
    vselect(c, &s, &t)
}

#[inline]
fn vsub(x: &[V8; 8], y: &[V8; 8]) -> [V8; 8] {
    let mut s = [V8::ZERO; 8];
    let c = vsub_pre(&mut s, x, y);
    let mut t = [V8::ZERO; 8];
    vadd_pre(&mut t, &s, &P52V);
    t[7] = and64(t[7], MASKV);
    vselect(c, &t, &s)
}

// t[0..=8] = x * y_limb, carry-save.
#[inline]
#[unroll_for_loops]
fn vmul_unit(t: &mut [V8], x: &[V8; 8], y: V8) {
    t[0] = madd52lo(V8::ZERO, x[0], y);
    let mut h = madd52hi(V8::ZERO, x[0], y);
    for i in 1..8 {
        t[i] = madd52lo(h, x[i], y);
        h = madd52hi(V8::ZERO, x[i], y);
    }
    t[8] = h;
}

// z[0..8] += x * y_limb; the final high part is returned instead of being
// folded into z[8].
#[inline]
#[unroll_for_loops]
fn vmul_unit_add(z: &mut [V8], x: &[V8; 8], y: V8) -> V8 {
    let mut v = x[0];
    z[0] = madd52lo(z[0], v, y);
    let mut h = madd52hi(z[1], v, y);
    for i in 1..7 {
        v = x[i];
        z[i] = madd52lo(h, v, y);
        h = madd52hi(z[i + 1], v, y);
    }
    v = x[7];
    z[7] = madd52lo(h, v, y);
    madd52hi(V8::ZERO, v, y)
}

// Montgomery multiplication, interleaving one row of the schoolbook product
// with one reduction round. Carries are swept once at the end.
#[unroll_for_loops]
fn vmul(x: &[V8; 8], y: &[V8; 8]) -> [V8; 8] {
    let mut t = [V8::ZERO; 16];
    vmul_unit(&mut t, x, y[0]);
    let mut q = madd52lo(V8::ZERO, t[0], RPV);
    let mut h = vmul_unit_add(&mut t, &P52V, q);
    t[8] = add64(t[8], h);
    for i in 1..8 {
        h = vmul_unit_add(&mut t[i..], x, y[i]);
        t[8 + i] = h;
        t[i] = add64(t[i], shr64(t[i - 1], 52));
        q = madd52lo(V8::ZERO, t[i], RPV);
        h = vmul_unit_add(&mut t[i..], &P52V, q);
        t[8 + i] = add64(t[8 + i], h);
    }
    for i in 8..16 {
        t[i] = add64(t[i], shr64(t[i - 1], 52));
        t[i - 1] = and64(t[i - 1], MASKV);
    }
    let hi: &[V8; 8] = t[8..16].try_into().unwrap();
    let mut z = [V8::ZERO; 8];
    let c = vsub_pre(&mut z, hi, &P52V);
    vselect(c, hi, &z)
}

// Squaring: off-diagonal products accumulated once, doubled in one pass,
// diagonal terms folded in, then the same reduction as `vmul`.
fn vsqr(x: &[V8; 8]) -> [V8; 8] {
    let mut t = [V8::ZERO; 16];
    t[0] = madd52lo(V8::ZERO, x[0], x[0]);
    for i in 1..8 {
        t[2 * i - 1] = madd52lo(V8::ZERO, x[i], x[i - 1]);
        t[2 * i] = madd52hi(V8::ZERO, x[i], x[i - 1]);
    }
    for i in 2..8 {
        for j in i..8 {
            t[2 * j - i] = madd52lo(t[2 * j - i], x[j], x[j - i]);
            t[2 * j - i + 1] = madd52hi(t[2 * j - i + 1], x[j], x[j - i]);
        }
    }
    for i in 1..15 {
        t[i] = add64(t[i], t[i]);
    }
    for i in 1..8 {
        t[2 * i - 1] = madd52hi(t[2 * i - 1], x[i - 1], x[i - 1]);
        t[2 * i] = madd52lo(t[2 * i], x[i], x[i]);
    }
    t[15] = madd52hi(V8::ZERO, x[7], x[7]);

    for i in 0..8 {
        if i > 0 {
            t[i] = add64(t[i], shr64(t[i - 1], 52));
        }
        let q = madd52lo(V8::ZERO, t[i], RPV);
        let h = vmul_unit_add(&mut t[i..], &P52V, q);
        t[8 + i] = add64(t[8 + i], h);
    }
    for i in 8..16 {
        t[i] = add64(t[i], shr64(t[i - 1], 52));
        t[i - 1] = and64(t[i - 1], MASKV);
    }
    let hi: &[V8; 8] = t[8..16].try_into().unwrap();
    let mut z = [V8::ZERO; 8];
    let c = vsub_pre(&mut z, hi, &P52V);
    vselect(c, hi, &z)
}

#[inline]
fn fp_words(lanes: &[Fp]) -> &[u64] {
    // Fp is a transparent [u64; 6].
    unsafe { core::slice::from_raw_parts(lanes.as_ptr().cast::<u64>(), lanes.len() * 6) }
}

#[inline]
fn fp_words_mut(lanes: &mut [Fp]) -> &mut [u64] {
    unsafe { core::slice::from_raw_parts_mut(lanes.as_mut_ptr().cast::<u64>(), lanes.len() * 6) }
}

#[inline]
fn fp8_words(tbl: &[Fp8]) -> &[u64] {
    unsafe { core::slice::from_raw_parts(tbl.as_ptr().cast::<u64>(), tbl.len() * 64) }
}

impl Fp8 {
    /// Pack six dense-limb vectors (one dense limb of all lanes per vector)
    /// into a packed element, moving into the wide Montgomery domain.
    #[inline]
    pub fn from_dense_vectors(t: &[V8; 6]) -> Self {
        Self(split_52(t)).mul_by_words(&M64TO52)
    }

    /// Inverse of [`Fp8::from_dense_vectors`].
    #[inline]
    pub fn to_dense_vectors(&self) -> [V8; 6] {
        concat_52(&self.mul_by_words(&M52TO64).0)
    }

    /// Fixed-window exponentiation by per-lane little-endian exponents.
    ///
    /// Window width four; the sixteen-entry table is fetched by a per-lane
    /// gather keyed on the exponent bits.
    pub fn pow(&self, exp: &[V8]) -> Self {
        let mut tbl = [Self::ZERO; 16];
        tbl[0] = Self::ONE;
        tbl[1] = *self;
        for i in 2..16 {
            tbl[i] = tbl[i - 1] * *self;
        }
        let words = fp8_words(&tbl);
        let mask = V8::splat(0xf);
        let mut z = tbl[0];
        for i in (0..exp.len()).rev() {
            let w = exp[i];
            for j in 0..16 {
                for _ in 0..4 {
                    z = z.square();
                }
                let idx = and64(shr64(w, (60 - 4 * j) as u32), mask);
                let off = madd52lo(LANE_IDX, idx, V8::splat(64));
                let mut g = [V8::ZERO; 8];
                for k in 0..8 {
                    g[k] = gather64(words, add64(off, V8::splat((k * 8) as u64)));
                }
                z = z * Self(g);
            }
        }
        z
    }
}

impl core::ops::Add for Fp8 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(vadd(&self.0, &rhs.0))
    }
}

impl core::ops::Sub for Fp8 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(vsub(&self.0, &rhs.0))
    }
}

impl core::ops::Mul for Fp8 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(vmul(&self.0, &rhs.0))
    }
}

impl PackedFp for Fp8 {
    const WIDTH: usize = 8;

    type Mask = M8;

    const ZERO: Self = Self([V8::ZERO; 8]);
    const ONE: Self = Self(splat_limbs(ONE52));

    #[inline]
    fn square(&self) -> Self {
        Self(vsqr(&self.0))
    }

    #[inline]
    fn double(&self) -> Self {
        *self + *self
    }

    #[inline]
    fn neg(&self) -> Self {
        Self::ZERO - *self
    }

    #[inline]
    fn mul_by_words(&self, k: &[u64; 8]) -> Self {
        Self(vmul(&self.0, &splat_limbs(*k)))
    }

    #[inline]
    fn select(mask: M8, a: Self, b: Self) -> Self {
        Self(vselect(mask, &a.0, &b.0))
    }

    #[inline]
    fn cset(&mut self, mask: M8, x: Self) {
        *self = Self::select(mask, x, *self);
    }

    #[inline]
    fn is_zero(&self) -> M8 {
        let mut acc = self.0[0];
        for i in 1..8 {
            acc = or64(acc, self.0[i]);
        }
        eq_mask(acc, V8::ZERO)
    }

    #[inline]
    fn is_equal_all(&self, rhs: &Self) -> M8 {
        let mut acc = xor64(self.0[0], rhs.0[0]);
        for i in 1..8 {
            acc = or64(acc, xor64(self.0[i], rhs.0[i]));
        }
        eq_mask(acc, V8::ZERO)
    }

    #[inline]
    fn mask_and(a: M8, b: M8) -> M8 {
        a.and(b)
    }

    fn inverse(&self) -> Self {
        let mut lanes = [Fp::ZERO; 8];
        self.write_fp_lanes(&mut lanes);
        let inv = batch_multiplicative_inverse(&lanes);
        Self::from_fp_lanes(&inv)
    }

    fn from_fp_lanes(lanes: &[Fp]) -> Self {
        assert_eq!(lanes.len(), 8);
        let words = fp_words(lanes);
        let mut t = [V8::ZERO; 6];
        for j in 0..6 {
            t[j] = gather64(words, add64(FP_PICKUP, V8::splat(j as u64)));
        }
        Self::from_dense_vectors(&t)
    }

    fn write_fp_lanes(&self, out: &mut [Fp]) {
        assert_eq!(out.len(), 8);
        let t = self.to_dense_vectors();
        let words = fp_words_mut(out);
        for j in 0..6 {
            scatter64(words, add64(FP_PICKUP, V8::splat(j as u64)), t[j]);
        }
    }
}
