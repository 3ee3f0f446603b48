//! GLV scalar decomposition and windowed-NAF recoding.
//!
//! The G1 endomorphism `phi(x, y) = (beta * x, y)` acts as multiplication by
//! `lambda`, a primitive cube root of unity mod `r`. BLS12-381 has
//! `r = lambda^2 + lambda + 1`, so every scalar splits as
//! `s = a + b * lambda` with `b = floor(s / lambda)` and both halves
//! non-negative and below 2^128 — no sign bookkeeping is needed outside the
//! digit recoding.

use msm512_field::fr::Fr;
use msm512_field::simd::{
    add64, and64, gt_mask, or64, select, shl64, shr64, sub64, M8, V8,
};
use num::BigUint;

/// `lambda = 0xac45a4010001a40200000000ffffffff`, little endian.
pub const LAMBDA: [u64; 2] = [0x00000000ffffffff, 0xac45a4010001a402];

/// `lambda` as a scalar, for tests and the endomorphism laws.
pub const LAMBDA_FR: Fr = Fr([
    0x92d9090b093011d2,
    0xfc9cbd719d6aa073,
    0xc1f14ef0cd65a1a6,
    0x017f6d35e72fcdeb,
]);

/// NAF window width.
pub const NAF_WINDOW: usize = 5;
/// Digits per 128-bit scalar half.
pub const NAF_DIGITS: usize = 26;
/// Absolute-value table size: digits lie in `[-16, 16]`.
pub const NAF_TABLE: usize = 17;

/// Split a scalar into `(a, b)` with `s = a + b * lambda mod r`, both halves
/// non-negative 128-bit integers.
pub fn decompose(s: &Fr) -> ([u64; 2], [u64; 2]) {
    let k = BigUint::new(words32(&s.to_canonical_u64s()));
    let l = BigUint::new(words32(&LAMBDA));
    let b = &k / &l;
    let a = k - &b * &l;
    (to_2limbs(&a), to_2limbs(&b))
}

fn words32(limbs: &[u64]) -> Vec<u32> {
    let mut out = Vec::with_capacity(limbs.len() * 2);
    for &l in limbs {
        out.push(l as u32);
        out.push((l >> 32) as u32);
    }
    out
}

fn to_2limbs(x: &BigUint) -> [u64; 2] {
    let mut out = [0u64; 2];
    for (i, d) in x.iter_u64_digits().enumerate() {
        debug_assert!(i < 2);
        out[i] = d;
    }
    out
}

/// Extract 64 bits starting at `bit_pos` from a little-endian multi-vector
/// integer, per lane.
#[inline]
pub fn get_unit_at(x: &[V8], bit_pos: usize) -> V8 {
    let q = bit_pos / 64;
    let r = bit_pos % 64;
    if r == 0 {
        return x[q];
    }
    if q == x.len() - 1 {
        return shr64(x[q], r as u32);
    }
    or64(shr64(x[q], r as u32), shl64(x[q + 1], 64 - r as u32))
}

/// Recode eight 128-bit integers (two lane vectors, little endian) into
/// [`NAF_DIGITS`] signed window digits per lane.
///
/// Digit `i` is `idx[i]` with sign `neg[i]`; a digit above half the window
/// range is replaced by its complement and the carry propagates upward. The
/// top window cannot carry out because the inputs are below 2^128.
pub fn make_naf_tbl(idx: &mut [V8; NAF_DIGITS], neg: &mut [M8; NAF_DIGITS], a: &[V8; 2]) {
    let mask = V8::splat((1 << NAF_WINDOW) - 1);
    let full = V8::splat(1 << NAF_WINDOW);
    let half = V8::splat(1 << (NAF_WINDOW - 1));
    let one = V8::splat(1);
    let mut carry = V8::ZERO;
    let mut pos = 0;
    for i in 0..NAF_DIGITS {
        let v = add64(and64(get_unit_at(a, pos), mask), carry);
        let masked = and64(v, mask);
        let is_neg = gt_mask(masked, half);
        neg[i] = is_neg;
        idx[i] = select(is_neg, sub64(full, masked), masked);
        carry = shr64(v, NAF_WINDOW as u32);
        carry = add64(carry, select(is_neg, one, V8::ZERO));
        pos += NAF_WINDOW;
    }
}
