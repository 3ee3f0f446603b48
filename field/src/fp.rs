//! Dense reference implementation of the BLS12-381 base field.
//!
//! Elements are six 64-bit limbs, little endian, in Montgomery form with
//! `R = 2^384 mod p`, always kept reduced below `p`. This is the external
//! ABI of the packed SIMD field: conversions, batched inversion and the
//! scalar fallback path all go through this type.

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use itertools::Itertools;
use num::bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::arith::{adc, mac, sbb};

/// The base field prime.
///
/// ```ignore
/// p = 0x1a0111ea397fe69a4b1ba7b6434bacd764774b84f38512bf
///     6730d2a0f6b0f6241eabfffeb153ffffb9feffffffffaaab
/// ```
pub const MODULUS: [u64; 6] = [
    0xb9feffffffffaaab,
    0x1eabfffeb153ffff,
    0x6730d2a0f6b0f624,
    0x64774b84f38512bf,
    0x4b1ba7b6434bacd7,
    0x1a0111ea397fe69a,
];

/// `-p^-1 mod 2^64`, the Montgomery reduction coefficient.
const P_INV_NEG: u64 = 0x89f3fffcfffcfffd;

/// `p - 2`, the Fermat inversion exponent.
const MODULUS_MINUS_2: [u64; 6] = [
    0xb9feffffffffaaa9,
    0x1eabfffeb153ffff,
    0x6730d2a0f6b0f624,
    0x64774b84f38512bf,
    0x4b1ba7b6434bacd7,
    0x1a0111ea397fe69a,
];

/// `(2^384)^2 mod p`, for moving values into Montgomery form.
const R2: [u64; 6] = [
    0xf4df1f341c341746,
    0x0a76e6a609d104f1,
    0x8de5476c4c95b6d5,
    0x67eb88a9939d83c0,
    0x9a793e85b519952d,
    0x11988fe592cae3aa,
];

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Fp(pub [u64; 6]);

impl Fp {
    pub const ZERO: Self = Self([0; 6]);

    /// `2^384 mod p`, the Montgomery image of one.
    pub const ONE: Self = Self([
        0x760900000002fffd,
        0xebf4000bc40c0002,
        0x5f48985753c758ba,
        0x77ce585370525745,
        0x5c071a97a256ec6d,
        0x15f65ec3fa80e493,
    ]);

    pub fn order() -> BigUint {
        biguint_from_limbs(&MODULUS)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[inline]
    pub fn square(&self) -> Self {
        *self * *self
    }

    #[inline]
    pub fn double(&self) -> Self {
        *self + *self
    }

    /// Raise to a little-endian multi-word exponent.
    pub fn pow_limbs(&self, exp: &[u64]) -> Self {
        let mut z = Self::ONE;
        for &word in exp.iter().rev() {
            for bit in (0..64).rev() {
                z = z.square();
                if (word >> bit) & 1 == 1 {
                    z *= *self;
                }
            }
        }
        z
    }

    pub fn try_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        // Fermat's little theorem; exponentiation stays in Montgomery form.
        Some(self.pow_limbs(&MODULUS_MINUS_2))
    }

    pub fn inverse(&self) -> Self {
        self.try_inverse().expect("tried to invert zero")
    }

    /// Leave Montgomery form and return the canonical integer.
    pub fn to_canonical_biguint(&self) -> BigUint {
        biguint_from_limbs(&mont_mul(&self.0, &[1, 0, 0, 0, 0, 0]))
    }

    /// Montgomery-encode a canonical integer below `p`.
    pub fn from_canonical_biguint(val: BigUint) -> Self {
        debug_assert!(val < Self::order());
        Self(mont_mul(&limbs_from_biguint(&val), &R2))
    }

    pub fn from_noncanonical_biguint(val: BigUint) -> Self {
        Self::from_canonical_biguint(val % Self::order())
    }

    #[inline]
    pub fn from_canonical_u64(n: u64) -> Self {
        Self(mont_mul(&[n, 0, 0, 0, 0, 0], &R2))
    }

    pub fn rand_from_rng<R: rand::Rng>(rng: &mut R) -> Self {
        use num::bigint::RandBigInt;
        Self::from_canonical_biguint(rng.gen_biguint_below(&Self::order()))
    }

    pub fn rand() -> Self {
        Self::rand_from_rng(&mut rand::rngs::OsRng)
    }
}

pub fn biguint_from_limbs(limbs: &[u64]) -> BigUint {
    let mut words = Vec::with_capacity(limbs.len() * 2);
    for &l in limbs {
        words.push(l as u32);
        words.push((l >> 32) as u32);
    }
    BigUint::from_slice(&words)
}

fn limbs_from_biguint(val: &BigUint) -> [u64; 6] {
    val.iter_u64_digits()
        .pad_using(6, |_| 0)
        .collect::<Vec<_>>()
        .try_into()
        .expect("value wider than six limbs")
}

/// `a - p`, with the final borrow.
#[inline]
fn sub_modulus(a: &[u64; 6]) -> ([u64; 6], u64) {
    let mut out = [0u64; 6];
    let mut borrow = 0;
    for i in 0..6 {
        let (d, b) = sbb(a[i], MODULUS[i], borrow);
        out[i] = d;
        borrow = b;
    }
    (out, borrow)
}

/// CIOS Montgomery multiplication: returns `a * b * 2^-384 mod p`, reduced.
pub(crate) fn mont_mul(a: &[u64; 6], b: &[u64; 6]) -> [u64; 6] {
    let mut t = [0u64; 6];
    let mut t6 = 0u64;
    let mut t7: u64;
    for i in 0..6 {
        let mut carry = 0;
        for j in 0..6 {
            let (lo, hi) = mac(t[j], a[i], b[j], carry);
            t[j] = lo;
            carry = hi;
        }
        let (s, c) = adc(t6, carry, 0);
        t6 = s;
        t7 = c;

        let m = t[0].wrapping_mul(P_INV_NEG);
        let (_, mut carry) = mac(t[0], m, MODULUS[0], 0);
        for j in 1..6 {
            let (lo, hi) = mac(t[j], m, MODULUS[j], carry);
            t[j - 1] = lo;
            carry = hi;
        }
        let (s, c) = adc(t6, carry, 0);
        t[5] = s;
        t6 = t7 + c;
    }
    let (reduced, borrow) = sub_modulus(&t);
    if t6 != 0 || borrow == 0 {
        reduced
    } else {
        t
    }
}

impl Default for Fp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Hash for Fp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Display for Fp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_canonical_biguint(), f)
    }
}

impl Debug for Fp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.to_canonical_biguint())
    }
}

impl Neg for Fp {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.is_zero() {
            self
        } else {
            let mut out = [0u64; 6];
            let mut borrow = 0;
            for i in 0..6 {
                let (d, b) = sbb(MODULUS[i], self.0[i], borrow);
                out[i] = d;
                borrow = b;
            }
            Self(out)
        }
    }
}

impl Add for Fp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        // Both operands are below p < 2^381, so the limb sum cannot carry out.
        let mut t = [0u64; 6];
        let mut carry = 0;
        for i in 0..6 {
            let (s, c) = adc(self.0[i], rhs.0[i], carry);
            t[i] = s;
            carry = c;
        }
        let (reduced, borrow) = sub_modulus(&t);
        if borrow == 0 {
            Self(reduced)
        } else {
            Self(t)
        }
    }
}

impl AddAssign for Fp {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Fp {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Sub for Fp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut t = [0u64; 6];
        let mut borrow = 0;
        for i in 0..6 {
            let (d, b) = sbb(self.0[i], rhs.0[i], borrow);
            t[i] = d;
            borrow = b;
        }
        if borrow != 0 {
            let mut carry = 0;
            for i in 0..6 {
                let (s, c) = adc(t[i], MODULUS[i], carry);
                t[i] = s;
                carry = c;
            }
        }
        Self(t)
    }
}

impl SubAssign for Fp {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Fp {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(mont_mul(&self.0, &rhs.0))
    }
}

impl MulAssign for Fp {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Product for Fp {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(|acc, x| acc * x).unwrap_or(Self::ONE)
    }
}

impl Div for Fp {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.inverse()
    }
}

impl DivAssign for Fp {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use num::bigint::BigUint;

    use super::*;

    #[test]
    fn test_encoding_roundtrip() -> Result<()> {
        for _ in 0..32 {
            let x = Fp::rand();
            let back = Fp::from_canonical_biguint(x.to_canonical_biguint());
            assert_eq!(x, back);
        }
        assert_eq!(Fp::ZERO.to_canonical_biguint(), BigUint::from(0u32));
        assert_eq!(Fp::ONE.to_canonical_biguint(), BigUint::from(1u32));
        Ok(())
    }

    #[test]
    fn test_field_laws() {
        for _ in 0..64 {
            let x = Fp::rand();
            let y = Fp::rand();
            let z = Fp::rand();
            assert_eq!(x + y, y + x);
            assert_eq!(x * y, y * x);
            assert_eq!((x + y) + z, x + (y + z));
            assert_eq!((x * y) * z, x * (y * z));
            assert_eq!(x * (y + z), x * y + x * z);
            assert_eq!(x * Fp::ONE, x);
            assert_eq!(x + Fp::ZERO, x);
            assert_eq!(x + (-x), Fp::ZERO);
            assert_eq!(x.square(), x * x);
            if !x.is_zero() {
                assert_eq!(x * x.inverse(), Fp::ONE);
            }
        }
    }

    #[test]
    fn test_matches_biguint_model() {
        let p = Fp::order();
        for _ in 0..64 {
            let x = Fp::rand();
            let y = Fp::rand();
            let xb = x.to_canonical_biguint();
            let yb = y.to_canonical_biguint();
            assert_eq!((x + y).to_canonical_biguint(), (&xb + &yb) % &p);
            assert_eq!((x * y).to_canonical_biguint(), (&xb * &yb) % &p);
            assert_eq!(
                (x - y).to_canonical_biguint(),
                ((&p + &xb) - &yb) % &p,
            );
        }
    }

    #[test]
    fn test_inverse_of_zero_is_none() {
        assert!(Fp::ZERO.try_inverse().is_none());
    }
}
