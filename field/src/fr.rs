//! Dense implementation of the BLS12-381 scalar field.
//!
//! Four 64-bit limbs, little endian, Montgomery form with `R = 2^256 mod r`,
//! always reduced. The MSM front end only ever needs to take scalars *out*
//! of Montgomery form (for the GLV split), so this mirrors [`crate::fp::Fp`]
//! at a quarter of the width.

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num::bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::arith::{adc, mac, sbb};
use crate::fp::biguint_from_limbs;

/// The group order.
///
/// ```ignore
/// r = 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001
/// ```
pub const ORDER: [u64; 4] = [
    0xffffffff00000001,
    0x53bda402fffe5bfe,
    0x3339d80809a1d805,
    0x73eda753299d7d48,
];

/// `-r^-1 mod 2^64`.
const R_INV_NEG: u64 = 0xfffffffeffffffff;

/// `r - 2`.
const ORDER_MINUS_2: [u64; 4] = [
    0xfffffffeffffffff,
    0x53bda402fffe5bfe,
    0x3339d80809a1d805,
    0x73eda753299d7d48,
];

/// `(2^256)^2 mod r`.
const R2: [u64; 4] = [
    0xc999e990f3f29c6d,
    0x2b6cedcb87925c23,
    0x05d314967254398f,
    0x0748d9d99f59ff11,
];

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Fr(pub [u64; 4]);

impl Fr {
    pub const ZERO: Self = Self([0; 4]);

    /// `2^256 mod r`, the Montgomery image of one.
    pub const ONE: Self = Self([
        0x00000001fffffffe,
        0x5884b7fa00034802,
        0x998c4fefecbc4ff5,
        0x1824b159acc5056f,
    ]);

    pub fn order() -> BigUint {
        biguint_from_limbs(&ORDER)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[inline]
    pub fn square(&self) -> Self {
        *self * *self
    }

    /// Leave Montgomery form: the canonical little-endian standard-form words.
    pub fn to_canonical_u64s(&self) -> [u64; 4] {
        mont_mul(&self.0, &[1, 0, 0, 0])
    }

    pub fn to_canonical_biguint(&self) -> BigUint {
        biguint_from_limbs(&self.to_canonical_u64s())
    }

    pub fn from_canonical_biguint(val: BigUint) -> Self {
        debug_assert!(val < Self::order());
        let mut limbs = [0u64; 4];
        for (i, d) in val.iter_u64_digits().enumerate() {
            limbs[i] = d;
        }
        Self(mont_mul(&limbs, &R2))
    }

    pub fn from_noncanonical_biguint(val: BigUint) -> Self {
        Self::from_canonical_biguint(val % Self::order())
    }

    #[inline]
    pub fn from_canonical_u64(n: u64) -> Self {
        Self(mont_mul(&[n, 0, 0, 0], &R2))
    }

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
        Some(self.pow_limbs(&ORDER_MINUS_2))
    }

    pub fn inverse(&self) -> Self {
        self.try_inverse().expect("tried to invert zero")
    }

    pub fn rand_from_rng<R: rand::Rng>(rng: &mut R) -> Self {
        use num::bigint::RandBigInt;
        Self::from_canonical_biguint(rng.gen_biguint_below(&Self::order()))
    }

    pub fn rand() -> Self {
        Self::rand_from_rng(&mut rand::rngs::OsRng)
    }
}

#[inline]
fn sub_order(a: &[u64; 4]) -> ([u64; 4], u64) {
    let mut out = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        let (d, b) = sbb(a[i], ORDER[i], borrow);
        out[i] = d;
        borrow = b;
    }
    (out, borrow)
}

/// CIOS Montgomery multiplication: `a * b * 2^-256 mod r`, reduced.
fn mont_mul(a: &[u64; 4], b: &[u64; 4]) -> [u64; 4] {
    let mut t = [0u64; 4];
    let mut t4 = 0u64;
    let mut t5: u64;
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..4 {
            let (lo, hi) = mac(t[j], a[i], b[j], carry);
            t[j] = lo;
            carry = hi;
        }
        let (s, c) = adc(t4, carry, 0);
        t4 = s;
        t5 = c;

        let m = t[0].wrapping_mul(R_INV_NEG);
        let (_, mut carry) = mac(t[0], m, ORDER[0], 0);
        for j in 1..4 {
            let (lo, hi) = mac(t[j], m, ORDER[j], carry);
            t[j - 1] = lo;
            carry = hi;
        }
        let (s, c) = adc(t4, carry, 0);
        t[3] = s;
        t4 = t5 + c;
    }
    let (reduced, borrow) = sub_order(&t);
    if t4 != 0 || borrow == 0 {
        reduced
    } else {
        t
    }
}

impl Default for Fr {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Hash for Fr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Display for Fr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_canonical_biguint(), f)
    }
}

impl Debug for Fr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.to_canonical_biguint())
    }
}

impl Neg for Fr {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.is_zero() {
            self
        } else {
            let mut out = [0u64; 4];
            let mut borrow = 0;
            for i in 0..4 {
                let (d, b) = sbb(ORDER[i], self.0[i], borrow);
                out[i] = d;
                borrow = b;
            }
            Self(out)
        }
    }
}

impl Add for Fr {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut t = [0u64; 4];
        let mut carry = 0;
        for i in 0..4 {
            let (s, c) = adc(self.0[i], rhs.0[i], carry);
            t[i] = s;
            carry = c;
        }
        let (reduced, borrow) = sub_order(&t);
        if borrow == 0 {
            Self(reduced)
        } else {
            Self(t)
        }
    }
}

impl AddAssign for Fr {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Fr {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Sub for Fr {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut t = [0u64; 4];
        let mut borrow = 0;
        for i in 0..4 {
            let (d, b) = sbb(self.0[i], rhs.0[i], borrow);
            t[i] = d;
            borrow = b;
        }
        if borrow != 0 {
            let mut carry = 0;
            for i in 0..4 {
                let (s, c) = adc(t[i], ORDER[i], carry);
                t[i] = s;
                carry = c;
            }
        }
        Self(t)
    }
}

impl SubAssign for Fr {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Fr {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(mont_mul(&self.0, &rhs.0))
    }
}

impl MulAssign for Fr {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Product for Fr {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.reduce(|acc, x| acc * x).unwrap_or(Self::ONE)
    }
}

impl Div for Fr {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.inverse()
    }
}

impl DivAssign for Fr {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
