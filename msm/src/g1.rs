//! Reference implementation of the BLS12-381 G1 group.
//!
//! Points are Jacobian `(X : Y : Z)` over the dense base field: the affine
//! point is `(X/Z^2, Y/Z^3)` and `z = 0` marks the identity. This is the
//! scalar fallback path of the engine (residual tails, final reductions) and
//! the oracle the packed paths are tested against. The `#[repr(C)]` layout
//! is load-bearing: the packed conversions view a `&[G1]` as 18 words per
//! point and gather coordinates by stride.

use std::ops::{Add, AddAssign, Neg};

use msm512_field::fp::Fp;
use msm512_field::fr::Fr;
use msm512_field::inversion::batch_multiplicative_inverse;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

/// The curve constant `b = 4`, Montgomery form.
pub const B: Fp = Fp([
    0xaa270000000cfff3,
    0x53cc0032fc34000a,
    0x478fe97a6b0a807f,
    0xb1d37ebee6ba24d7,
    0x8ec9733bbf78ab2f,
    0x09d645513d83de7e,
]);

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[repr(C)]
pub struct G1 {
    pub x: Fp,
    pub y: Fp,
    pub z: Fp,
}

const_assert_eq!(core::mem::size_of::<G1>(), 18 * 8);

impl G1 {
    pub const ZERO: Self = Self {
        x: Fp::ONE,
        y: Fp::ONE,
        z: Fp::ZERO,
    };

    /// The standard generator.
    pub const GENERATOR: Self = Self {
        x: Fp([
            0x5cb38790fd530c16,
            0x7817fc679976fff5,
            0x154f95c7143ba1c1,
            0xf0ae6acdf3d0e747,
            0xedce6ecc21dbf440,
            0x120177419e0bfb75,
        ]),
        y: Fp([
            0xbaac93d50ce72271,
            0x8c22631a7918fd8e,
            0xdd595f13570725ce,
            0x51ac582950405194,
            0x0e1c8c3fad0059c0,
            0x0bbc3efc5008a26a,
        ]),
        z: Fp::ONE,
    };

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.z.is_zero()
    }

    /// Whether the point satisfies `y^2 = x^3 + 4 z^6` (or is the identity).
    pub fn is_valid(&self) -> bool {
        if self.is_zero() {
            return true;
        }
        let z2 = self.z.square();
        let z6 = z2.square() * z2;
        self.y.square() == self.x.square() * self.x + B * z6
    }

    /// Doubling; `a = 0` Jacobian formula (3M + 4S), matching the packed
    /// schedule limb for limb.
    #[must_use]
    pub fn double(&self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        let x2 = self.x.square();
        let y2 = self.y.square();
        let xy = (self.x * y2).double().double(); // 4xy^2
        let y4 = y2.square();
        let w = x2.double() + x2; // 3x^2
        let x3 = w.square() - xy.double();
        let z3 = (self.y * self.z).double();
        let y3 = (xy - x3) * w - y4.double().double().double();
        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Scalar multiplication by double-and-add over the canonical bits.
    #[must_use]
    pub fn mul(&self, k: &Fr) -> Self {
        let words = k.to_canonical_u64s();
        let mut acc = Self::ZERO;
        for i in (0..256).rev() {
            acc = acc.double();
            if (words[i / 64] >> (i % 64)) & 1 == 1 {
                acc += *self;
            }
        }
        acc
    }

    /// Scale to `z = 1` (identity becomes the canonical zero point).
    pub fn normalize(&mut self) {
        if self.is_zero() {
            *self = Self::ZERO;
            return;
        }
        let zi = self.z.inverse();
        let zi2 = zi.square();
        self.x *= zi2;
        self.y *= zi2 * zi;
        self.z = Fp::ONE;
    }

    /// Normalize a whole slice with a single inversion.
    pub fn normalize_vec(points: &mut [G1]) {
        let zs: Vec<Fp> = points.iter().map(|p| p.z).collect();
        let inv = batch_multiplicative_inverse(&zs);
        for (p, zi) in points.iter_mut().zip(inv) {
            if p.is_zero() {
                *p = Self::ZERO;
            } else {
                let zi2 = zi.square();
                p.x *= zi2;
                p.y *= zi2 * zi;
                p.z = Fp::ONE;
            }
        }
    }

    /// A deterministic non-identity point derived from a seed; used by tests
    /// and benches to stand in points with unknown discrete logs.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut key = [0u8; 32];
        for (i, &b) in seed.iter().enumerate() {
            key[i % 32] ^= b;
        }
        let mut rng = ChaCha8Rng::from_seed(key);
        loop {
            let k = Fr::rand_from_rng(&mut rng);
            if !k.is_zero() {
                let p = Self::GENERATOR.mul(&k);
                debug_assert!(p.is_valid());
                return p;
            }
        }
    }

    /// A deterministic scalar companion to [`G1::from_seed`].
    pub fn scalar_from_seed(seed: &[u8]) -> Fr {
        let mut key = [0u8; 32];
        key[0] = 0x5a;
        for (i, &b) in seed.iter().enumerate() {
            key[(i + 1) % 32] ^= b;
        }
        Fr::rand_from_rng(&mut ChaCha8Rng::from_seed(key))
    }

    pub fn rand_from_rng<R: rand::Rng>(rng: &mut R) -> Self {
        loop {
            let k = Fr::rand_from_rng(rng);
            if !k.is_zero() {
                return Self::GENERATOR.mul(&k);
            }
        }
    }
}

impl Default for G1 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for G1 {
    fn eq(&self, other: &Self) -> bool {
        if self.is_zero() || other.is_zero() {
            return self.is_zero() == other.is_zero();
        }
        // Compare cross-multiplied Jacobian coordinates to avoid inversions.
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        self.x * z2z2 == other.x * z1z1
            && self.y * z2z2 * other.z == other.y * z1z1 * self.z
    }
}

impl Eq for G1 {}

impl Add for G1 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let z1z1 = self.z.square();
        let z2z2 = rhs.z.square();
        let u1 = self.x * z2z2;
        let u2 = rhs.x * z1z1;
        let s1 = self.y * z2z2 * rhs.z;
        let s2 = rhs.y * z1z1 * self.z;

        if u1 == u2 {
            if s1 == s2 {
                return self.double();
            }
            return Self::ZERO;
        }

        // Same schedule as the packed Jacobian add (12M + 4S).
        let h = u2 - u1;
        let r = s2 - s1;
        let h2 = h.square();
        let h3 = h2 * h;
        let u1h2 = u1 * h2;
        let x3 = r.square() - h3 - u1h2.double();
        let y3 = r * (u1h2 - x3) - s1 * h3;
        let z3 = self.z * rhs.z * h;
        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }
}

impl AddAssign for G1 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Neg for G1 {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_generator_is_valid() {
        assert!(G1::GENERATOR.is_valid());
        assert!(G1::ZERO.is_valid());
    }

    #[test]
    fn test_group_laws() -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        for _ in 0..8 {
            let p = G1::rand_from_rng(&mut rng);
            let q = G1::rand_from_rng(&mut rng);
            let r = G1::rand_from_rng(&mut rng);
            assert!(p.is_valid());
            assert_eq!(p + q, q + p);
            assert_eq!((p + q) + r, p + (q + r));
            assert_eq!(p + G1::ZERO, p);
            assert_eq!(G1::ZERO + p, p);
            assert_eq!(p + (-p), G1::ZERO);
            assert_eq!(p + p, p.double());
            assert!((p + q).is_valid());
        }
        Ok(())
    }

    #[test]
    fn test_mul() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let p = G1::rand_from_rng(&mut rng);
        assert_eq!(p.mul(&Fr::ZERO), G1::ZERO);
        assert_eq!(p.mul(&Fr::ONE), p);
        assert_eq!(p.mul(&Fr::from_canonical_u64(5)), p + p + p + p + p);
        let a = Fr::rand_from_rng(&mut rng);
        let b = Fr::rand_from_rng(&mut rng);
        assert_eq!(p.mul(&a) + p.mul(&b), p.mul(&(a + b)));
    }

    #[test]
    fn test_normalize() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut pts: Vec<G1> = (0..13).map(|_| G1::rand_from_rng(&mut rng)).collect();
        // Give them non-trivial z by doubling.
        for p in pts.iter_mut() {
            *p = p.double() + *p;
        }
        pts[4] = G1::ZERO;
        pts[9] = G1::ZERO;
        let expect = pts.clone();
        G1::normalize_vec(&mut pts);
        for (p, e) in pts.iter().zip(&expect) {
            assert!(p.z.is_zero() || p.z == Fp::ONE);
            assert_eq!(p, e);
        }
    }

    #[test]
    fn test_from_seed_deterministic() {
        let p = G1::from_seed(b"abc");
        let q = G1::from_seed(b"abc");
        assert_eq!(p, q);
        assert!(p.is_valid());
        assert_ne!(p, G1::from_seed(b"abd"));
    }
}
