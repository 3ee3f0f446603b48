//! The seam between the two SIMD widths.
//!
//! Point formulas, normalization and the GLV driver are written once against
//! this trait and monomorphize to the eight- and sixteen-wide packed fields.

use core::fmt::Debug;
use core::ops::{Add, Mul, Sub};

use crate::fp::Fp;

/// A fixed number of base-field elements packed limb-major across SIMD lanes.
///
/// Invariants kept by every operation: each 52-bit limb is below 2^52 and the
/// represented value is below `p`, so raw representation equality is value
/// equality.
pub trait PackedFp:
    'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Copy
    + Clone
    + Debug
    + Send
    + Sync
{
    const WIDTH: usize;

    /// Per-lane predicate produced by the comparison operations.
    type Mask: Copy + Clone + Debug;

    const ZERO: Self;
    const ONE: Self;

    fn square(&self) -> Self;
    fn double(&self) -> Self;
    fn neg(&self) -> Self;

    /// Multiply every lane by the same packed-Montgomery constant given as
    /// eight 52-bit words.
    fn mul_by_words(&self, k: &[u64; 8]) -> Self;

    /// Lanewise `mask ? a : b`.
    fn select(mask: Self::Mask, a: Self, b: Self) -> Self;

    /// Overwrite the lanes selected by `mask` with the lanes of `x`.
    fn cset(&mut self, mask: Self::Mask, x: Self);

    fn is_zero(&self) -> Self::Mask;
    fn is_equal_all(&self, rhs: &Self) -> Self::Mask;
    fn mask_and(a: Self::Mask, b: Self::Mask) -> Self::Mask;

    /// Lanewise inverse, amortized over all lanes through one dense batched
    /// inversion. Zero lanes stay zero.
    fn inverse(&self) -> Self;

    /// Pack `WIDTH` dense elements (gather, reslice to 52-bit limbs, move
    /// into the wide Montgomery domain).
    fn from_fp_lanes(lanes: &[Fp]) -> Self;

    /// Inverse of [`PackedFp::from_fp_lanes`].
    fn write_fp_lanes(&self, out: &mut [Fp]);
}
