//! Batched field inversion.

use crate::fp::Fp;

/// Invert a slice of field elements at the cost of a single inversion plus
/// `3n` multiplications (Montgomery's trick).
///
/// Zero inputs are passed through as zero; they are substituted by one inside
/// the product chain so the remaining lanes still amortize correctly. This is
/// what lets the packed point normalization feed identity lanes straight in.
pub fn batch_multiplicative_inverse(x: &[Fp]) -> Vec<Fp> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }

    // Cumulative products with zeros replaced by one.
    let mut prods = Vec::with_capacity(n);
    let mut acc = Fp::ONE;
    for &xi in x {
        prods.push(acc);
        if !xi.is_zero() {
            acc *= xi;
        }
    }

    // One inversion, then walk backward peeling one factor per step.
    let mut inv = acc.inverse();
    let mut out = vec![Fp::ZERO; n];
    for i in (0..n).rev() {
        if x[i].is_zero() {
            continue;
        }
        out[i] = inv * prods[i];
        inv *= x[i];
    }
    out
}
