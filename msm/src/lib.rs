//! Multi-scalar multiplication over BLS12-381 G1.
//!
//! The engine packs eight (or sixteen) points into structure-of-arrays lane
//! vectors of 52-bit field limbs, splits every scalar with the GLV
//! endomorphism, and runs a windowed bucket accumulation. The SIMD layer
//! compiles to AVX-512 IFMA when the build enables it and to a portable
//! software model otherwise; semantics are identical either way.
//!
//! Entry points: [`mul_vec`] (`sum s_i * P_i`), [`mul_each`]
//! (`P_i <- s_i * P_i`), and the rayon-backed [`mul_vec_mt`] behind the
//! default-on `parallel` feature.

#![allow(clippy::needless_range_loop)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod g1;
pub mod glv;
pub mod mul_each;
pub mod pippenger;
pub mod point;

pub use g1::G1;
pub use msm512_field::fp::Fp;
pub use msm512_field::fr::Fr;
pub use mul_each::mul_each;
#[cfg(feature = "parallel")]
pub use pippenger::mul_vec_mt;
pub use pippenger::{mul_vec, mul_vec_with_bucket_width};

/// Whether this build runs on the AVX-512 IFMA fast path: the backend must
/// have been selected at compile time *and* the CPU must advertise the
/// feature. The portable backend makes the engine total either way, so this
/// is a performance probe, not a precondition.
pub fn is_accelerated() -> bool {
    #[cfg(all(target_arch = "x86_64", target_feature = "avx512ifma"))]
    {
        is_x86_feature_detected!("avx512ifma")
    }
    #[cfg(not(all(target_arch = "x86_64", target_feature = "avx512ifma")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_probe_does_not_panic() {
        let _ = super::is_accelerated();
    }
}
