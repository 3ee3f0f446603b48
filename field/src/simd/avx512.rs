//! AVX-512F + IFMA backend.
//!
//! Compiled when the build statically enables `avx512ifma`; callers that need
//! a runtime decision should probe the CPU before taking this code path.
//! `V8` has the same size and alignment as `__m512i`, so the conversions are
//! plain transmutes, as the wrapping around `__m512i` elsewhere in the
//! ecosystem does.

use core::arch::x86_64::*;
use core::mem::transmute;

use super::{M8, V8};

impl V8 {
    #[inline]
    fn get(self) -> __m512i {
        unsafe { transmute(self) }
    }

    #[inline]
    fn new(v: __m512i) -> Self {
        unsafe { transmute(v) }
    }
}

#[inline]
pub fn add64(x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_add_epi64(x.get(), y.get()) })
}

#[inline]
pub fn sub64(x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_sub_epi64(x.get(), y.get()) })
}

#[inline]
pub fn and64(x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_and_si512(x.get(), y.get()) })
}

#[inline]
pub fn or64(x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_or_si512(x.get(), y.get()) })
}

#[inline]
pub fn xor64(x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_xor_si512(x.get(), y.get()) })
}

#[inline]
pub fn shr64(x: V8, n: u32) -> V8 {
    V8::new(unsafe { _mm512_srlv_epi64(x.get(), _mm512_set1_epi64(n as i64)) })
}

#[inline]
pub fn shl64(x: V8, n: u32) -> V8 {
    V8::new(unsafe { _mm512_sllv_epi64(x.get(), _mm512_set1_epi64(n as i64)) })
}

/// `z + ((x * y) mod 2^52)` per lane, on the low 52 bits of `x` and `y`.
#[inline]
pub fn madd52lo(z: V8, x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_madd52lo_epu64(z.get(), x.get(), y.get()) })
}

/// `z + ((x * y) >> 52)` per lane, on the low 52 bits of `x` and `y`.
#[inline]
pub fn madd52hi(z: V8, x: V8, y: V8) -> V8 {
    V8::new(unsafe { _mm512_madd52hi_epu64(z.get(), x.get(), y.get()) })
}

#[inline]
pub fn eq_mask(x: V8, y: V8) -> M8 {
    M8(unsafe { _mm512_cmpeq_epu64_mask(x.get(), y.get()) })
}

#[inline]
pub fn neq_mask(x: V8, y: V8) -> M8 {
    M8(unsafe { _mm512_cmpneq_epu64_mask(x.get(), y.get()) })
}

/// Unsigned per-lane `x > y`.
#[inline]
pub fn gt_mask(x: V8, y: V8) -> M8 {
    M8(unsafe { _mm512_cmpgt_epu64_mask(x.get(), y.get()) })
}

/// Lanewise `mask ? a : b`.
#[inline]
pub fn select(mask: M8, a: V8, b: V8) -> V8 {
    V8::new(unsafe { _mm512_mask_blend_epi64(mask.0, b.get(), a.get()) })
}

/// Per-lane load `base[idx[i]]`.
#[inline]
pub fn gather64(base: &[u64], idx: V8) -> V8 {
    debug_assert!(idx.0.iter().all(|&i| (i as usize) < base.len()));
    V8::new(unsafe { _mm512_i64gather_epi64::<8>(idx.get(), base.as_ptr() as *const u8) })
}

/// Per-lane store `base[idx[i]] = v[i]`.
#[inline]
pub fn scatter64(base: &mut [u64], idx: V8, v: V8) {
    debug_assert!(idx.0.iter().all(|&i| (i as usize) < base.len()));
    unsafe { _mm512_i64scatter_epi64::<8>(base.as_mut_ptr() as *mut u8, idx.get(), v.get()) }
}

/// Transpose an 8x8 matrix of 64-bit words held in eight lane vectors.
///
/// Three stages: 64-bit unpacks, then two rounds of 128-bit block shuffles.
#[inline]
pub fn trans8x8(m: &[V8; 8]) -> [V8; 8] {
    unsafe {
        let s: [__m512i; 8] = [
            m[0].get(),
            m[1].get(),
            m[2].get(),
            m[3].get(),
            m[4].get(),
            m[5].get(),
            m[6].get(),
            m[7].get(),
        ];
        let d = [
            _mm512_unpacklo_epi64(s[0], s[1]),
            _mm512_unpackhi_epi64(s[0], s[1]),
            _mm512_unpacklo_epi64(s[2], s[3]),
            _mm512_unpackhi_epi64(s[2], s[3]),
            _mm512_unpacklo_epi64(s[4], s[5]),
            _mm512_unpackhi_epi64(s[4], s[5]),
            _mm512_unpacklo_epi64(s[6], s[7]),
            _mm512_unpackhi_epi64(s[6], s[7]),
        ];
        let s = [
            _mm512_shuffle_i64x2::<0x44>(d[0], d[2]),
            _mm512_shuffle_i64x2::<0x44>(d[1], d[3]),
            _mm512_shuffle_i64x2::<0x44>(d[4], d[6]),
            _mm512_shuffle_i64x2::<0x44>(d[5], d[7]),
            _mm512_shuffle_i64x2::<0xee>(d[0], d[2]),
            _mm512_shuffle_i64x2::<0xee>(d[1], d[3]),
            _mm512_shuffle_i64x2::<0xee>(d[4], d[6]),
            _mm512_shuffle_i64x2::<0xee>(d[5], d[7]),
        ];
        [
            V8::new(_mm512_shuffle_i64x2::<0x88>(s[0], s[2])),
            V8::new(_mm512_shuffle_i64x2::<0x88>(s[1], s[3])),
            V8::new(_mm512_shuffle_i64x2::<0xdd>(s[0], s[2])),
            V8::new(_mm512_shuffle_i64x2::<0xdd>(s[1], s[3])),
            V8::new(_mm512_shuffle_i64x2::<0x88>(s[4], s[6])),
            V8::new(_mm512_shuffle_i64x2::<0x88>(s[5], s[7])),
            V8::new(_mm512_shuffle_i64x2::<0xdd>(s[4], s[6])),
            V8::new(_mm512_shuffle_i64x2::<0xdd>(s[5], s[7])),
        ]
    }
}
