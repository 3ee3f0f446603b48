//! Reslicing between the dense 6x64-bit limb layout and the packed 8x52-bit
//! layout, applied to eight elements at a time (one limb of all eight lanes
//! per vector).

use crate::simd::{and64, or64, shl64, shr64, V8};

pub const MASK52: u64 = (1 << 52) - 1;

/// Byte-lane offsets (in `u64` units) of the eight `Fp` values in a
/// contiguous `[Fp; 8]`.
pub const FP_PICKUP: V8 = V8([0, 6, 12, 18, 24, 30, 36, 42]);

/// Offsets of the eight `G1` points in a contiguous `[G1; 8]`
/// (each point is three coordinates of six words).
pub const G1_PICKUP: V8 = V8([0, 18, 36, 54, 72, 90, 108, 126]);

/// Reslice 384 bits held as six 64-bit limbs into eight 52-bit limbs.
///
/// The limb boundaries:
///
/// ```text
///  x |52:12|40:24|28:36|16:48|4:52:8|44:20|
///  y |52|52|52|52|52|52|52|20|
/// ```
#[inline]
pub fn split_52(x: &[V8; 6]) -> [V8; 8] {
    let m = V8::splat(MASK52);
    [
        and64(x[0], m),
        and64(or64(shr64(x[0], 52), shl64(x[1], 12)), m),
        and64(or64(shr64(x[1], 40), shl64(x[2], 24)), m),
        and64(or64(shr64(x[2], 28), shl64(x[3], 36)), m),
        and64(or64(shr64(x[3], 16), shl64(x[4], 48)), m),
        and64(shr64(x[4], 4), m),
        and64(or64(shr64(x[4], 56), shl64(x[5], 8)), m),
        shr64(x[5], 44),
    ]
}

/// Inverse of [`split_52`]: concatenate eight 52-bit limbs back into six
/// 64-bit limbs. Requires every input limb to be below 2^52.
#[inline]
pub fn concat_52(x: &[V8; 8]) -> [V8; 6] {
    [
        or64(x[0], shl64(x[1], 52)),
        or64(shr64(x[1], 12), shl64(x[2], 40)),
        or64(shr64(x[2], 24), shl64(x[3], 28)),
        or64(shr64(x[3], 36), shl64(x[4], 16)),
        or64(or64(shr64(x[4], 48), shl64(x[5], 4)), shl64(x[6], 56)),
        or64(shr64(x[6], 8), shl64(x[7], 44)),
    ]
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rand::Rng;

    use super::*;

    #[test]
    fn test_split_concat_roundtrip() {
        let mut rng = OsRng;
        for _ in 0..100 {
            let mut x = [V8::ZERO; 6];
            for limb in x.iter_mut() {
                for lane in limb.0.iter_mut() {
                    *lane = rng.gen();
                }
            }
            let y = split_52(&x);
            for limb in &y {
                for &lane in &limb.0 {
                    assert!(lane <= MASK52);
                }
            }
            assert_eq!(concat_52(&y), x);
        }
    }

    #[test]
    fn test_split_bit_positions() {
        // Bit k of the 384-bit value must land in limb k / 52, bit k % 52.
        for k in [0usize, 51, 52, 103, 207, 255, 331, 383] {
            let mut x = [V8::ZERO; 6];
            x[k / 64].0[3] = 1 << (k % 64);
            let y = split_52(&x);
            for (j, limb) in y.iter().enumerate() {
                for (lane, &v) in limb.0.iter().enumerate() {
                    let expect = if lane == 3 && j == k / 52 {
                        1 << (k % 52)
                    } else {
                        0
                    };
                    assert_eq!(v, expect, "bit {k} limb {j} lane {lane}");
                }
            }
        }
    }
}
