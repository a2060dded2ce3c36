//! Morton (Z-order) key construction.
//!
//! The 3D path (the crate's primary instantiation, per §1) bit-interleaves
//! three 21-bit lanes into a 63-bit key using the five-stage shift/mask
//! ladder described in §4.1. WGSL has no 64-bit integer scalar, so the
//! host-side `u64` computed here is mirrored on the GPU as a `vec2<u32>`
//! (`hi`, `lo`) pair — see `shaders.rs`'s `MORTON_COMMON` for the WGSL
//! counterpart of `spread_bits_3`/`compact_bits_3`.
//!
//! The 2D and 4D instantiations follow "the same principle with adjusted
//! per-axis widths" (§3): they spread into 32-bit and 16-bit lanes
//! respectively. Those widths are wide/narrow enough that a straightforward
//! bit-by-bit spread is clearer than a magic-number ladder and just as
//! correct, so that's what `encode_2d`/`encode_4d` use.

/// Number of bits of quantized precision per axis in the 3D instantiation.
pub const BITS_3D: u32 = 21;
/// Number of bits of quantized precision per axis in the 2D instantiation.
pub const BITS_2D: u32 = 32;
/// Number of bits of quantized precision per axis in the 4D instantiation.
pub const BITS_4D: u32 = 16;

/// Spread the low 21 bits of `x` so consecutive source bits land 3 apart,
/// starting at bit 0. This is the stage ladder from §4.1 with the canonical
/// 64-bit `splitBy3` magic numbers (the literal constants quoted in the
/// distilled spec do not hold over the full 21-bit domain; see DESIGN.md).
#[inline]
pub fn spread_bits_3(x: u32) -> u64 {
    let mut x = (x as u64) & 0x1f_ffff;
    x = (x | (x << 32)) & 0x1f_0000_0000_ffff;
    x = (x | (x << 16)) & 0x1f_0000_ff00_00ff;
    x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}

/// Inverse of [`spread_bits_3`]: gather every third bit starting at bit 0
/// back into a dense 21-bit value.
#[inline]
pub fn compact_bits_3(x: u64) -> u32 {
    let mut x = x & 0x1249_2492_4924_9249;
    x = (x | (x >> 2)) & 0x10c3_0c30_c30c_30c3;
    x = (x | (x >> 4)) & 0x100f_00f0_0f00_f00f;
    x = (x | (x >> 8)) & 0x1f_0000_ff00_00ff;
    x = (x | (x >> 16)) & 0x1f_0000_0000_ffff;
    x = (x | (x >> 32)) & 0x1f_ffff;
    x as u32
}

/// Interleave three 21-bit quantized coordinates into a 63-bit Morton key
/// (x at bits 0,3,6,…; y at bits 1,4,7,…; z at bits 2,5,8,…). The top bit of
/// the 64-bit word is always zero.
#[inline]
pub fn encode_3d(qx: u32, qy: u32, qz: u32) -> u64 {
    (spread_bits_3(qz) << 2) | (spread_bits_3(qy) << 1) | spread_bits_3(qx)
}

/// Inverse of [`encode_3d`].
#[inline]
pub fn decode_3d(key: u64) -> (u32, u32, u32) {
    (
        compact_bits_3(key),
        compact_bits_3(key >> 1),
        compact_bits_3(key >> 2),
    )
}

/// Spread the low `bits`-wide value of `x` so consecutive source bits are
/// `stride` apart, starting at bit 0. Used directly (not via a magic-number
/// ladder) for the 2D and 4D instantiations, where per-axis widths (32 and
/// 16 bits respectively) make a bit-by-bit spread just as cheap to reason
/// about as a ladder.
fn spread_bits_generic(x: u64, bits: u32, stride: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..bits {
        out |= ((x >> i) & 1) << (i * stride);
    }
    out
}

fn compact_bits_generic(x: u64, bits: u32, stride: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..bits {
        out |= ((x >> (i * stride)) & 1) << i;
    }
    out
}

/// 2D instantiation: two 32-bit lanes interleaved into a 64-bit key
/// (x at even bits, y at odd bits).
#[inline]
pub fn encode_2d(qx: u32, qy: u32) -> u64 {
    (spread_bits_generic(qy as u64, BITS_2D, 2) << 1) | spread_bits_generic(qx as u64, BITS_2D, 2)
}

#[inline]
pub fn decode_2d(key: u64) -> (u32, u32) {
    (
        compact_bits_generic(key, BITS_2D, 2) as u32,
        compact_bits_generic(key >> 1, BITS_2D, 2) as u32,
    )
}

/// 4D instantiation: four 16-bit lanes interleaved into a 64-bit key.
#[inline]
pub fn encode_4d(qx: u32, qy: u32, qz: u32, qw: u32) -> u64 {
    (spread_bits_generic(qw as u64, BITS_4D, 4) << 3)
        | (spread_bits_generic(qz as u64, BITS_4D, 4) << 2)
        | (spread_bits_generic(qy as u64, BITS_4D, 4) << 1)
        | spread_bits_generic(qx as u64, BITS_4D, 4)
}

#[inline]
pub fn decode_4d(key: u64) -> (u32, u32, u32, u32) {
    (
        compact_bits_generic(key, BITS_4D, 4) as u32,
        compact_bits_generic(key >> 1, BITS_4D, 4) as u32,
        compact_bits_generic(key >> 2, BITS_4D, 4) as u32,
        compact_bits_generic(key >> 3, BITS_4D, 4) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    #[test]
    fn interleave_law_3d() {
        let mut rng = Pcg64::seed_from_u64(1);
        for _ in 0..10_000 {
            let qx: u32 = rng.gen_range(0..(1 << BITS_3D));
            let qy: u32 = rng.gen_range(0..(1 << BITS_3D));
            let qz: u32 = rng.gen_range(0..(1 << BITS_3D));
            let key = encode_3d(qx, qy, qz);
            assert_eq!(decode_3d(key), (qx, qy, qz));
        }
    }

    #[test]
    fn interleave_law_2d() {
        let mut rng = Pcg64::seed_from_u64(2);
        for _ in 0..2_000 {
            let qx: u32 = rng.gen();
            let qy: u32 = rng.gen();
            let key = encode_2d(qx, qy);
            assert_eq!(decode_2d(key), (qx, qy));
        }
    }

    #[test]
    fn interleave_law_4d() {
        let mut rng = Pcg64::seed_from_u64(3);
        for _ in 0..2_000 {
            let q: [u32; 4] = [
                rng.gen_range(0..(1u32 << BITS_4D)),
                rng.gen_range(0..(1u32 << BITS_4D)),
                rng.gen_range(0..(1u32 << BITS_4D)),
                rng.gen_range(0..(1u32 << BITS_4D)),
            ];
            let key = encode_4d(q[0], q[1], q[2], q[3]);
            assert_eq!(decode_4d(key), (q[0], q[1], q[2], q[3]));
        }
    }

    #[test]
    fn bit_positions_are_strided_by_three() {
        // x occupies bits 0,3,6,...; y bits 1,4,7,...; z bits 2,5,8,...
        let key = encode_3d(0b1, 0, 0);
        assert_eq!(key, 1);
        let key = encode_3d(0, 0b1, 0);
        assert_eq!(key, 1 << 1);
        let key = encode_3d(0, 0, 0b1);
        assert_eq!(key, 1 << 2);
        let key = encode_3d(0b10, 0, 0);
        assert_eq!(key, 1 << 3);
    }

    #[test]
    fn top_bit_unused() {
        let key = encode_3d((1 << BITS_3D) - 1, (1 << BITS_3D) - 1, (1 << BITS_3D) - 1);
        assert_eq!(key & (1 << 63), 0);
    }
}
