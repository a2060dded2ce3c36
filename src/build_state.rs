//! Build-state accumulator (§4.2): a small device-resident record holding
//! the atomically-grown centroid-bounds box, the count of remaining valid
//! primitives, and the running node-allocation count. Host-mirrored after
//! Clear+Fill+Finish (centroid bounds) and again after the key/index
//! producer (`numValidPrims`), per §4.3's synchronization note.
//!
//! GPU atomics only operate on integers, so the centroid-bounds box is
//! accumulated as three pairs of `atomic<i32>` min/max using the
//! order-preserving float-to-int bit trick also used by the quadtree
//! builder in this crate's reference pack (`float_to_int`/`int_to_float`):
//! flip the sign bit of a non-negative float, or flip every bit of a
//! negative one, and the resulting `i32` orders the same way the float did.
//! The WGSL counterpart of these two functions lives in `shaders.rs`'s
//! `BUILD_STATE_COMMON` constant; these Rust versions back the CPU
//! reference path the tests exercise directly.

/// Map an `f32` to an `i32` such that `i32` ordering matches `f32` ordering,
/// including across the zero and sign boundary.
#[inline]
pub fn float_to_sortable_int(f: f32) -> i32 {
    let bits = f.to_bits() as i32;
    if bits >= 0 {
        bits
    } else {
        bits ^ i32::MAX
    }
}

/// Inverse of [`float_to_sortable_int`].
#[inline]
pub fn sortable_int_to_float(i: i32) -> f32 {
    let bits = if i >= 0 { i } else { i ^ i32::MAX };
    f32::from_bits(bits as u32)
}

/// Host-resident mirror of the GPU accumulator record. `GpuHandles`-backed
/// callers read this back via [`crate::stream::Stream::read_buffer`]; the
/// CPU reference builder in `bfs.rs` accumulates directly into this type.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
pub struct BuildStateGpu {
    lower_atomic: [i32; 3],
    upper_atomic: [i32; 3],
    /// Starts at N; decremented once per empty primitive observed by the
    /// producer kernel (§4.3). The value after the producer completes is
    /// `numValidPrims`.
    pub valid_count: i32,
    /// Node-allocation counter driving the BFS loop (§4.5). Starts at 1
    /// (the root).
    pub alloc_count: u32,
}

impl BuildStateGpu {
    /// Clear phase (§4.2): centroid bounds reset to empty, valid count set
    /// to the full input count N, allocation count reset to 0 (the BFS
    /// expander itself sets it to 1 once the root is seeded).
    pub fn cleared(n: u32) -> Self {
        Self {
            lower_atomic: [float_to_sortable_int(f32::INFINITY); 3],
            upper_atomic: [float_to_sortable_int(f32::NEG_INFINITY); 3],
            valid_count: n as i32,
            alloc_count: 0,
        }
    }

    /// Fill phase (§4.2): atomically grow the centroid-bounds box by a
    /// non-empty primitive's center. The real GPU kernel does a block-local
    /// reduction before this; the CPU reference applies it per-point since
    /// there is no block structure to exploit here.
    pub fn grow(&mut self, center: crate::vector::Vec3f32) {
        for axis in 0..3 {
            let c = float_to_sortable_int(center[axis]);
            if c < self.lower_atomic[axis] {
                self.lower_atomic[axis] = c;
            }
            if c > self.upper_atomic[axis] {
                self.upper_atomic[axis] = c;
            }
        }
    }

    /// Finish phase (§4.2): convert the atomic accumulator to a plain
    /// `Aabb3`.
    pub fn finish(&self) -> crate::aabb::Aabb3 {
        crate::aabb::Aabb3::new(
            crate::vector::Vec3f32(
                sortable_int_to_float(self.lower_atomic[0]),
                sortable_int_to_float(self.lower_atomic[1]),
                sortable_int_to_float(self.lower_atomic[2]),
            ),
            crate::vector::Vec3f32(
                sortable_int_to_float(self.upper_atomic[0]),
                sortable_int_to_float(self.upper_atomic[1]),
                sortable_int_to_float(self.upper_atomic[2]),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec3f32;

    #[test]
    fn sortable_int_round_trip_preserves_order() {
        let values = [-10.0f32, -1.0, 0.0, 0.5, 1.0, 100.0];
        let encoded: Vec<i32> = values.iter().map(|&v| float_to_sortable_int(v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
        for (&v, &i) in values.iter().zip(encoded.iter()) {
            assert_eq!(sortable_int_to_float(i), v);
        }
    }

    #[test]
    fn cleared_state_is_empty_box() {
        let state = BuildStateGpu::cleared(5);
        assert!(state.finish().is_empty());
        assert_eq!(state.valid_count, 5);
    }

    #[test]
    fn grow_accumulates_centroid_bounds() {
        let mut state = BuildStateGpu::cleared(2);
        state.grow(Vec3f32(1.0, 2.0, 3.0));
        state.grow(Vec3f32(-1.0, 0.0, 5.0));
        let bounds = state.finish();
        assert_eq!(bounds.lower, Vec3f32(-1.0, 0.0, 3.0));
        assert_eq!(bounds.upper, Vec3f32(1.0, 2.0, 5.0));
    }
}
