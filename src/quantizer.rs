//! Fixed-point quantizer: maps centroid-bounds-relative world coordinates
//! onto the 21-bits-per-axis integer lattice the Morton encoder consumes.

use crate::aabb::Aabb3;
use crate::morton::BITS_3D;
use crate::vector::Vec3f32;

/// `2^21`, the width of the quantized lattice per axis in the 3D instantiation.
pub const LATTICE_SIZE: f32 = (1u32 << BITS_3D) as f32;
/// Inclusive upper clamp for a quantized coordinate (`2^21 - 1`).
pub const LATTICE_MAX: u32 = (1u32 << BITS_3D) - 1;

/// The floor applied to each axis of the centroid-bounds size before taking
/// its reciprocal, so a collapsed axis (zero extent) still yields a finite
/// scale (§3).
pub const DEGENERATE_AXIS_FLOOR: f32 = 1e-20;

/// Bias + scale pair derived from the centroid bounds (§3). `quantize`
/// consumes this to turn a centroid into lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizerParams {
    pub bias: Vec3f32,
    pub scale: Vec3f32,
}

impl QuantizerParams {
    /// Derive quantizer parameters from the centroid bounds of all non-empty
    /// primitives. `centroid_bounds` must not be empty (callers handle the
    /// all-empty-input case, §7, before reaching here).
    pub fn from_centroid_bounds(centroid_bounds: &Aabb3) -> Self {
        let size = centroid_bounds.size();
        let scale = Vec3f32(
            LATTICE_SIZE / size.0.max(DEGENERATE_AXIS_FLOOR),
            LATTICE_SIZE / size.1.max(DEGENERATE_AXIS_FLOOR),
            LATTICE_SIZE / size.2.max(DEGENERATE_AXIS_FLOOR),
        );
        Self {
            bias: centroid_bounds.lower,
            scale,
        }
    }

    /// `q = clamp(floor((p - bias) * scale), 0, 2^21 - 1)` per axis.
    pub fn quantize(&self, p: Vec3f32) -> (u32, u32, u32) {
        (
            quantize_axis(p.0, self.bias.0, self.scale.0),
            quantize_axis(p.1, self.bias.1, self.scale.1),
            quantize_axis(p.2, self.bias.2, self.scale.2),
        )
    }
}

#[inline]
fn quantize_axis(p: f32, bias: f32, scale: f32) -> u32 {
    let q = ((p - bias) * scale).floor();
    // Rounding toward -inf on a point below bias (shouldn't happen for a
    // centroid inside its own bounds, but §3 only promises the round-trip
    // law for points within [bias, bias+size]) can go negative; clamp both
    // ends.
    if q <= 0.0 {
        0
    } else if q >= LATTICE_MAX as f32 {
        LATTICE_MAX
    } else {
        q as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_law_interior_points_land_in_range() {
        let bounds = Aabb3::new(Vec3f32(0.0, 0.0, 0.0), Vec3f32(10.0, 1.0, 100.0));
        let params = QuantizerParams::from_centroid_bounds(&bounds);
        for t in [0.0f32, 0.1, 0.5, 0.9, 1.0] {
            let p = Vec3f32(10.0 * t, 1.0 * t, 100.0 * t);
            let (qx, qy, qz) = params.quantize(p);
            assert!(qx <= LATTICE_MAX);
            assert!(qy <= LATTICE_MAX);
            assert!(qz <= LATTICE_MAX);
        }
    }

    #[test]
    fn degenerate_axis_uses_floor_and_quantizes_to_zero() {
        // All points share z=0: centroid bounds collapse to zero extent on z.
        let bounds = Aabb3::new(Vec3f32(0.0, 0.0, 0.0), Vec3f32(1.0, 1.0, 0.0));
        let params = QuantizerParams::from_centroid_bounds(&bounds);
        assert!(params.scale.2.is_finite());
        let (_, _, qz) = params.quantize(Vec3f32(0.5, 0.5, 0.0));
        assert_eq!(qz, 0);
    }

    #[test]
    fn upper_corner_clamps_to_lattice_max() {
        let bounds = Aabb3::new(Vec3f32(0.0, 0.0, 0.0), Vec3f32(1.0, 1.0, 1.0));
        let params = QuantizerParams::from_centroid_bounds(&bounds);
        let (qx, qy, qz) = params.quantize(Vec3f32(1.0, 1.0, 1.0));
        assert_eq!(qx, LATTICE_MAX);
        assert_eq!(qy, LATTICE_MAX);
        assert_eq!(qz, LATTICE_MAX);
    }

    #[test]
    fn single_point_bounds_quantizes_to_origin() {
        let bounds = Aabb3::new(Vec3f32(5.0, 5.0, 5.0), Vec3f32(5.0, 5.0, 5.0));
        let params = QuantizerParams::from_centroid_bounds(&bounds);
        assert_eq!(params.quantize(Vec3f32(5.0, 5.0, 5.0)), (0, 0, 0));
    }
}
