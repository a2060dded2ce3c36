//! Axis aligned bounding box.
//!
//! Adapted from the raytracer's `data_structures::bbox::Bbox`, generalized to
//! the three vector widths the builder is instantiated over (2D/3D/4D) and
//! renamed to match this crate's vocabulary (`Aabb`, `lower`/`upper`).

use crate::vector::{Vec2f32, Vec3f32, Vec4f32};

macro_rules! impl_aabb {
    ($name:ident, $vec:ty, $n:literal) => {
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            pub lower: $vec,
            pub upper: $vec,
        }

        impl $name {
            /// An AABB enclosing nothing. `include_point`/`include_aabb` grow it outward.
            pub fn empty() -> Self {
                Self {
                    lower: <$vec>::from([f32::INFINITY; $n]),
                    upper: <$vec>::from([f32::NEG_INFINITY; $n]),
                }
            }

            pub fn new(lower: $vec, upper: $vec) -> Self {
                Self { lower, upper }
            }

            /// Per §3: empty iff any lower component exceeds its upper component.
            /// NaN components make every ordered comparison false, so a NaN-tainted
            /// box also reads as non-empty here; callers that need to treat NaN
            /// boxes as empty (§7 Non-finite input) must check `is_finite()` first.
            pub fn is_empty(&self) -> bool {
                for i in 0..$n {
                    if self.lower[i] > self.upper[i] {
                        return true;
                    }
                }
                false
            }

            pub fn is_finite(&self) -> bool {
                for i in 0..$n {
                    if !self.lower[i].is_finite() || !self.upper[i].is_finite() {
                        return false;
                    }
                }
                true
            }

            pub fn center(&self) -> $vec {
                (self.lower + self.upper) * 0.5
            }

            pub fn size(&self) -> $vec {
                self.upper - self.lower
            }

            pub fn include_point(&mut self, p: $vec) {
                self.lower = self.lower.min(p);
                self.upper = self.upper.max(p);
            }

            pub fn include_aabb(&mut self, other: &$name) {
                self.lower = self.lower.min(other.lower);
                self.upper = self.upper.max(other.upper);
            }
        }

        impl From<[f32; $n]> for $vec {
            fn from(value: [f32; $n]) -> Self {
                Self::from_array(value)
            }
        }
    };
}

impl Vec2f32 {
    fn from_array(a: [f32; 2]) -> Self {
        Self(a[0], a[1])
    }
}
impl Vec3f32 {
    fn from_array(a: [f32; 3]) -> Self {
        Self(a[0], a[1], a[2])
    }
}
impl Vec4f32 {
    fn from_array(a: [f32; 4]) -> Self {
        Self(a[0], a[1], a[2], a[3])
    }
}

impl_aabb!(Aabb2, Vec2f32, 2);
impl_aabb!(Aabb3, Vec3f32, 3);
impl_aabb!(Aabb4, Vec4f32, 4);

/// The crate is "primarily 3D"; most of the driver, tests and examples work
/// against this alias rather than naming `Aabb3` directly.
pub type Aabb = Aabb3;

/// GPU-visible layout for an `Aabb3`, padded to 16-byte alignment the way
/// `BboxGpu` does in the raytracer so it can sit in a `wgpu` storage buffer.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
pub struct AabbGpu {
    pub lower: Vec3f32,
    _padding0: f32,
    pub upper: Vec3f32,
    _padding1: f32,
}
static_assertions::assert_eq_size!(AabbGpu, [u8; 4 * 4 * 2]);

impl From<Aabb3> for AabbGpu {
    fn from(value: Aabb3) -> Self {
        Self {
            lower: value.lower,
            _padding0: 0.0,
            upper: value.upper,
            _padding1: 0.0,
        }
    }
}

impl From<AabbGpu> for Aabb3 {
    fn from(value: AabbGpu) -> Self {
        Self {
            lower: value.lower,
            upper: value.upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_is_empty() {
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn degenerate_box_from_spec_is_empty() {
        // lower=(1,1,1), upper=(0,0,0) — scenario 3 in the spec.
        let b = Aabb::new(vec3(1.0, 1.0, 1.0), vec3(0.0, 0.0, 0.0));
        assert!(b.is_empty());
    }

    #[test]
    fn unit_box_center_and_size() {
        let b = Aabb::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 1.0));
        assert!(!b.is_empty());
        assert_eq!(b.center(), vec3(0.5, 0.5, 0.5));
        assert_eq!(b.size(), vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn include_point_grows_bounds() {
        let mut b = Aabb::empty();
        b.include_point(vec3(1.0, -2.0, 3.0));
        b.include_point(vec3(-1.0, 5.0, 0.0));
        assert_eq!(b.lower, vec3(-1.0, -2.0, 0.0));
        assert_eq!(b.upper, vec3(1.0, 5.0, 3.0));
    }

    fn vec3(x: f32, y: f32, z: f32) -> Vec3f32 {
        Vec3f32(x, y, z)
    }
}
