use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// Small fixed-size vector types shared by the quantizer, the AABB type and
/// the GPU buffer layouts. Adapted from the raytracer's `data_structures::vector`
/// module and extended with `Vec2` so the 2D instantiation of the builder has
/// a native point type instead of special-casing `Vec3` with an unused lane.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Zeroable)]
pub struct Vec2<T>(pub T, pub T);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Zeroable)]
pub struct Vec3<T>(pub T, pub T, pub T);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Default, bytemuck::Zeroable)]
pub struct Vec4<T>(pub T, pub T, pub T, pub T);

unsafe impl<T> bytemuck::Pod for Vec2<T> where T: bytemuck::Pod {}
unsafe impl<T> bytemuck::Pod for Vec3<T> where T: bytemuck::Pod {}
unsafe impl<T> bytemuck::Pod for Vec4<T> where T: bytemuck::Pod {}

pub type Vec2f32 = Vec2<f32>;
pub type Vec3f32 = Vec3<f32>;
pub type Vec4f32 = Vec4<f32>;

#[inline(always)]
pub const fn vec2f(f0: f32, f1: f32) -> Vec2<f32> {
    Vec2::<f32>(f0, f1)
}
#[inline(always)]
pub const fn vec3f(f0: f32, f1: f32, f2: f32) -> Vec3<f32> {
    Vec3::<f32>(f0, f1, f2)
}
#[inline(always)]
pub const fn vec4f(f0: f32, f1: f32, f2: f32, f3: f32) -> Vec4<f32> {
    Vec4::<f32>(f0, f1, f2, f3)
}

macro_rules! impl_vec_ops {
    ($name:ident { $($field:tt : $idx:literal),+ } => $n:literal) => {
        impl<T> Add<$name<T>> for $name<T>
        where
            T: Add<Output = T>,
        {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self($(self.$field + rhs.$field),+)
            }
        }

        impl<T> Sub<$name<T>> for $name<T>
        where
            T: Sub<Output = T>,
        {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self($(self.$field - rhs.$field),+)
            }
        }

        impl<T> Mul<$name<T>> for $name<T>
        where
            T: Mul<Output = T>,
        {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self::Output {
                Self($(self.$field * rhs.$field),+)
            }
        }

        impl<T> Mul<T> for $name<T>
        where
            T: Mul<Output = T> + Copy,
        {
            type Output = Self;
            fn mul(self, rhs: T) -> Self::Output {
                Self($(self.$field * rhs),+)
            }
        }

        impl<T> Div<T> for $name<T>
        where
            T: Div<Output = T> + Copy,
        {
            type Output = Self;
            fn div(self, rhs: T) -> Self::Output {
                Self($(self.$field / rhs),+)
            }
        }

        impl<T> Index<usize> for $name<T> {
            type Output = T;
            fn index(&self, index: usize) -> &Self::Output {
                match index {
                    $($idx => &self.$field,)+
                    _ => panic!("Unexpected index {index}"),
                }
            }
        }

        impl<T> IndexMut<usize> for $name<T> {
            fn index_mut(&mut self, index: usize) -> &mut Self::Output {
                match index {
                    $($idx => &mut self.$field,)+
                    _ => panic!("Unexpected index {index}"),
                }
            }
        }

        impl<T> $name<T>
        where
            T: PartialOrd<T> + Copy,
        {
            pub fn min(self, rhs: Self) -> Self {
                Self($(if self.$field < rhs.$field { self.$field } else { rhs.$field }),+)
            }

            pub fn max(self, rhs: Self) -> Self {
                Self($(if self.$field > rhs.$field { self.$field } else { rhs.$field }),+)
            }
        }

        impl $name<f32> {
            pub const DIM: usize = $n;
        }
    };
}

impl_vec_ops!(Vec2 { 0: 0, 1: 1 } => 2);
impl_vec_ops!(Vec3 { 0: 0, 1: 1, 2: 2 } => 3);
impl_vec_ops!(Vec4 { 0: 0, 1: 1, 2: 2, 3: 3 } => 4);
