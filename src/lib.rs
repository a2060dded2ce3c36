//! GPU-parallel Morton-code linear BVH builder over device-resident AABBs.
//!
//! Given an array of primitive AABBs, [`builder::build_reference`] (host
//! path, used by this crate's own tests) and [`builder::Builder`] (the
//! `wgpu`-dispatching path matching the external interface) both produce a
//! [`bvh::Bvh`]: a flat node array plus a primitive-index permutation such
//! that primitives close in Morton order end up contiguous in the tree.
//!
//! Module map:
//! - [`vector`] / [`aabb`] — small fixed vector types and the AABB they
//!   back, instantiated over 2D/3D/4D.
//! - [`quantizer`] / [`morton`] — fixed-point quantization of centroids and
//!   Morton key construction/deconstruction.
//! - [`build_state`] — the device-resident atomic accumulator (centroid
//!   bounds, valid-primitive count, node-allocation count) and its
//!   order-preserving float/int encoding.
//! - [`temp_node`] / [`node`] — the BFS working-set record and the final
//!   packed node layout.
//! - [`sort`] — the `rdst`-backed pair sorter.
//! - [`bfs`] — the tree expansion algorithm (host reference) and its split
//!   rule.
//! - [`shaders`] — the WGSL compute kernels the GPU path dispatches.
//! - [`builder`] — the orchestrating driver tying the above into a build.
//! - [`refit`] / [`wide`] — named collaborators (bottom-up AABB fill, wide
//!   BVH regrouping) whose internals are out of this crate's core scope.
//! - [`gpu`] / [`stream`] / [`memory`] — device bootstrap, the stream
//!   abstraction, and the injectable allocator seam.
//! - [`config`] / [`error`] — the public configuration surface and error
//!   type.

pub mod aabb;
pub mod bfs;
pub mod build_state;
pub mod builder;
pub mod bvh;
pub mod config;
pub mod error;
pub mod gpu;
pub mod memory;
pub mod morton;
pub mod node;
pub mod quantizer;
pub mod refit;
pub mod shaders;
pub mod sort;
pub mod stream;
pub mod temp_node;
pub mod vector;
pub mod wide;

pub use bvh::Bvh;
pub use config::BuildConfig;
pub use error::{BuildError, BuildResult};
