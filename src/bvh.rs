//! Host-visible build output (§3.1).

use crate::aabb::Aabb3;
use crate::node::BvhNode;

/// The result of a successful [`crate::builder::Builder::build`] call.
/// `nodes[0]` is always the root; `prim_ids` is a permutation of the valid
/// input indices, ordered by leaf.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    pub nodes: Vec<BvhNode>,
    pub aabbs: Vec<Aabb3>,
    pub prim_ids: Vec<u32>,
    pub num_nodes: u32,
    pub num_prims: u32,
}

impl Bvh {
    pub fn root(&self) -> BvhNode {
        self.nodes[0]
    }
}
