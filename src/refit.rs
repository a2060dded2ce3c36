//! Refit collaborator (§4.7, §2 item 8): bottom-up AABB fill. Named and
//! interfaced here; `builder.rs` calls it once before `build()` returns, as
//! §6 requires, but its internal traversal order and parallelization
//! strategy are out of the core's scope — this is a straightforward
//! single-threaded reference implementation, not the GPU kernel a
//! performance-sensitive caller would eventually swap in.

use crate::aabb::Aabb3;
use crate::node::BvhNode;

/// Fill `aabbs[i]` for every node `i`, given the already-built topology in
/// `nodes` and the per-primitive boxes `boxes` indexed through `prim_ids`.
/// Processes nodes in reverse allocation order so a parent's children (which
/// always have a higher index, §3 "offset > n") are already filled in by the
/// time the parent is visited.
pub fn refit(nodes: &[BvhNode], aabbs: &mut [Aabb3], prim_ids: &[u32], boxes: &[Aabb3]) {
    debug_assert_eq!(nodes.len(), aabbs.len());
    for i in (0..nodes.len()).rev() {
        let node = nodes[i];
        aabbs[i] = if node.is_leaf() {
            let mut b = Aabb3::empty();
            let start = node.offset() as usize;
            for k in 0..node.count() as usize {
                let prim = prim_ids[start + k] as usize;
                b.include_aabb(&boxes[prim]);
            }
            b
        } else {
            let (l, r) = node.children();
            let mut b = aabbs[l as usize];
            b.include_aabb(&aabbs[r as usize]);
            b
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec3f32;

    #[test]
    fn leaf_aabb_encloses_its_primitives() {
        let nodes = [BvhNode::pack(0, 2)];
        let mut aabbs = vec![Aabb3::empty(); 1];
        let prim_ids = [0u32, 1];
        let boxes = [
            Aabb3::new(Vec3f32(0.0, 0.0, 0.0), Vec3f32(1.0, 1.0, 1.0)),
            Aabb3::new(Vec3f32(2.0, 2.0, 2.0), Vec3f32(3.0, 3.0, 3.0)),
        ];
        refit(&nodes, &mut aabbs, &prim_ids, &boxes);
        assert_eq!(aabbs[0].lower, Vec3f32(0.0, 0.0, 0.0));
        assert_eq!(aabbs[0].upper, Vec3f32(3.0, 3.0, 3.0));
    }

    #[test]
    fn internal_node_aabb_unions_children() {
        let nodes = [
            BvhNode::pack(1, 0), // root: internal, children at 1,2
            BvhNode::pack(0, 1), // left leaf: prim 0
            BvhNode::pack(1, 1), // right leaf: prim 1
        ];
        let mut aabbs = vec![Aabb3::empty(); 3];
        let prim_ids = [0u32, 1];
        let boxes = [
            Aabb3::new(Vec3f32(-1.0, 0.0, 0.0), Vec3f32(0.0, 1.0, 1.0)),
            Aabb3::new(Vec3f32(0.0, -1.0, 0.0), Vec3f32(1.0, 0.0, 1.0)),
        ];
        refit(&nodes, &mut aabbs, &prim_ids, &boxes);
        assert_eq!(aabbs[0].lower, Vec3f32(-1.0, -1.0, 0.0));
        assert_eq!(aabbs[0].upper, Vec3f32(1.0, 1.0, 1.0));
    }
}
