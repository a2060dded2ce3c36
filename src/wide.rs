//! Wide-BVH collaborator (§4.7, §2): regroups a binary BVH into 4- or
//! 8-wide nodes for traversal consumers that prefer wider branching. Named
//! for completeness — the core's scope stops at producing the binary tree —
//! so this module documents the intended signature and defers the actual
//! regrouping to future work rather than guessing at an implementation the
//! spec does not define.

use crate::bvh::Bvh;

/// A collapsed wide-branching BVH. Left unpopulated: constructing one from
/// a binary [`Bvh`] is out of scope for this crate (§4.7).
#[derive(Debug, Default)]
pub struct WideBvh {
    pub branching: u32,
}

/// Regroup `bvh` into `branching`-wide nodes (4 or 8). Not implemented; the
/// core names this collaborator's interface but does not specify or provide
/// its internals.
pub fn collapse_to_wide(_bvh: &Bvh, branching: u32) -> WideBvh {
    unimplemented!(
        "wide-BVH collapse (branching={branching}) is a named collaborator, not part of the core build"
    )
}
