//! BFS tree expander (§4.5) and its split rule.
//!
//! The real build dispatches this as a GPU kernel loop (`shaders.rs`'s
//! `BFS_EXPAND_SHADER`, driven by `builder.rs`), one dispatch per tree
//! level, synchronizing on the allocation counter between levels exactly as
//! §5 describes. This module also carries a plain host-side reference
//! implementation operating on an in-memory key slice — the algorithm is
//! inherently sequential-looking level by level even though each level's
//! work is itself embarrassingly parallel, so the host version is a
//! faithful (if unparallelized) rendering of the same rule set, and it's
//! what this crate's property/scenario tests exercise directly since they
//! can't depend on a GPU being present.

use crate::temp_node::TempNode;

/// Longest-common-prefix split rule (§4.5). `keys[lo..hi)` must be
/// non-decreasing (the array is sorted before the BFS loop ever runs).
/// Returns `None` when the whole range shares one key (rule B: unsplittable,
/// finalize as a leaf).
pub fn find_split(keys: &[u64], lo: u32, hi: u32) -> Option<u32> {
    debug_assert!(lo < hi);
    let first = keys[lo as usize];
    let last = keys[(hi - 1) as usize];
    if first == last {
        return None;
    }
    let delta = (first ^ last).leading_zeros();
    let search_key = last & (!0u64 << (63 - delta));

    // Binary search for the first index m in (lo, hi) with keys[m] >= search_key.
    let mut left = lo + 1;
    let mut right = hi; // exclusive upper bound of the search space
    while left < right {
        let mid = left + (right - left) / 2;
        if keys[mid as usize] >= search_key {
            right = mid;
        } else {
            left = mid + 1;
        }
    }
    debug_assert!(left > lo && left < hi);
    Some(left)
}

/// Run the BFS expansion to completion over `keys[0..v)` (`v` is
/// `numValidPrims`), returning the finished `TempNode` buffer. `nodes[0]` is
/// always the root.
pub fn expand(keys: &[u64], v: u32, leaf_threshold: u32) -> Vec<TempNode> {
    if v == 0 {
        return vec![TempNode::finished(0, 0)];
    }

    let mut nodes = Vec::with_capacity((2 * v as usize).max(1));
    nodes.push(TempNode::open(0, v));
    let mut processed: u32 = 0;

    while (processed as usize) < nodes.len() {
        let end = nodes.len() as u32;
        for n in processed..end {
            let (lo, hi) = nodes[n as usize].open_range();
            let size = hi - lo;

            if size <= leaf_threshold {
                nodes[n as usize] = TempNode::finished(lo, size);
                continue;
            }

            match find_split(keys, lo, hi) {
                None => {
                    nodes[n as usize] = TempNode::finished(lo, size);
                }
                Some(split) => {
                    let child_base = nodes.len() as u32;
                    nodes.push(TempNode::open(lo, split));
                    nodes.push(TempNode::open(split, hi));
                    nodes[n as usize] = TempNode::finished(child_base, 0);
                }
            }
        }
        processed = end;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_have_no_split() {
        let keys = [5u64, 5, 5, 5];
        assert_eq!(find_split(&keys, 0, 4), None);
    }

    #[test]
    fn distinct_keys_split_between_differing_prefixes() {
        // 0b000, 0b001, 0b110, 0b111 — the top differing bit is between
        // index 1 and 2.
        let keys = [0b000u64, 0b001, 0b110, 0b111];
        let m = find_split(&keys, 0, 4).unwrap();
        assert_eq!(m, 2);
    }

    #[test]
    fn singleton_yields_one_leaf_root() {
        let keys = [42u64];
        let nodes = expand(&keys, 1, 1);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].finished_offset_count(), (0, 1));
    }

    #[test]
    fn two_well_separated_points_split_once() {
        let keys = [0u64, u64::MAX];
        let nodes = expand(&keys, 2, 1);
        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].is_finished());
        let (offset, count) = nodes[0].finished_offset_count();
        assert_eq!(count, 0);
        assert_eq!(offset, 1);
        assert_eq!(nodes[1].finished_offset_count(), (0, 1));
        assert_eq!(nodes[2].finished_offset_count(), (1, 1));
    }

    #[test]
    fn all_identical_keys_collapse_to_single_root_leaf() {
        let keys = vec![7u64; 8];
        let nodes = expand(&keys, 8, 2);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].finished_offset_count(), (0, 8));
    }

    #[test]
    fn empty_input_yields_single_empty_leaf_root() {
        let keys: [u64; 0] = [];
        let nodes = expand(&keys, 0, 1);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].finished_offset_count(), (0, 0));
    }

    #[test]
    fn leaf_threshold_bounds_every_leaf_unless_keys_tie() {
        let keys: Vec<u64> = (0..64u64).collect();
        let nodes = expand(&keys, 64, 4);
        for n in &nodes {
            if n.is_finished() {
                let (_, count) = n.finished_offset_count();
                assert!(count == 0 || count <= 4);
            }
        }
    }

    #[test]
    fn node_count_never_exceeds_two_v_minus_one() {
        let keys: Vec<u64> = (0..100u64).collect();
        let nodes = expand(&keys, 100, 1);
        assert!(nodes.len() <= 2 * 100 - 1);
    }

    #[test]
    fn children_of_every_internal_node_follow_parent() {
        let keys: Vec<u64> = (0..37u64).map(|i| i * 17).collect();
        let nodes = expand(&keys, 37, 1);
        for (idx, n) in nodes.iter().enumerate() {
            if n.is_finished() {
                let (offset, count) = n.finished_offset_count();
                if count == 0 {
                    assert!(offset as usize > idx);
                }
            }
        }
    }
}
