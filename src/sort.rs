//! Sorter collaborator (§4.4): sorts `(MortonKey, primID)` pairs by
//! ascending key, carrying `primID` along.
//!
//! Grounded directly on `hlbvh.rs`'s `MortonPrimitive`/`RadixKey` pair: same
//! shape (a struct pairing a Morton code with a primitive index), same
//! `cfg(debug_assertions)` fallback to a comparison sort because `rdst`'s
//! unstable radix sort relies on well-defined unsigned wraparound that
//! panics under debug overflow checks. The only change is `LEVELS`: the
//! teacher's 30-bit codes fit 4 byte-levels; this crate's 64-bit keys need
//! 8.

use rdst::{RadixKey, RadixSort};

/// A (key, primitive index) pair carried through the sort together.
#[derive(Copy, Clone, Debug)]
pub struct KeyedPrimitive {
    pub key: u64,
    pub prim_id: u32,
}

impl KeyedPrimitive {
    pub fn new(key: u64, prim_id: u32) -> Self {
        Self { key, prim_id }
    }
}

impl RadixKey for KeyedPrimitive {
    const LEVELS: usize = 8;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        (self.key >> (level * 8)) as u8
    }
}

impl Eq for KeyedPrimitive {}

impl PartialEq for KeyedPrimitive {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Ord for KeyedPrimitive {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for KeyedPrimitive {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort `pairs` by ascending key in place. §4.4 imposes no global stability
/// requirement — only that the two logical arrays (key, primID) stay
/// paired, which they do here since both travel in the same struct.
pub fn sort_pairs(pairs: &mut [KeyedPrimitive]) {
    if cfg!(debug_assertions) {
        pairs.sort_unstable();
    } else {
        pairs.radix_sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{seq::SliceRandom, SeedableRng};
    use rand_pcg::Pcg64;

    #[test]
    fn sorts_ascending_by_key() {
        let mut pairs = vec![
            KeyedPrimitive::new(5, 0),
            KeyedPrimitive::new(1, 1),
            KeyedPrimitive::new(3, 2),
        ];
        sort_pairs(&mut pairs);
        let keys: Vec<u64> = pairs.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn carries_prim_id_through_sort() {
        let mut pairs = vec![
            KeyedPrimitive::new(100, 7),
            KeyedPrimitive::new(1, 42),
            KeyedPrimitive::new(50, 9),
        ];
        sort_pairs(&mut pairs);
        assert_eq!(pairs[0].prim_id, 42);
        assert_eq!(pairs[1].prim_id, 9);
        assert_eq!(pairs[2].prim_id, 7);
    }

    #[test]
    fn large_random_batch_ends_up_sorted() {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut pairs: Vec<KeyedPrimitive> = (0..5_000u32)
            .map(|i| KeyedPrimitive::new((i as u64).wrapping_mul(2654435761), i))
            .collect();
        pairs.shuffle(&mut rng);
        sort_pairs(&mut pairs);
        for w in pairs.windows(2) {
            assert!(w[0].key <= w[1].key);
        }
    }
}
