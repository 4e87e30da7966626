//! Hash and equality policy: maps keys to bucket indices.
//!
//! Hashes are computed once per key with the set's `BuildHasher` and stored
//! alongside the key. Bucket selection is `hash mod bucket_count`, so a change
//! of bucket count moves every key and a rebuild must revisit all of them.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

pub use hashbrown::hash_map::DefaultHashBuilder;

#[inline]
pub(crate) fn make_hash<S, Q>(hasher: &S, q: &Q) -> u64
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    hasher.hash_one(q)
}

/// Reduce a stored hash to a bucket index in `[0, buckets)`.
#[inline]
pub(crate) fn bucket_index(hash: u64, buckets: usize) -> usize {
    debug_assert!(buckets > 0);
    (hash % buckets as u64) as usize
}

/// Key identity: the stored hash must match before `Eq` is consulted.
#[inline]
pub(crate) fn same_key<K, Q>(stored_hash: u64, stored: &K, hash: u64, q: &Q) -> bool
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    stored_hash == hash && stored.borrow() == q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_stays_in_range() {
        for buckets in 1..40usize {
            for hash in [0u64, 1, 7, 1 << 40, u64::MAX] {
                assert!(bucket_index(hash, buckets) < buckets);
            }
        }
    }

    /// Invariant: equal keys hash identically under the same builder.
    #[test]
    fn hashing_is_deterministic_per_builder() {
        let s = DefaultHashBuilder::default();
        assert_eq!(make_hash(&s, "abc"), make_hash(&s, &"abc".to_string()));
    }

    #[test]
    fn same_key_requires_matching_hash() {
        let k = "a".to_string();
        assert!(same_key(5, &k, 5, "a"));
        assert!(!same_key(5, &k, 6, "a"));
        assert!(!same_key(5, &k, 5, "b"));
    }
}
