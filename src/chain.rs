//! ChainTable: bucket array of singly linked chains threaded through a slot arena.
//!
//! Nodes live in a `SlotMap`; a chain link is the generational key of the
//! next node. The arena owns every node exactly once, so unlinking a node and
//! removing it from the arena is the only release path.

use crate::hashing::{bucket_index, same_key};
use core::borrow::Borrow;
use slotmap::{DefaultKey, SlotMap};
use std::collections::TryReserveError;

#[derive(Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) hash: u64,
    next: Option<DefaultKey>,
}

#[derive(Copy, Clone, Debug, Default)]
struct Bucket {
    head: Option<DefaultKey>,
    len: usize,
}

#[derive(Debug)]
pub(crate) struct ChainTable<K> {
    nodes: SlotMap<DefaultKey, Node<K>>,
    buckets: Vec<Bucket>,
    // Longest chain seen since the last rebuild; removals do not lower it.
    max_chain_len: usize,
}

fn alloc_buckets(count: usize) -> Result<Vec<Bucket>, TryReserveError> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(count)?;
    buckets.resize(count, Bucket::default());
    Ok(buckets)
}

impl<K> ChainTable<K> {
    pub(crate) fn new(buckets: usize) -> Self {
        debug_assert!(buckets > 0);
        Self {
            nodes: SlotMap::with_key(),
            buckets: vec![Bucket::default(); buckets],
            max_chain_len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn max_chain_len(&self) -> usize {
        self.max_chain_len
    }

    pub(crate) fn empty_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.head.is_none()).count()
    }

    pub(crate) fn index_of(&self, hash: u64) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    /// Scan the chain for `hash` and return the node holding an equal key.
    pub(crate) fn locate<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.buckets[self.index_of(hash)].head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if same_key(node.hash, &node.key, hash, q) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Link a new node at the head of its chain. The caller guarantees the
    /// key is not already present.
    pub(crate) fn prepend(&mut self, key: K, hash: u64) -> DefaultKey {
        let idx = self.index_of(hash);
        let bucket = &mut self.buckets[idx];
        let k = self.nodes.insert(Node {
            key,
            hash,
            next: bucket.head,
        });
        bucket.head = Some(k);
        bucket.len += 1;
        self.max_chain_len = self.max_chain_len.max(bucket.len);
        k
    }

    /// Unlink and release the node holding a key equal to `q`.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let idx = self.index_of(hash);
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.buckets[idx].head;
        while let Some(k) = cur {
            let node = &self.nodes[k];
            let next = node.next;
            if same_key(node.hash, &node.key, hash, q) {
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.buckets[idx].head = next,
                }
                self.buckets[idx].len -= 1;
                return self.nodes.remove(k).map(|n| n.key);
            }
            prev = cur;
            cur = next;
        }
        None
    }

    pub(crate) fn node(&self, k: DefaultKey) -> Option<&Node<K>> {
        self.nodes.get(k)
    }

    /// First occupied position at or after bucket `from`.
    pub(crate) fn first_from(&self, from: usize) -> Option<(usize, DefaultKey)> {
        self.buckets
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(i, b)| b.head.map(|k| (i, k)))
    }

    /// Position following `node` (in `bucket`) in bucket-then-chain order.
    pub(crate) fn successor(&self, bucket: usize, node: DefaultKey) -> Option<(usize, DefaultKey)> {
        match self.nodes.get(node).and_then(|n| n.next) {
            Some(next) => Some((bucket, next)),
            None => self.first_from(bucket + 1),
        }
    }

    /// Rebuild the bucket array with `count` buckets, relinking every node by
    /// its stored hash. The new array is allocated before anything is touched,
    /// so on error the table is unchanged.
    pub(crate) fn relink(&mut self, count: usize) -> Result<(), TryReserveError> {
        debug_assert!(count > 0);
        let fresh = alloc_buckets(count)?;
        let old = core::mem::replace(&mut self.buckets, fresh);
        self.max_chain_len = 0;
        for bucket in &old {
            let mut cur = bucket.head;
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                let target = &mut self.buckets[bucket_index(node.hash, count)];
                node.next = target.head;
                target.head = Some(k);
                target.len += 1;
                self.max_chain_len = self.max_chain_len.max(target.len);
            }
        }
        Ok(())
    }

    pub(crate) fn keys(&self) -> Keys<'_, K> {
        Keys {
            table: self,
            next_bucket: 0,
            cur: None,
            remaining: self.len(),
        }
    }

    /// Nodes of one bucket, head first.
    pub(crate) fn chain(&self, bucket: usize) -> ChainNodes<'_, K> {
        ChainNodes {
            table: self,
            cur: self.buckets[bucket].head,
        }
    }

    pub(crate) fn into_keys(self) -> IntoKeys<K> {
        IntoKeys {
            it: self.nodes.into_iter(),
        }
    }

    /// Verify the structural invariants; used by tests after every operation.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self)
    where
        K: Eq + core::fmt::Debug,
    {
        let mut seen = 0usize;
        let mut longest = 0usize;
        for (i, b) in self.buckets.iter().enumerate() {
            let chain: Vec<&Node<K>> = self.chain(i).collect();
            assert_eq!(chain.len(), b.len, "bucket {i} length out of sync");
            for n in &chain {
                assert_eq!(self.index_of(n.hash), i, "{:?} in wrong bucket", n.key);
            }
            for (x, a) in chain.iter().enumerate() {
                for c in &chain[x + 1..] {
                    assert!(a.key != c.key, "duplicate key {:?}", a.key);
                }
            }
            seen += chain.len();
            longest = longest.max(chain.len());
        }
        assert_eq!(seen, self.len(), "len differs from sum of chain lengths");
        assert!(self.max_chain_len >= longest, "max chain length underestimated");
    }
}

/// Keys in bucket order, each chain head-to-tail.
#[derive(Debug)]
pub(crate) struct Keys<'a, K> {
    table: &'a ChainTable<K>,
    next_bucket: usize,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<K> Clone for Keys<'_, K> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            next_bucket: self.next_bucket,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

impl<'a, K> Iterator for Keys<'a, K> {
    type Item = &'a Node<K>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let node = &self.table.nodes[k];
                self.cur = node.next;
                self.remaining -= 1;
                return Some(node);
            }
            let bucket = self.table.buckets.get(self.next_bucket)?;
            self.cur = bucket.head;
            self.next_bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[derive(Debug)]
pub(crate) struct ChainNodes<'a, K> {
    table: &'a ChainTable<K>,
    cur: Option<DefaultKey>,
}

impl<K> Clone for ChainNodes<'_, K> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            cur: self.cur,
        }
    }
}

impl<'a, K> Iterator for ChainNodes<'a, K> {
    type Item = &'a Node<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.table.nodes[self.cur?];
        self.cur = node.next;
        Some(node)
    }
}

pub(crate) struct IntoKeys<K> {
    it: slotmap::basic::IntoIter<DefaultKey, Node<K>>,
}

impl<K> Iterator for IntoKeys<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.it.next().map(|(_, n)| n.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
