//! ChainSet: the public set type. Orchestrates lookups, inserts and erases
//! over `ChainTable`, runs the resize engine, and issues cursors.

use crate::chain::{ChainTable, IntoKeys, Keys};
use crate::cursor::{Cursor, Position, Stamp};
use crate::dump::Dump;
use crate::error::{AllocError, CursorError, PolicyError};
use crate::hashing::{make_hash, DefaultHashBuilder};
use crate::observer::{ResizeEvent, ResizeKind, ResizeObserver, Stats};
use crate::policy::ResizePolicy;
use core::borrow::Borrow;
use core::fmt::{self, Display};
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::io;

/// A set of unique keys stored in separately chained buckets.
///
/// Keys are hashed once on insert; the hash is kept next to the key so that
/// rebuilding the bucket array never calls `K: Hash` again. The bucket array
/// grows when the longest chain and the load factor both exceed the
/// [`ResizePolicy`] thresholds and shrinks when the load factor drops low.
///
/// Positions are handed out as [`Cursor`]s which stay valid until the next
/// structural change of the set (a new key, an erased key, a rehash, `clear`).
pub struct ChainSet<K, S = DefaultHashBuilder> {
    hasher: S,
    table: ChainTable<K>,
    policy: ResizePolicy,
    stamp: Stamp,
    mutations: u64,
    observer: Option<Box<dyn ResizeObserver>>,
}

impl<K> ChainSet<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_policy(policy: ResizePolicy) -> Result<Self, PolicyError> {
        Self::with_policy_and_hasher(policy, Default::default())
    }
}

impl<K, S> Default for ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, S> ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        let policy = ResizePolicy::default();
        Self {
            hasher,
            table: ChainTable::new(policy.min_buckets),
            policy,
            stamp: Stamp::fresh(),
            mutations: 0,
            observer: None,
        }
    }

    pub fn with_policy_and_hasher(policy: ResizePolicy, hasher: S) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            hasher,
            table: ChainTable::new(policy.min_buckets),
            policy,
            stamp: Stamp::fresh(),
            mutations: 0,
            observer: None,
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        make_hash(&self.hasher, q)
    }

    // Every structural change invalidates outstanding cursors.
    fn touch(&mut self) {
        self.stamp = Stamp::fresh();
        self.mutations += 1;
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Current number of buckets.
    pub fn buckets(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn policy(&self) -> &ResizePolicy {
        &self.policy
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Insert `key` unless an equal key is stored. Returns a cursor at the
    /// stored key and whether `key` was inserted.
    ///
    /// Allocating the new entry is infallible: running out of memory aborts
    /// the process as it does for `Vec` and the std collections. Only the
    /// follow-up grow is fallible, and a failed grow keeps the current
    /// bucket array (see [`try_rehash`](Self::try_rehash)).
    pub fn insert(&mut self, key: K) -> (Cursor, bool) {
        let hash = self.make_hash(&key);
        if let Some(node) = self.table.locate(hash, &key) {
            let bucket = self.table.index_of(hash);
            return (Cursor::at(self.stamp, Some((bucket, node))), false);
        }
        let node = self.table.prepend(key, hash);
        self.touch();
        if self
            .policy
            .should_grow(self.len(), self.buckets(), self.table.max_chain_len())
        {
            let requested = self.policy.grown(self.buckets());
            self.auto_rehash(requested, ResizeKind::Grow);
        }
        // Nodes keep their arena slot across a rehash; only the bucket moves.
        let bucket = self.table.index_of(hash);
        (Cursor::at(self.stamp, Some((bucket, node))), true)
    }

    /// Insert every key of `keys`; returns how many were new.
    pub fn insert_all<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        keys.into_iter()
            .map(|k| self.insert(k).1)
            .filter(|&inserted| inserted)
            .count()
    }

    /// Remove the key equal to `q`, returning it.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let key = self.table.remove(hash, q)?;
        self.touch();
        if self.policy.should_shrink(self.len(), self.buckets()) {
            self.auto_rehash(self.len(), ResizeKind::Shrink);
        }
        Some(key)
    }

    /// Remove the key equal to `q`; returns the number of keys removed (0 or 1).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.take(q).is_some())
    }

    /// The stored key equal to `q`.
    pub fn lookup<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let node = self.table.locate(hash, q)?;
        self.table.node(node).map(|n| &n.key)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.locate(hash, q).is_some()
    }

    /// Number of stored keys equal to `q` (0 or 1).
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains(q))
    }

    /// Cursor at the key equal to `q`, or [`end`](Self::end).
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let pos = self
            .table
            .locate(hash, q)
            .map(|node| (self.table.index_of(hash), node));
        Cursor::at(self.stamp, pos)
    }

    /// Drop every key and return to `min_buckets` buckets.
    pub fn clear(&mut self) {
        self.table = ChainTable::new(self.policy.min_buckets);
        self.touch();
    }

    /// Exchange contents, hashers, policies and observers in O(1). Cursors
    /// follow the storage they were issued for.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Rebuild with at least `min_buckets` buckets (bounded below by the
    /// policy floor and the max load factor).
    ///
    /// # Panics
    /// Panics if the bucket array cannot be allocated; see
    /// [`try_rehash`](Self::try_rehash) for the fallible form.
    pub fn rehash(&mut self, min_buckets: usize) {
        if let Err(e) = self.try_rehash(min_buckets) {
            panic!("{e}");
        }
    }

    /// Like [`rehash`](Self::rehash), but reports allocation failure. On error
    /// the set is unchanged.
    pub fn try_rehash(&mut self, min_buckets: usize) -> Result<(), AllocError> {
        self.rehash_to(min_buckets, ResizeKind::Explicit)
    }

    fn rehash_to(&mut self, requested: usize, kind: ResizeKind) -> Result<(), AllocError> {
        let old_buckets = self.buckets();
        let new_buckets = self.policy.target(requested, self.len());
        if new_buckets == old_buckets {
            return Ok(());
        }
        self.table
            .relink(new_buckets)
            .map_err(|source| AllocError {
                buckets: new_buckets,
                source,
            })?;
        self.touch();

        let event = ResizeEvent {
            kind,
            old_buckets,
            new_buckets,
            len: self.len(),
            max_chain_len: self.table.max_chain_len(),
        };
        tracing::debug!(
            ?kind,
            old_buckets,
            new_buckets,
            len = event.len,
            max_chain_len = event.max_chain_len,
            "rehashed bucket array"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_resize(&event);
        }
        Ok(())
    }

    // Automatic resizes are an optimization; the current array stays valid
    // if the new one cannot be allocated.
    fn auto_rehash(&mut self, requested: usize, kind: ResizeKind) {
        if let Err(e) = self.rehash_to(requested, kind) {
            tracing::warn!(?kind, error = %e, "resize skipped");
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            len: self.len(),
            buckets: self.buckets(),
            max_chain_len: self.table.max_chain_len(),
            empty_buckets: self.table.empty_buckets(),
            load_factor: self.len() as f64 / self.buckets() as f64,
            mutations: self.mutations,
        }
    }

    /// Deliver a [`ResizeEvent`] to `observer` after every rehash.
    pub fn set_observer<O>(&mut self, observer: O)
    where
        O: ResizeObserver + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Cursor at the first key in iteration order, or `end()` when empty.
    pub fn begin(&self) -> Cursor {
        Cursor::at(self.stamp, self.table.first_from(0))
    }

    pub fn end(&self) -> Cursor {
        Cursor::at(self.stamp, None)
    }

    fn check(&self, cursor: &Cursor) -> Result<Position, CursorError> {
        if cursor.stamp != self.stamp {
            return Err(CursorError::Stale);
        }
        cursor.pos.ok_or(CursorError::End)
    }

    /// Key under `cursor`.
    pub fn get(&self, cursor: &Cursor) -> Result<&K, CursorError> {
        let pos = self.check(cursor)?;
        self.table
            .node(pos.node)
            .map(|n| &n.key)
            .ok_or(CursorError::Stale)
    }

    /// Move `cursor` to the next key in iteration order (or to the end).
    pub fn advance(&self, cursor: &mut Cursor) -> Result<(), CursorError> {
        let pos = self.check(cursor)?;
        *cursor = Cursor::at(self.stamp, self.table.successor(pos.bucket, pos.node));
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self)
    where
        K: core::fmt::Debug,
    {
        self.table.assert_consistent();
        assert!(self.buckets() >= self.policy.min_buckets);
    }

    /// Keys in bucket order, each chain from its most recent insert.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.table.keys(),
        }
    }

    /// `(bucket index, key)` for every stored key, in iteration order.
    pub fn bucket_entries(&self) -> impl Iterator<Item = (usize, &K)> + Clone + '_ {
        let table = &self.table;
        (0..table.bucket_count()).flat_map(move |i| table.chain(i).map(move |n| (i, &n.key)))
    }

    /// Iteration order materialized once.
    pub fn snapshot(&self) -> Vec<&K> {
        self.iter().collect()
    }

    /// Whether `a` and `b` are neighbours, in either order, in iteration order.
    pub fn adjacent<Q>(&self, a: &Q, b: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.snapshot().windows(2).any(|w| {
            let x = <K as Borrow<Q>>::borrow(w[0]);
            let y = <K as Borrow<Q>>::borrow(w[1]);
            (x == a && y == b) || (x == b && y == a)
        })
    }

    /// Per-bucket diagnostic rendering, see [`Dump`].
    pub fn dump(&self) -> Dump<impl Iterator<Item = (usize, &K)> + Clone + '_>
    where
        K: Display,
    {
        Dump::new(self.buckets(), self.bucket_entries())
    }

    pub fn dump_to<W>(&self, out: &mut W) -> io::Result<()>
    where
        W: io::Write,
        K: Display,
    {
        write!(out, "{}", self.dump())
    }
}

impl<K, S> Clone for ChainSet<K, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    /// Deep copy into fresh storage, then normalize the bucket count to the
    /// copied length. The observer is not copied.
    fn clone(&self) -> Self {
        let mut table = ChainTable::new(self.policy.min_buckets);
        for node in self.table.keys() {
            table.prepend(node.key.clone(), node.hash);
        }
        let mut copy = Self {
            hasher: self.hasher.clone(),
            table,
            policy: self.policy,
            stamp: Stamp::fresh(),
            mutations: 0,
            observer: None,
        };
        let len = copy.len();
        copy.auto_rehash(len, ResizeKind::Normalize);
        copy
    }
}

impl<K, S> PartialEq for ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && other.iter().all(|k| self.contains(k))
    }
}

impl<K, S> Eq for ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
}

impl<K, S> fmt::Debug for ChainSet<K, S>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.table.keys().map(|n| &n.key))
            .finish()
    }
}

impl<K, S> FromIterator<K> for ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.insert_all(keys);
        let len = set.len();
        set.auto_rehash(len, ResizeKind::Normalize);
        set
    }
}

impl<K, S> Extend<K> for ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        self.insert_all(keys);
    }
}

impl<'a, K, S> Extend<&'a K> for ChainSet<K, S>
where
    K: Eq + Hash + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, keys: I) {
        self.insert_all(keys.into_iter().copied());
    }
}

/// Iterator over the keys of a [`ChainSet`].
pub struct Iter<'a, K> {
    it: Keys<'a, K>,
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|n| &n.key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

/// Owning iterator over the keys of a [`ChainSet`], in unspecified order.
pub struct IntoIter<K> {
    it: IntoKeys<K>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, S> IntoIterator for &'a ChainSet<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, S> IntoIterator for ChainSet<K, S> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_keys(),
        }
    }
}
