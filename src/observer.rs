//! Resize telemetry: events delivered to an optional observer, and a
//! point-in-time `Stats` snapshot.

/// Why the bucket array was rebuilt.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResizeKind {
    /// Longest chain and load factor both crossed the grow thresholds after an insert.
    Grow,
    /// Load factor fell below the shrink threshold after an erase.
    Shrink,
    /// Load normalization after a bulk build (`clone`, `FromIterator`).
    Normalize,
    /// Requested through `rehash`/`try_rehash`.
    Explicit,
}

/// A completed rehash.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ResizeEvent {
    pub kind: ResizeKind,
    pub old_buckets: usize,
    pub new_buckets: usize,
    pub len: usize,
    /// Longest chain in the rebuilt array.
    pub max_chain_len: usize,
}

/// Receives a [`ResizeEvent`] after every rehash of the set it is attached to.
pub trait ResizeObserver {
    fn on_resize(&mut self, event: &ResizeEvent);
}

impl<F> ResizeObserver for F
where
    F: FnMut(&ResizeEvent),
{
    fn on_resize(&mut self, event: &ResizeEvent) {
        (*self)(event)
    }
}

/// Shape of the table at one point in time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stats {
    pub len: usize,
    pub buckets: usize,
    /// Longest chain since the last rebuild; erases do not lower it.
    pub max_chain_len: usize,
    pub empty_buckets: usize,
    pub load_factor: f64,
    /// Structural changes since construction: new keys, erased keys,
    /// effective rehashes (automatic ones included) and clears.
    pub mutations: u64,
}
