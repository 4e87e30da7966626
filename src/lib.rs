//! chain-hashset: a single-threaded hash set on separately chained buckets,
//! with cursors that detect use after a structural change.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a set with the classic bucket-array-of-chains layout, amortized
//!   O(1) insert/find/erase, and a stable iteration order between changes.
//! - Layers:
//!   - `hashing`: hash/equality policy. A key is hashed once with the set's
//!     `BuildHasher`; its bucket is `hash mod bucket_count`.
//!   - `ChainTable<K>`: bucket array whose chains are threaded through a
//!     `slotmap` arena. Owns every key. Knows nothing about resizing.
//!   - `ResizePolicy`: configurable grow/shrink thresholds.
//!   - `ChainSet<K, S>`: public API. Runs the resize engine after inserts and
//!     erases, stamps its structure with a generation, issues `Cursor`s.
//!
//! Constraints
//! - Single-threaded: `ChainSet` is `!Send`/`!Sync` (it can hold a boxed
//!   observer); no locking anywhere.
//! - Unique keys; a duplicate insert returns the stored key's cursor.
//! - Chains own their nodes through the arena only, so every node is
//!   released exactly once: on erase, `clear`, or drop of the set.
//!
//! Hashing and rehashing
//! - Each node stores its precomputed `u64` hash and rebuilding the bucket
//!   array relinks nodes by that hash; `K: Hash` is never invoked after
//!   insertion and a node keeps its arena slot across rehashes.
//! - A rehash allocates the new bucket array before relinking anything. If
//!   that allocation fails the set is unchanged; automatic resizes log the
//!   failure and carry on with the old array.
//!
//! Resize policy
//! - Grow after an insert when the longest chain exceeds `chain_trigger`
//!   (default 9) and `len > buckets * max_load_factor` (default 0.85); the
//!   request is `buckets * growth_factor` (default 5.8).
//! - Shrink after an erase when `len < buckets * shrink_load_factor`
//!   (default 0.2); the request is `len`.
//! - Every rehash lands on `max(min_buckets, requested, len / max_load_factor)`.
//! - The longest-chain figure is recomputed only on rehash; erases can
//!   leave it over-estimated, which at worst grows a little early.
//!
//! Cursors
//! - A `Cursor` is (generation stamp, bucket, arena key). Stamps come from a
//!   process-wide counter, so they are unique across sets.
//! - Inserting a new key, erasing a key, rehashing and clearing give the set
//!   a fresh stamp; older cursors then fail with `CursorError::Stale`.
//!
//! Observability
//! - `tracing` events on every rehash (debug) and on skipped resizes (warn).
//! - Optional `ResizeObserver` callback and `stats()` snapshot.
//! - `dump()` renders the bucket layout for debugging.

mod chain;
mod chain_set;
mod chain_set_proptest;
pub mod cursor;
pub mod dump;
pub mod error;
mod hashing;
pub mod observer;
pub mod policy;

// Public surface
pub use chain_set::{ChainSet, IntoIter, Iter};
pub use cursor::Cursor;
pub use dump::Dump;
pub use error::{AllocError, CursorError, PolicyError};
pub use hashing::DefaultHashBuilder;
pub use observer::{ResizeEvent, ResizeKind, ResizeObserver, Stats};
pub use policy::ResizePolicy;
