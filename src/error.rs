//! Error types for cursor access, policy configuration and bucket allocation.

use std::collections::TryReserveError;

use derive_more::{Display, Error};

/// Failure to resolve or move a [`Cursor`](crate::Cursor).
#[derive(Copy, Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum CursorError {
    /// The set was structurally modified (or is a different set) since the
    /// cursor was issued.
    #[display("stale cursor: the set changed after this cursor was issued")]
    Stale,
    /// The cursor is the end sentinel and has no key.
    #[display("cursor is positioned past the last key")]
    End,
}

/// Rejected [`ResizePolicy`](crate::ResizePolicy) parameters.
#[derive(Copy, Clone, Debug, Display, Error, PartialEq)]
pub enum PolicyError {
    #[display("minimum bucket count must be at least 1")]
    ZeroMinBuckets,
    #[display("max load factor must be finite and at least 0.01, got {value}")]
    MaxLoadFactor { value: f64 },
    #[display("shrink load factor must lie in [0, {max_load_factor}), got {value}")]
    ShrinkLoadFactor { value: f64, max_load_factor: f64 },
    #[display("growth factor must be finite and greater than 1, got {value}")]
    GrowthFactor { value: f64 },
}

/// The bucket array for a rehash could not be allocated. The set is left
/// exactly as it was before the attempt.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("failed to allocate {buckets} buckets: {source}")]
pub struct AllocError {
    pub buckets: usize,
    pub source: TryReserveError,
}
