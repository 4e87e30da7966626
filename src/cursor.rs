//! Cursors: detached positions into a `ChainSet`, checked against a
//! generation stamp on every use.
//!
//! A cursor does not borrow the set. Instead it records the stamp the set
//! carried when the cursor was issued; any structural change gives the set a
//! new stamp, after which the cursor is rejected with `CursorError::Stale`.

use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::DefaultKey;

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Process-unique generation of a set's structure.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Stamp(u64);

impl Stamp {
    pub(crate) fn fresh() -> Self {
        Stamp(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Position {
    pub(crate) bucket: usize,
    pub(crate) node: DefaultKey,
}

/// A position in a [`ChainSet`](crate::ChainSet): either a stored key or the
/// end sentinel.
///
/// Resolve it with [`ChainSet::get`](crate::ChainSet::get) and move it with
/// [`ChainSet::advance`](crate::ChainSet::advance). Two cursors compare equal
/// when they were issued for the same generation and name the same position.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    pub(crate) stamp: Stamp,
    pub(crate) pos: Option<Position>,
}

impl Cursor {
    pub(crate) fn at(stamp: Stamp, pos: Option<(usize, DefaultKey)>) -> Self {
        Self {
            stamp,
            pos: pos.map(|(bucket, node)| Position { bucket, node }),
        }
    }

    /// True for the end sentinel.
    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    /// Bucket index of the key under the cursor, `None` at the end.
    pub fn bucket(&self) -> Option<usize> {
        self.pos.map(|p| p.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn stamps_are_unique() {
        let a = Stamp::fresh();
        let b = Stamp::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn end_cursor_has_no_bucket() {
        let s = Stamp::fresh();
        let end = Cursor::at(s, None);
        assert!(end.is_end());
        assert_eq!(end.bucket(), None);

        let mut arena: SlotMap<DefaultKey, ()> = SlotMap::with_key();
        let k = arena.insert(());
        let c = Cursor::at(s, Some((3, k)));
        assert!(!c.is_end());
        assert_eq!(c.bucket(), Some(3));
        assert_ne!(c, end);
    }

    /// Invariant: equal positions from different generations are different cursors.
    #[test]
    fn cursors_from_different_generations_differ() {
        assert_ne!(
            Cursor::at(Stamp::fresh(), None),
            Cursor::at(Stamp::fresh(), None)
        );
    }
}
