//! Diagnostic bucket dump.
//!
//! Renders one line per bucket, `index: k1 -> k2 -> ...`, or `index: -` for
//! an empty bucket. The printer only consumes `(bucket index, key)` pairs in
//! bucket order; it knows nothing about how the set stores them.

use core::fmt::{self, Display, Formatter};

/// `Display` adapter returned by [`ChainSet::dump`](crate::ChainSet::dump).
pub struct Dump<I> {
    buckets: usize,
    entries: I,
}

impl<I> Dump<I> {
    /// `entries` must be sorted by bucket index, each below `buckets`.
    pub fn new(buckets: usize, entries: I) -> Self {
        Self { buckets, entries }
    }
}

impl<'a, I, K> Display for Dump<I>
where
    I: Iterator<Item = (usize, &'a K)> + Clone,
    K: Display + 'a,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut entries = self.entries.clone().peekable();
        for i in 0..self.buckets {
            write!(f, "{i}: ")?;
            let mut first = true;
            while let Some((_, key)) = entries.next_if(|(b, _)| *b == i) {
                if !first {
                    f.write_str(" -> ")?;
                }
                write!(f, "{key}")?;
                first = false;
            }
            if first {
                f.write_str("-")?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
