//! Resize policy: when and to what size the bucket array is rebuilt.
//!
//! Separate chaining stays correct at any load, so these thresholds only
//! trade memory for chain length. Defaults are the empirically tuned values
//! the container has always used; none of them is known to be optimal.

use crate::error::PolicyError;

pub const DEFAULT_MIN_BUCKETS: usize = 1;
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.85;
pub const DEFAULT_CHAIN_TRIGGER: usize = 9;
pub const DEFAULT_SHRINK_LOAD_FACTOR: f64 = 0.2;
pub const DEFAULT_GROWTH_FACTOR: f64 = 5.8;
/// Smallest accepted `max_load_factor`. Below it `len / max_load_factor`
/// asks for bucket arrays that can never be allocated.
pub const MIN_MAX_LOAD_FACTOR: f64 = 0.01;

/// Thresholds driving automatic grow and shrink.
///
/// Grow when the longest chain exceeds `chain_trigger` *and* the load factor
/// exceeds `max_load_factor`; shrink when the load factor drops below
/// `shrink_load_factor`. The bucket count never drops below `min_buckets`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResizePolicy {
    pub min_buckets: usize,
    pub max_load_factor: f64,
    pub chain_trigger: usize,
    pub shrink_load_factor: f64,
    pub growth_factor: f64,
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self {
            min_buckets: DEFAULT_MIN_BUCKETS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            chain_trigger: DEFAULT_CHAIN_TRIGGER,
            shrink_load_factor: DEFAULT_SHRINK_LOAD_FACTOR,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl ResizePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_buckets(mut self, min_buckets: usize) -> Self {
        self.min_buckets = min_buckets;
        self
    }

    pub fn with_max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn with_chain_trigger(mut self, chain_trigger: usize) -> Self {
        self.chain_trigger = chain_trigger;
        self
    }

    pub fn with_shrink_load_factor(mut self, shrink_load_factor: f64) -> Self {
        self.shrink_load_factor = shrink_load_factor;
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Check that the thresholds describe a usable policy.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_buckets == 0 {
            return Err(PolicyError::ZeroMinBuckets);
        }
        if !self.max_load_factor.is_finite() || self.max_load_factor < MIN_MAX_LOAD_FACTOR {
            return Err(PolicyError::MaxLoadFactor {
                value: self.max_load_factor,
            });
        }
        // Written so that NaN fails as well.
        if !(self.shrink_load_factor >= 0.0 && self.shrink_load_factor < self.max_load_factor) {
            return Err(PolicyError::ShrinkLoadFactor {
                value: self.shrink_load_factor,
                max_load_factor: self.max_load_factor,
            });
        }
        if !self.growth_factor.is_finite() || self.growth_factor <= 1.0 {
            return Err(PolicyError::GrowthFactor {
                value: self.growth_factor,
            });
        }
        Ok(())
    }

    pub(crate) fn should_grow(&self, len: usize, buckets: usize, max_chain_len: usize) -> bool {
        max_chain_len > self.chain_trigger && len as f64 > buckets as f64 * self.max_load_factor
    }

    pub(crate) fn should_shrink(&self, len: usize, buckets: usize) -> bool {
        (len as f64) < buckets as f64 * self.shrink_load_factor
    }

    /// Bucket count requested by a grow from `buckets`.
    pub(crate) fn grown(&self, buckets: usize) -> usize {
        let scaled = buckets as f64 * self.growth_factor;
        // Saturating float-to-int cast; always make progress.
        (scaled as usize).max(buckets.saturating_add(1))
    }

    /// Bucket count for a rehash requesting at least `requested` buckets while
    /// holding `len` keys: never below the floor, never above `max_load_factor`.
    pub(crate) fn target(&self, requested: usize, len: usize) -> usize {
        let by_load = (len as f64 / self.max_load_factor) as usize;
        self.min_buckets.max(requested).max(by_load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_constants() {
        let p = ResizePolicy::default();
        assert_eq!(p.min_buckets, 1);
        assert_eq!(p.chain_trigger, 9);
        assert_eq!(p.max_load_factor, 0.85);
        assert_eq!(p.shrink_load_factor, 0.2);
        assert_eq!(p.growth_factor, 5.8);
        assert!(p.validate().is_ok());
    }

    /// Invariant: growth needs both a long chain and a high load factor.
    #[test]
    fn grow_requires_long_chain_and_high_load() {
        let p = ResizePolicy::default();
        assert!(!p.should_grow(10, 1, 9));
        assert!(p.should_grow(10, 1, 10));
        // Long chain but load below 0.85.
        assert!(!p.should_grow(16, 20, 12));
        assert!(p.should_grow(18, 20, 12));
    }

    #[test]
    fn shrink_below_fifth_of_capacity() {
        let p = ResizePolicy::default();
        assert!(p.should_shrink(19, 100));
        assert!(!p.should_shrink(20, 100));
        assert!(!p.should_shrink(0, 0));
    }

    #[test]
    fn grown_scales_and_always_progresses() {
        let p = ResizePolicy::default();
        assert_eq!(p.grown(10), 58);
        assert_eq!(p.grown(1), 5);
        let slow = ResizePolicy::default().with_growth_factor(1.01);
        assert_eq!(slow.grown(3), 4);
        assert_eq!(p.grown(usize::MAX), usize::MAX);
    }

    /// Invariant: the target never falls below the floor or the load bound.
    #[test]
    fn target_respects_floor_and_load() {
        let p = ResizePolicy::default().with_min_buckets(8);
        assert_eq!(p.target(0, 0), 8);
        assert_eq!(p.target(3, 2), 8);
        assert_eq!(p.target(100, 10), 100);
        assert_eq!(p.target(10, 85), 100);
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let base = ResizePolicy::default();
        assert_eq!(
            base.with_min_buckets(0).validate(),
            Err(PolicyError::ZeroMinBuckets)
        );
        assert!(matches!(
            base.with_max_load_factor(0.0).validate(),
            Err(PolicyError::MaxLoadFactor { .. })
        ));
        assert!(matches!(
            base.with_max_load_factor(1e-300).validate(),
            Err(PolicyError::MaxLoadFactor { .. })
        ));
        assert!(base
            .with_max_load_factor(MIN_MAX_LOAD_FACTOR)
            .with_shrink_load_factor(0.0)
            .validate()
            .is_ok());
        assert!(matches!(
            base.with_max_load_factor(f64::INFINITY).validate(),
            Err(PolicyError::MaxLoadFactor { .. })
        ));
        assert!(matches!(
            base.with_shrink_load_factor(0.9).validate(),
            Err(PolicyError::ShrinkLoadFactor { .. })
        ));
        assert!(matches!(
            base.with_shrink_load_factor(f64::NAN).validate(),
            Err(PolicyError::ShrinkLoadFactor { .. })
        ));
        assert!(matches!(
            base.with_growth_factor(1.0).validate(),
            Err(PolicyError::GrowthFactor { .. })
        ));
        assert!(base
            .with_min_buckets(16)
            .with_max_load_factor(2.0)
            .with_chain_trigger(3)
            .with_shrink_load_factor(0.5)
            .with_growth_factor(2.0)
            .validate()
            .is_ok());
    }
}
