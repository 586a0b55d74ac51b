use core::time::Duration;
use std::time::Instant;

use crate::ConfigError;

/// Default quiet period: the smallest tick the timers resolve.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1);

/// Timing and size limits that decide when an open batch is released.
///
/// A batch opens with its first item and is sealed when one of the following
/// holds:
///
/// - no item arrived for `default_delay` **and** the batch has been open for
///   at least `min_delay`
/// - the batch has been open for `max_delay`, however busy it is
/// - it holds `max_count` items
///
/// `max_delay` always wins over `min_delay` when the two conflict.
///
/// # Example
///
/// ```
/// use ferrobatch::BatchPolicy;
/// use std::time::Duration;
///
/// let policy = BatchPolicy::new(Duration::from_millis(100))
///     .with_default_delay(Duration::from_millis(10))
///     .with_min_delay(Duration::from_millis(5))
///     .with_max_count(64);
///
/// assert!(policy.validate().is_ok());
/// assert_eq!(policy.max_count(), Some(64));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchPolicy {
    #[cfg_attr(feature = "serde", serde(default = "default_delay"))]
    default_delay: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    min_delay: Duration,
    max_delay: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    max_count: Option<usize>,
}

#[cfg(feature = "serde")]
const fn default_delay() -> Duration {
    DEFAULT_DELAY
}

impl BatchPolicy {
    /// Creates a policy with the required upper bound on how long a batch may
    /// stay open.
    ///
    /// The quiet period defaults to [`DEFAULT_DELAY`], the minimum window to
    /// zero and the item count is unbounded.
    pub const fn new(max_delay: Duration) -> Self {
        Self {
            default_delay: DEFAULT_DELAY,
            min_delay: Duration::ZERO,
            max_delay,
            max_count: None,
        }
    }

    /// Sets how long the batch must go without a new arrival before it fires.
    #[must_use]
    pub const fn with_default_delay(mut self, default_delay: Duration) -> Self {
        self.default_delay = default_delay;
        self
    }

    /// Sets the minimum time a batch stays open after its first item.
    #[must_use]
    pub const fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Caps the number of items per batch. Reaching the cap seals the batch
    /// without waiting for any delay.
    #[must_use]
    pub const fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub const fn default_delay(&self) -> Duration {
        self.default_delay
    }

    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub const fn max_count(&self) -> Option<usize> {
        self.max_count
    }

    /// Checks the policy for values that can never produce a batch.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidMaxDelay`] if `max_delay` is zero
    /// - [`ConfigError::InvalidMaxCount`] if `max_count` is `Some(0)`
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_delay.is_zero() {
            return Err(ConfigError::InvalidMaxDelay);
        }
        if let Some(0) = self.max_count {
            return Err(ConfigError::InvalidMaxCount);
        }
        Ok(())
    }

    /// Returns `true` once a batch of `len` items must be sealed on size alone.
    pub fn is_full(&self, len: usize) -> bool {
        self.max_count.is_some_and(|max| len >= max)
    }

    /// Computes how much longer an open batch should wait before firing.
    ///
    /// ```text
    /// next = min(max_delay - age, max(min_delay - age, default_delay - quiet))
    /// ```
    ///
    /// where `age` is the time since `created_at` and `quiet` the time since
    /// `last_arrival_at`. An overdue batch gets [`Duration::ZERO`], never a
    /// negative wait.
    pub fn next_wait(
        &self,
        created_at: Instant,
        last_arrival_at: Instant,
        now: Instant,
    ) -> Duration {
        let age = now.saturating_duration_since(created_at);
        let quiet = now.saturating_duration_since(last_arrival_at);

        // Clamping each term at zero gives the same result as clamping the
        // signed formula, since min/max commute with a monotone clamp.
        let until_max = self.max_delay.saturating_sub(age);
        let until_min = self.min_delay.saturating_sub(age);
        let until_quiet = self.default_delay.saturating_sub(quiet);

        until_max.min(until_min.max(until_quiet))
    }
}
