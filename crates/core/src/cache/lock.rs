use std::time::Duration;

use rand::Rng;

/// Acquisition and lease parameters for distributed mutexes.
///
/// The defaults give a waiter roughly 32 × 150ms ≈ 5s before it gives up,
/// which is below the 8s lease so a live holder is never stolen from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockOptions {
    /// How long a held lock survives without being released.
    pub lease: Duration,
    /// Maximum acquisition attempts before failing.
    pub max_tries: u32,
    /// Lower bound of the randomized delay between attempts.
    pub min_retry_delay: Duration,
    /// Upper bound of the randomized delay between attempts.
    pub max_retry_delay: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            lease: Duration::from_secs(8),
            max_tries: 32,
            min_retry_delay: Duration::from_millis(50),
            max_retry_delay: Duration::from_millis(250),
        }
    }
}

impl LockOptions {
    /// Sets the lease duration.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Sets the maximum number of attempts (at least one).
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries.max(1);
        self
    }

    /// Sets the bounds of the delay between attempts.
    pub fn with_retry_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_retry_delay = min.min(max);
        self.max_retry_delay = max.max(min);
        self
    }

    /// Picks a random delay within the configured bounds.
    pub fn retry_delay(&self) -> Duration {
        if self.min_retry_delay >= self.max_retry_delay {
            return self.min_retry_delay;
        }
        let min = self.min_retry_delay.as_millis() as u64;
        let max = self.max_retry_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Lease in whole milliseconds, never zero.
    pub fn lease_millis(&self) -> u64 {
        (self.lease.as_millis() as u64).max(1)
    }
}
