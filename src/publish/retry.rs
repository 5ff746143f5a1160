use std::time;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Bounded exponential backoff for failed sink writes.
pub struct RetryPolicy {
    /// Total number of attempts per write, including the first one.
    max_attempts: u32,
    /// Coefficient to multiply initial_interval with for every past retry.
    backoff_coefficient: u32,
    /// The backoff interval before the first retry.
    initial_interval: time::Duration,
    /// The maximum possible backoff between retries.
    maximum_interval: Option<time::Duration>,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff_coefficient: u32,
        initial_interval: time::Duration,
        maximum_interval: Option<time::Duration>,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_coefficient,
            initial_interval,
            maximum_interval,
        }
    }

    /// A policy that gives up after the first failure.
    pub fn no_retry() -> Self {
        Self::new(1, 1, time::Duration::ZERO, None)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Time to wait before retry number `retry` (0-based).
    pub fn time_until_next_retry(&self, retry: u32) -> time::Duration {
        let factor = self.backoff_coefficient.saturating_pow(retry);
        let candidate_interval = self.initial_interval.saturating_mul(factor);

        match self.maximum_interval {
            Some(max_interval) => std::cmp::min(candidate_interval, max_interval),
            None => candidate_interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_coefficient: 2,
            initial_interval: time::Duration::from_millis(500),
            maximum_interval: Some(time::Duration::from_secs(5)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_backoff_doubles_until_capped() {
        let policy = RetryPolicy::new(
            10,
            2,
            Duration::from_millis(500),
            Some(Duration::from_secs(3)),
        );

        assert_eq!(policy.time_until_next_retry(0), Duration::from_millis(500));
        assert_eq!(policy.time_until_next_retry(1), Duration::from_secs(1));
        assert_eq!(policy.time_until_next_retry(2), Duration::from_secs(2));
        assert_eq!(policy.time_until_next_retry(3), Duration::from_secs(3));
        assert_eq!(policy.time_until_next_retry(40), Duration::from_secs(3));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, 2, Duration::ZERO, None).max_attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }
}
