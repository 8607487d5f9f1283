//! Bounded measurement retry.
//!
//! Layout measurement can be transiently wrong (zero sizes before the host
//! has laid content out, fonts still swapping). Components that depend on a
//! measurement poll it through a `MeasureRetry`: each frame the measurement
//! closure re-runs until it yields a valid value or the attempt budget is
//! exhausted, after which the last value is used best-effort. Measurement
//! trouble is recovered locally, never surfaced as a hard error.

use tracing::{debug, warn};

/// Result of one retry poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurePoll<T> {
    /// The measurement passed validation.
    Valid(T),
    /// Invalid this frame; poll again next frame.
    Retry,
    /// Budget spent; proceed with this best-effort value.
    Exhausted(T),
}

impl<T> MeasurePoll<T> {
    /// The value to proceed with, if this poll yielded one.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Valid(value) | Self::Exhausted(value) => Some(value),
            Self::Retry => None,
        }
    }
}

/// Per-frame retry state with a fixed attempt budget.
#[derive(Debug, Clone)]
pub struct MeasureRetry {
    max_attempts: u32,
    attempts: u32,
}

impl MeasureRetry {
    /// Retry state allowing `max_attempts` polls.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: 0,
        }
    }

    /// Run the measurement once and classify the result.
    pub fn poll<T>(
        &mut self,
        measure: impl FnOnce() -> T,
        valid: impl FnOnce(&T) -> bool,
    ) -> MeasurePoll<T> {
        let value = measure();
        if valid(&value) {
            return MeasurePoll::Valid(value);
        }
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            warn!(
                attempts = self.attempts,
                "measurement still invalid after retry budget, proceeding best-effort"
            );
            MeasurePoll::Exhausted(value)
        } else {
            debug!(attempt = self.attempts, "measurement invalid, will retry");
            MeasurePoll::Retry
        }
    }

    /// Attempts consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the budget has been spent.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Reset for a fresh measurement cycle (after a refresh or resize).
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_on_first_poll() {
        let mut retry = MeasureRetry::new(3);
        let poll = retry.poll(|| 120.0, |w| *w > 0.0);
        assert_eq!(poll, MeasurePoll::Valid(120.0));
        assert_eq!(retry.attempts(), 0);
    }

    #[test]
    fn retries_then_succeeds() {
        let mut retry = MeasureRetry::new(5);
        let mut width = 0.0;

        assert_eq!(retry.poll(|| width, |w| *w > 0.0), MeasurePoll::Retry);
        assert_eq!(retry.poll(|| width, |w| *w > 0.0), MeasurePoll::Retry);

        width = 300.0;
        assert_eq!(retry.poll(|| width, |w| *w > 0.0), MeasurePoll::Valid(300.0));
        assert!(!retry.exhausted());
    }

    #[test]
    fn exhausts_to_best_effort() {
        let mut retry = MeasureRetry::new(2);
        assert_eq!(retry.poll(|| 0.0, |w| *w > 0.0), MeasurePoll::Retry);
        let poll = retry.poll(|| 0.0, |w| *w > 0.0);
        assert_eq!(poll, MeasurePoll::Exhausted(0.0));
        assert!(retry.exhausted());
        assert_eq!(poll.into_value(), Some(0.0));
    }

    #[test]
    fn reset_restores_budget() {
        let mut retry = MeasureRetry::new(1);
        retry.poll(|| 0.0, |w| *w > 0.0);
        assert!(retry.exhausted());
        retry.reset();
        assert!(!retry.exhausted());
    }
}
