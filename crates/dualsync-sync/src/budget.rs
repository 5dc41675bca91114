//! Time budget governor
//!
//! The hosting scheduler kills a background run after ten minutes, so a
//! time-boxed run stops cooperatively once nine minutes have elapsed. The
//! clock is tokio's, which tests can pause and advance.

use std::time::Duration;

use tokio::time::Instant;

/// Wall-clock budget of one run
pub const TIME_BUDGET: Duration = Duration::from_secs(9 * 60);

/// Start instant plus limit for the current run
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    /// Starts the clock now
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// True once the elapsed time has reached the limit
    pub fn is_exhausted(&self) -> bool {
        self.elapsed() >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_not_exhausted_before_limit() {
        let deadline = Deadline::start(TIME_BUDGET);
        tokio::time::advance(Duration::from_secs(8 * 60 + 59)).await;
        assert!(!deadline.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_at_limit() {
        let deadline = Deadline::start(TIME_BUDGET);
        tokio::time::advance(TIME_BUDGET).await;
        assert!(deadline.is_exhausted());
        assert!(deadline.elapsed() >= deadline.limit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_is_exhausted_immediately() {
        let deadline = Deadline::start(Duration::ZERO);
        assert!(deadline.is_exhausted());
    }
}
