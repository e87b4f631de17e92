//! Poll timing, consecutive-failure accounting and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Timing of the creation wait and update propagation loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before each status read while waiting for creation.
    pub create_interval: Duration,
    /// Total time budget for the creation wait.
    pub create_timeout: Duration,
    /// Delay before each propagation read after an update.
    pub update_delay: Duration,
    /// Number of propagation reads after an update.
    pub update_iterations: u32,
    /// Consecutive failed reads tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            create_interval: Duration::from_secs(30),
            create_timeout: Duration::from_secs(30 * 60),
            update_delay: Duration::from_secs(2),
            update_iterations: 10,
            max_consecutive_failures: 3,
        }
    }
}

impl PollSettings {
    /// Number of successful status reads allowed during the creation wait.
    pub fn create_poll_limit(&self) -> u32 {
        let interval = self.create_interval.as_nanos();
        if interval == 0 {
            return 0;
        }
        u32::try_from(self.create_timeout.as_nanos() / interval).unwrap_or(u32::MAX)
    }
}

/// Counts consecutive failures against a fixed limit.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    limit: u32,
    consecutive: u32,
}

impl FailureBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive: 0,
        }
    }

    /// Records a failure. Returns `true` once the limit is reached.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.limit
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// Shared flag used to stop a running operation between polls.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
