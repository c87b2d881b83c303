/// Consecutive failures tolerated before a loop gives up.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 100;

/// Outcome of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureVerdict {
    /// Keep polling
    Continue {
        /// Consecutive failures so far
        consecutive: u32,
    },
    /// Threshold exceeded; the loop must exit
    Tripped {
        /// Consecutive failures so far
        consecutive: u32,
    },
}

/// Counts consecutive failed ticks.
///
/// The tracker trips when the count *exceeds* the threshold, so with the
/// default of 100 the 101st consecutive failure stops the loop. Any success
/// resets the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTracker {
    threshold: u32,
    consecutive: u32,
}

impl FailureTracker {
    /// Tracker tripping after more than `threshold` consecutive failures.
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Record a successful tick.
    #[inline]
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failed tick.
    #[inline]
    pub fn record_failure(&mut self) -> FailureVerdict {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive > self.threshold {
            FailureVerdict::Tripped {
                consecutive: self.consecutive,
            }
        } else {
            FailureVerdict::Continue {
                consecutive: self.consecutive,
            }
        }
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
