//! Wall-clock exponential smoothing.
//!
//! Each update moves the value towards the input by a fraction equal to the
//! elapsed milliseconds divided by the smoothing factor:
//!
//! ```text
//! value += elapsed_ms * (input - value) / smoothing_factor
//! ```
//!
//! The first input seeds the value directly, so the startup transient is a
//! step to the first sample followed by smoothing. The step fraction is
//! capped at 1 so a long pause lands on the input instead of overshooting it.

use std::time::{Duration, Instant};

/// Smoothing factor for the per-sample filter, in milliseconds.
pub const ALL_SAMPLES_SMOOTHING_MS: f64 = 25.0;

/// Smoothing factor for the unloaded-baseline filter, in milliseconds.
pub const BASELINE_SMOOTHING_MS: f64 = 100.0;

/// Elapsed-time low-pass filter over one scalar.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    smoothing_factor: f64,
    value: Option<f64>,
    last_update: Option<Instant>,
}

impl LowPassFilter {
    /// Create a filter with `smoothing_factor` milliseconds.
    ///
    /// Non-finite or non-positive factors fall back to 1 ms, which makes the
    /// filter follow its input after any measurable elapsed time.
    pub fn new(smoothing_factor: f64) -> Self {
        let smoothing_factor = if smoothing_factor.is_finite() && smoothing_factor > 0.0 {
            smoothing_factor
        } else {
            1.0
        };
        Self {
            smoothing_factor,
            value: None,
            last_update: None,
        }
    }

    /// Fast filter applied to every force sample.
    pub fn all_samples() -> Self {
        Self::new(ALL_SAMPLES_SMOOTHING_MS)
    }

    /// Slow filter tracking the unloaded baseline.
    pub fn baseline() -> Self {
        Self::new(BASELINE_SMOOTHING_MS)
    }

    /// Filter `input` using the time since the previous call.
    #[inline]
    pub fn filter(&mut self, input: f64) -> f64 {
        self.filter_at(input, Instant::now())
    }

    /// Filter `input` observed at `now`.
    ///
    /// A `now` earlier than the previous update counts as zero elapsed time.
    #[inline]
    pub fn filter_at(&mut self, input: f64, now: Instant) -> f64 {
        let elapsed = self
            .last_update
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_update = Some(self.last_update.map_or(now, |last| last.max(now)));
        self.filter_elapsed(input, elapsed)
    }

    /// Filter `input` given an explicit elapsed time.
    #[inline]
    pub fn filter_elapsed(&mut self, input: f64, elapsed: Duration) -> f64 {
        let next = match self.value {
            None => input,
            Some(value) => {
                let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
                let fraction = (elapsed_ms / self.smoothing_factor).min(1.0);
                value + fraction * (input - value)
            }
        };
        self.value = Some(next);
        next
    }

    /// Current filtered value, or `None` before the first input.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Smoothing factor in milliseconds.
    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor
    }

    /// Forget the value so the next input seeds it again.
    pub fn clear(&mut self) {
        self.value = None;
        self.last_update = None;
    }
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::all_samples()
    }
}
