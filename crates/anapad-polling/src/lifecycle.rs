use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use anapad_errors::{AnapadError, ErrorSeverity};

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// Not started, or stopped
    Stopped = 0,
    /// Opening the bus and configuring chips
    Starting = 1,
    /// Polling thread active
    Running = 2,
    /// Polling thread gave up after sustained failures; stop is still
    /// required to release the bus
    Failed = 3,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::Failed,
            _ => LifecycleState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Stopped => write!(f, "stopped"),
            LifecycleState::Starting => write!(f, "starting"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle state readable from any thread.
#[derive(Debug)]
pub struct SharedLifecycle {
    state: AtomicU8,
}

impl Default for SharedLifecycle {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Stopped as u8),
        }
    }
}

impl SharedLifecycle {
    /// Current state.
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `state`.
    pub fn set(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Sent once to failure subscribers when a polling loop gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollFailure {
    /// Subsystem whose loop exited
    pub subsystem: &'static str,
    /// Consecutive failures at the trip point
    pub consecutive_failures: u32,
    /// Display form of the last error
    pub last_error: String,
    /// Severity of the last error
    pub severity: ErrorSeverity,
}

impl PollFailure {
    /// Failure report for `subsystem` built from its last error.
    pub fn new(subsystem: &'static str, consecutive_failures: u32, last_error: &AnapadError) -> Self {
        Self {
            subsystem,
            consecutive_failures,
            last_error: last_error.to_string(),
            severity: last_error.severity(),
        }
    }
}

impl fmt::Display for PollFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} polling stopped after {} consecutive failures (last: {})",
            self.subsystem, self.consecutive_failures, self.last_error
        )
    }
}
