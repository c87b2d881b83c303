//! Building blocks shared by the anapad polling controllers.
//!
//! - [`PollingThread`]: a named OS thread driven by a [`StopToken`], stopped
//!   with a bounded wait.
//! - [`FailureTracker`]: consecutive-failure counting with a trip threshold.
//! - [`Listeners`]: fan-out of produced values over bounded channels.
//! - [`PendingResults`]: one-shot "next value" futures, each fulfilled once.
//! - [`Latest`]: most recent value, published with acquire/release
//!   visibility to any reader thread.
//! - [`TouchPresence`]: the one signal passed between subsystems, telling the
//!   load surface whether a touch is down.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

mod failure;
mod latest;
mod lifecycle;
mod listeners;
mod pending;
mod signal;
mod thread;

pub use failure::{DEFAULT_FAILURE_THRESHOLD, FailureTracker, FailureVerdict};
pub use latest::Latest;
pub use lifecycle::{LifecycleState, PollFailure, SharedLifecycle};
pub use listeners::{DEFAULT_LISTENER_CAPACITY, Listeners};
pub use pending::PendingResults;
pub use signal::{NeverTouched, TouchPresence, TouchSignal};
pub use thread::{DEFAULT_STOP_TIMEOUT, PollingThread, StopToken};

/// One-shot receiver returned by [`PendingResults::register`].
pub use tokio::sync::oneshot::Receiver as OneShot;

/// Subscription returned by [`Listeners::subscribe`].
pub use crossbeam::channel::Receiver as Subscription;
