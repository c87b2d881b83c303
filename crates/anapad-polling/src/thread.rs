use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anapad_errors::{AnapadError, AnapadResult};
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use tracing::{debug, error, info, warn};

/// Bounded wait used when stopping a polling thread.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Cooperative cancellation flag checked once per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// A token that has not been stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the owning loop to exit.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a stop was requested.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A dedicated polling thread.
///
/// The body receives a [`StopToken`] and returns a value (typically the
/// hardware it owned) once it exits, either because a stop was requested or
/// because it gave up on its own. [`stop`](Self::stop) hands that value back
/// if the thread finishes within the timeout.
#[derive(Debug)]
pub struct PollingThread<R> {
    name: String,
    stop: StopToken,
    done: Receiver<R>,
    handle: Option<JoinHandle<()>>,
}

impl<R: Send + 'static> PollingThread<R> {
    /// Spawn `body` on a thread called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::ThreadSpawn`] if the OS refuses the thread.
    pub fn spawn<F>(name: impl Into<String>, body: F) -> AnapadResult<Self>
    where
        F: FnOnce(StopToken) -> R + Send + 'static,
    {
        let name = name.into();
        let stop = StopToken::new();
        let (done_tx, done) = channel::bounded(1);
        let token = stop.clone();
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let result = body(token);
                if done_tx.send(result).is_err() {
                    debug!(thread = %thread_name, "nobody waiting for polling thread result");
                }
            })
            .map_err(|e| AnapadError::thread_spawn(&name, e))?;

        debug!(thread = %name, "polling thread started");
        Ok(Self {
            name,
            stop,
            done,
            handle: Some(handle),
        })
    }
}

impl<R> PollingThread<R> {
    /// Thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A clone of the thread's stop token.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Whether the body has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Request a stop and wait up to `timeout` for the body to return.
    ///
    /// Returns the body's value, or `None` if it panicked or did not finish
    /// in time. A thread that misses the deadline is detached.
    pub fn stop(mut self, timeout: Duration) -> Option<R> {
        self.stop.request_stop();
        match self.done.recv_timeout(timeout) {
            Ok(result) => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        error!(thread = %self.name, "polling thread panicked after finishing");
                    }
                }
                info!(thread = %self.name, "polling thread stopped cleanly");
                Some(result)
            }
            Err(RecvTimeoutError::Disconnected) => {
                if let Some(handle) = self.handle.take() {
                    if handle.join().is_err() {
                        error!(thread = %self.name, "polling thread panicked");
                    }
                }
                None
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    thread = %self.name,
                    timeout_ms = timeout.as_millis(),
                    "polling thread did not stop in time, detaching"
                );
                drop(self.handle.take());
                None
            }
        }
    }
}

impl<R> Drop for PollingThread<R> {
    fn drop(&mut self) {
        self.stop.request_stop();
    }
}
