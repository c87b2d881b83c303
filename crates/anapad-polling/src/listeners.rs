use std::time::Duration;

use crossbeam::channel::{self, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Default per-subscriber queue depth.
pub const DEFAULT_LISTENER_CAPACITY: usize = 64;

/// Fan-out of values to any number of channel subscribers.
///
/// Publishing never blocks the producing thread: a subscriber whose queue is
/// full misses that value, and a subscriber that dropped its receiver is
/// removed.
#[derive(Debug)]
pub struct Listeners<T> {
    name: &'static str,
    capacity: usize,
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> Listeners<T> {
    /// Listener set called `name`, with `capacity` slots per subscriber.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Register a subscriber.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = channel::bounded(self.capacity);
        self.senders.lock().push(tx);
        rx
    }

    /// Deliver `value` to every subscriber; returns how many received it.
    pub fn publish(&self, value: &T) -> usize {
        let mut senders = self.senders.lock();
        let mut delivered = 0;
        senders.retain(|tx| match tx.try_send(value.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(listeners = self.name, "listener queue full, dropping value");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(listeners = self.name, "listener disconnected");
                false
            }
        });
        delivered
    }

    /// Deliver `value`, waiting up to `timeout` for each subscriber whose
    /// queue is full. Returns how many received it.
    ///
    /// For values a subscriber must not miss. The producing thread can block
    /// for `timeout` per stalled subscriber.
    pub fn publish_within(&self, value: &T, timeout: Duration) -> usize {
        let mut senders = self.senders.lock();
        let mut delivered = 0;
        senders.retain(|tx| match tx.send_timeout(value.clone(), timeout) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(listeners = self.name, ?timeout, "listener stalled, dropping value");
                true
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                debug!(listeners = self.name, "listener disconnected");
                false
            }
        });
        delivered
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.senders.lock().len()
    }

    /// Whether there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.senders.lock().is_empty()
    }
}
