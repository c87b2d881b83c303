use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Futures waiting for the next produced value.
///
/// Every registered receiver is fulfilled at most once, by the first value
/// produced after it was registered, and is then forgotten.
#[derive(Debug)]
pub struct PendingResults<T> {
    waiting: Mutex<Vec<oneshot::Sender<T>>>,
}

impl<T> Default for PendingResults<T> {
    fn default() -> Self {
        Self {
            waiting: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> PendingResults<T> {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next value.
    pub fn register(&self) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().push(tx);
        rx
    }

    /// Fulfil and drain every pending receiver; returns how many were still
    /// listening.
    pub fn fulfill(&self, value: &T) -> usize {
        let waiting = std::mem::take(&mut *self.waiting.lock());
        waiting
            .into_iter()
            .filter(|tx| !tx.is_closed())
            .map(|tx| tx.send(value.clone()))
            .filter(Result::is_ok)
            .count()
    }

    /// Drop every pending sender so waiters observe cancellation.
    pub fn cancel_all(&self) {
        self.waiting.lock().clear();
    }

    /// Number of receivers waiting.
    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiting.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfilled_exactly_once() {
        let pending = PendingResults::new();
        let mut rx = pending.register();
        assert_eq!(pending.fulfill(&1u32), 1);
        assert!(pending.is_empty());
        assert_eq!(pending.fulfill(&2u32), 0);
        assert_eq!(rx.try_recv().ok(), Some(1));
    }

    #[test]
    fn cancel_closes_receivers() {
        let pending: PendingResults<u8> = PendingResults::new();
        let mut rx = pending.register();
        pending.cancel_all();
        assert!(rx.try_recv().is_err());
    }
}
