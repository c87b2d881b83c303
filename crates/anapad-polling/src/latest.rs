use std::sync::Arc;

use parking_lot::RwLock;

/// Most recent value produced by a polling thread.
///
/// Values are immutable once stored and shared by `Arc`, so readers on other
/// threads never observe a partially built value.
#[derive(Debug)]
pub struct Latest<T> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Default for Latest<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> Latest<T> {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored value.
    pub fn store(&self, value: Arc<T>) {
        *self.slot.write() = Some(value);
    }

    /// Current value, if any was stored since the last clear.
    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    /// Forget the stored value.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }
}
