use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Query for whether a touch is currently on the surface.
///
/// The load surface freezes its baseline tracking while this reports `true`.
pub trait TouchPresence: Send + Sync {
    /// Whether the most recent touch sample contained any touches.
    fn touch_present(&self) -> bool;
}

/// Shared touch-present flag written by the touchscreen polling thread.
#[derive(Debug, Clone, Default)]
pub struct TouchSignal {
    present: Arc<AtomicBool>,
}

impl TouchSignal {
    /// Flag reporting no touch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the latest presence.
    pub fn set(&self, present: bool) {
        self.present.store(present, Ordering::Release);
    }
}

impl TouchPresence for TouchSignal {
    fn touch_present(&self) -> bool {
        self.present.load(Ordering::Acquire)
    }
}

/// Presence source for running the load surface without a touchscreen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverTouched;

impl TouchPresence for NeverTouched {
    fn touch_present(&self) -> bool {
        false
    }
}
