//! Convenience re-exports.

pub use crate::{
    Resolution, Touch, TouchFrame, TouchSignal, TouchscreenConfig, TouchscreenConfiguration,
    TouchscreenController,
};
