//! Device-level wiring for the anapad.
//!
//! [`Anapad`] owns the touchscreen, haptics and load surface controllers and
//! starts them in dependency order. [`AnapadConfig`] gathers their settings
//! and loads from YAML or JSON. [`ForceFeedback`] correlates touches with
//! the load surface's force field to produce clicks or continuous vibration.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod anapad;
pub mod config;
pub mod feedback;
pub mod prelude;

pub use anapad::Anapad;
pub use config::AnapadConfig;
pub use feedback::{
    Actuation, FeedbackAction, FeedbackConfig, FeedbackMode, ForceFeedback, PressDetector,
    TouchTransform,
};
