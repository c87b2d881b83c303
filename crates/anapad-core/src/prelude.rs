//! Convenience re-exports.

pub use crate::{
    Anapad, AnapadConfig, FeedbackAction, FeedbackConfig, FeedbackMode, ForceFeedback,
};
pub use anapad_errors::{AnapadError, AnapadResult};
pub use anapad_geometry::Location;
pub use anapad_polling::{LifecycleState, PollFailure};
