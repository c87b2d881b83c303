//! Convenience re-exports.

pub use crate::low_pass::LowPassFilter;
