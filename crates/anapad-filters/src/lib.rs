//! Signal filters for anapad force sampling.
//!
//! The force channels keep two [`LowPassFilter`]s each: a fast one over every
//! sample and a slow one tracking the unloaded baseline.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use anapad_filters::prelude::*;
//!
//! let mut filter = LowPassFilter::new(100.0);
//! assert_eq!(filter.filter_elapsed(10.0, Duration::ZERO), 10.0);
//! let next = filter.filter_elapsed(20.0, Duration::from_millis(10));
//! assert!((next - 11.0).abs() < 1e-9);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod low_pass;
pub mod prelude;

pub use low_pass::LowPassFilter;
