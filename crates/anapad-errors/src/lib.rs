//! Error types shared by the anapad crates.
//!
//! Errors fall into three families:
//!
//! - [`BusError`]: transport-level failures (open, transfer, no acknowledge,
//!   timeout). Polling loops count these and keep going.
//! - [`ProtocolError`]: a transaction succeeded but the chip reported
//!   something semantically wrong, such as a calibration error bit.
//! - [`ConfigurationError`]: programming or configuration mistakes, such as
//!   an inverted bit range or an unknown multiplexer channel.
//!
//! [`AnapadError`] wraps all three together with lifecycle failures so that
//! controller APIs can return a single error type.
//!
//! # Example
//!
//! ```
//! use anapad_errors::prelude::*;
//!
//! fn select(channel: u8) -> AnapadResult<u8> {
//!     if channel > 3 {
//!         return Err(ConfigurationError::InvalidChannel(channel).into());
//!     }
//!     Ok(0b100 | channel)
//! }
//!
//! assert!(select(4).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod common;
pub mod config;
pub mod prelude;
pub mod protocol;

pub use bus::BusError;
pub use common::{AnapadError, ErrorSeverity};
pub use config::ConfigurationError;
pub use protocol::ProtocolError;

/// Result of a single bus transaction.
pub type BusResult<T> = std::result::Result<T, BusError>;

/// Result of a controller or driver operation.
pub type AnapadResult<T> = std::result::Result<T, AnapadError>;
