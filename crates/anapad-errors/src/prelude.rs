//! Convenience re-exports.
//!
//! ```
//! use anapad_errors::prelude::*;
//! ```

pub use crate::bus::BusError;
pub use crate::common::{AnapadError, ErrorSeverity};
pub use crate::config::ConfigurationError;
pub use crate::protocol::ProtocolError;
pub use crate::{AnapadResult, BusResult};
