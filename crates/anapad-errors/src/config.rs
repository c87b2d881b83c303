//! Programming and configuration errors.
//!
//! None of these can be produced by hardware behaviour alone; they indicate
//! a caller contract violation or a bad configuration file.

use crate::common::ErrorSeverity;

/// Invalid argument or configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Bit range with `msb < lsb` or `msb > 7`
    #[error("Invalid bit range [{lsb}, {msb}]")]
    InvalidBitRange {
        /// Most significant bit, inclusive
        msb: u8,
        /// Least significant bit, inclusive
        lsb: u8,
    },

    /// Bit index outside a byte
    #[error("Bit index {index} out of range 0..=7")]
    BitIndexOutOfRange {
        /// Offending index
        index: u8,
    },

    /// Value does not fit in the requested bit range
    #[error("Value {value:#04x} does not fit in {width} bit(s)")]
    ValueTooWide {
        /// Offending value
        value: u8,
        /// Width of the destination range
        width: u8,
    },

    /// Multiplexer channel outside 0..=3
    #[error("Invalid multiplexer channel {0}")]
    InvalidChannel(u8),

    /// Port expander bit outside 0..=7
    #[error("Invalid port index {0}")]
    InvalidPortIndex(u8),

    /// Actuator references an expander that is not configured
    #[error("Actuator {reference} refers to unknown expander {expander}")]
    UnknownExpander {
        /// Actuator reference, for example `C3`
        reference: String,
        /// Expander index
        expander: usize,
    },

    /// Two actuators share one reference
    #[error("Duplicate actuator reference {0}")]
    DuplicateReference(String),

    /// Two actuators share one expander port
    #[error("Expander {expander} port {port} is assigned twice")]
    DuplicatePort {
        /// Expander index
        expander: usize,
        /// Port index
        port: u8,
    },

    /// A field failed validation
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid {
        /// Field name
        field: String,
        /// Reason
        reason: String,
    },
}

impl ConfigurationError {
    /// Create a field validation error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get the error severity.
    ///
    /// Configuration errors are always critical since retrying cannot help.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
