//! Chip-reported semantic failures.

use crate::common::ErrorSeverity;

/// A transaction completed but the chip response is not usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The ADC raised its calibration error bit on every attempt
    #[error("Force channel {channel} failed calibration after {attempts} attempt(s)")]
    CalibrationFailed {
        /// Multiplexer channel of the failing ADC
        channel: u8,
        /// Number of calibration attempts made
        attempts: u32,
    },

    /// A configuration blob has the wrong size for the chip
    #[error("Configuration blob must be {expected} bytes, got {actual}")]
    ConfigurationLength {
        /// Size the chip expects
        expected: usize,
        /// Size supplied
        actual: usize,
    },

    /// The chip reported a resolution that cannot be used for scaling
    #[error("Touch controller reported invalid resolution {x}x{y}")]
    InvalidResolution {
        /// Horizontal resolution
        x: u16,
        /// Vertical resolution
        y: u16,
    },
}

impl ProtocolError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProtocolError::CalibrationFailed { .. } => ErrorSeverity::Error,
            ProtocolError::ConfigurationLength { .. } => ErrorSeverity::Error,
            ProtocolError::InvalidResolution { .. } => ErrorSeverity::Error,
        }
    }
}
