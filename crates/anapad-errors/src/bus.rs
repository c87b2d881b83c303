//! Transport-level I2C failures.

use crate::common::ErrorSeverity;

/// Failure of a single bus operation.
///
/// Every variant carries enough addressing context to tell which chip
/// misbehaved without consulting the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The bus device node could not be opened
    #[error("Failed to open I2C bus {path}: {message}")]
    Open {
        /// Device node path
        path: String,
        /// Underlying error message
        message: String,
    },

    /// A read or write transfer failed at the adapter
    #[error("I2C transfer to slave {slave:#04x} failed: {message}")]
    Transfer {
        /// 7-bit slave address
        slave: u16,
        /// Underlying error message
        message: String,
    },

    /// The slave did not acknowledge its address
    #[error("I2C slave {slave:#04x} did not acknowledge")]
    NotAcknowledged {
        /// 7-bit slave address
        slave: u16,
    },

    /// A polled ready bit did not reach the expected state in time
    #[error("I2C slave {slave:#04x} register {register:#06x} not ready after {timeout_ms}ms")]
    Timeout {
        /// 7-bit slave address
        slave: u16,
        /// Polled register
        register: u16,
        /// Deadline in milliseconds
        timeout_ms: u64,
    },

    /// The handle was used after it was closed
    #[error("I2C bus {bus} is closed")]
    Closed {
        /// Bus index
        bus: u8,
    },
}

impl BusError {
    /// Create an open error.
    pub fn open(path: impl Into<String>, message: impl Into<String>) -> Self {
        BusError::Open {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a transfer error.
    pub fn transfer(slave: u16, message: impl Into<String>) -> Self {
        BusError::Transfer {
            slave,
            message: message.into(),
        }
    }

    /// Create a ready-bit timeout error.
    pub fn timeout(slave: u16, register: u16, timeout_ms: u64) -> Self {
        BusError::Timeout {
            slave,
            register,
            timeout_ms,
        }
    }

    /// Slave address involved in the failure, if any.
    pub fn slave(&self) -> Option<u16> {
        match self {
            BusError::Transfer { slave, .. }
            | BusError::NotAcknowledged { slave }
            | BusError::Timeout { slave, .. } => Some(*slave),
            BusError::Open { .. } | BusError::Closed { .. } => None,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BusError::Open { .. } => ErrorSeverity::Critical,
            BusError::Transfer { .. } => ErrorSeverity::Error,
            BusError::NotAcknowledged { .. } => ErrorSeverity::Error,
            BusError::Timeout { .. } => ErrorSeverity::Warning,
            BusError::Closed { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether repeating the same transaction on the next tick may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BusError::Transfer { .. } | BusError::NotAcknowledged { .. } | BusError::Timeout { .. }
        )
    }
}
