//! Umbrella error type and severity classification.

use core::fmt;

use crate::{BusError, ConfigurationError, ProtocolError};

/// Top-level error returned by drivers and controllers.
#[derive(Debug, thiserror::Error)]
pub enum AnapadError {
    /// Transport errors
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Chip protocol errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Caller or configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Operation requires a running subsystem
    #[error("{0} is not running")]
    NotRunning(&'static str),

    /// Start called on a running subsystem
    #[error("{0} is already running")]
    AlreadyRunning(&'static str),

    /// Worker thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        /// Thread name
        name: String,
        /// Spawn failure
        #[source]
        source: std::io::Error,
    },

    /// I/O errors outside the bus, for example reading a config file
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl AnapadError {
    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AnapadError::Bus(e) => e.severity(),
            AnapadError::Protocol(e) => e.severity(),
            AnapadError::Configuration(e) => e.severity(),
            AnapadError::NotRunning(_) => ErrorSeverity::Warning,
            AnapadError::AlreadyRunning(_) => ErrorSeverity::Info,
            AnapadError::ThreadSpawn { .. } => ErrorSeverity::Critical,
            AnapadError::Io(_) => ErrorSeverity::Error,
            AnapadError::Config(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Whether the failed bus transaction may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnapadError::Bus(e) if e.is_retryable())
    }

    /// Create a config parse error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        AnapadError::Config(msg.into())
    }

    /// Create a thread spawn error.
    pub fn thread_spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        AnapadError::ThreadSpawn {
            name: name.into(),
            source,
        }
    }
}

impl From<std::io::Error> for AnapadError {
    fn from(e: std::io::Error) -> Self {
        AnapadError::Io(e)
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, subsystem cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
