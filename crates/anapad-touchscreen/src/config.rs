//! Touchscreen configuration.

use std::path::PathBuf;
use std::time::Duration;

use anapad_errors::ConfigurationError;
use anapad_i2c::SlaveAddress;
use anapad_polling::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_LISTENER_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::driver::TOUCH_ADDRESS;

/// Touchscreen configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchscreenConfig {
    /// I2C bus index (`/dev/i2c-N`).
    pub bus_index: u8,

    /// Touch controller address.
    pub address: SlaveAddress,

    /// Raw configuration block to program at start, if the chip differs.
    pub configuration_path: Option<PathBuf>,

    /// Pause after a frame that was not ready, in milliseconds. Zero polls
    /// continuously.
    pub idle_poll_interval_ms: u64,

    /// Consecutive failed ticks tolerated before the loop exits.
    pub failure_threshold: u32,

    /// Bounded wait when joining the polling thread, in milliseconds.
    pub stop_timeout_ms: u64,

    /// Queue depth per subscriber.
    pub listener_capacity: usize,
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            bus_index: 1,
            address: TOUCH_ADDRESS,
            configuration_path: None,
            idle_poll_interval_ms: 0,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            stop_timeout_ms: 1000,
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
        }
    }
}

impl TouchscreenConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> TouchscreenConfigBuilder {
        TouchscreenConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.address > 0x7F {
            return Err(ConfigurationError::invalid(
                "touchscreen.address",
                "not a 7-bit address",
            ));
        }
        if self.listener_capacity == 0 {
            return Err(ConfigurationError::invalid(
                "touchscreen.listener_capacity",
                "must be positive",
            ));
        }
        if let Some(path) = &self.configuration_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigurationError::invalid(
                    "touchscreen.configuration_path",
                    "must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Pause after a not-ready frame, if any.
    #[must_use]
    pub fn idle_poll_interval(&self) -> Option<Duration> {
        (self.idle_poll_interval_ms > 0).then(|| Duration::from_millis(self.idle_poll_interval_ms))
    }

    /// Polling thread join deadline.
    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Builder for `TouchscreenConfig`.
#[derive(Debug, Default)]
pub struct TouchscreenConfigBuilder {
    config: TouchscreenConfig,
}

impl TouchscreenConfigBuilder {
    /// Set the bus index.
    #[must_use]
    pub fn bus_index(mut self, index: u8) -> Self {
        self.config.bus_index = index;
        self
    }

    /// Set the chip address.
    #[must_use]
    pub fn address(mut self, address: SlaveAddress) -> Self {
        self.config.address = address;
        self
    }

    /// Program the block in `path` at start.
    #[must_use]
    pub fn configuration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.configuration_path = Some(path.into());
        self
    }

    /// Set the pause after a not-ready frame.
    #[must_use]
    pub fn idle_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.idle_poll_interval_ms = ms;
        self
    }

    /// Set the failure threshold.
    #[must_use]
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Set the stop join deadline.
    #[must_use]
    pub fn stop_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stop_timeout_ms = ms;
        self
    }

    /// Set the subscriber queue depth.
    #[must_use]
    pub fn listener_capacity(mut self, capacity: usize) -> Self {
        self.config.listener_capacity = capacity;
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<TouchscreenConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_busy_polls() {
        let config = TouchscreenConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.idle_poll_interval(), None);
        assert_eq!(config.address, 0x5D);
    }

    #[test]
    fn idle_interval() {
        let config = TouchscreenConfig::builder().idle_poll_interval_ms(2).build();
        assert_eq!(
            config.map(|c| c.idle_poll_interval()),
            Ok(Some(Duration::from_millis(2)))
        );
    }

    #[test]
    fn rejects_wide_address() {
        assert!(TouchscreenConfig::builder().address(0x100).build().is_err());
    }
}
