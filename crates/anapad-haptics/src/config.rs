//! Haptics board configuration.

use std::collections::HashSet;
use std::time::Duration;

use anapad_errors::ConfigurationError;
use anapad_i2c::SlaveAddress;
use serde::{Deserialize, Serialize};

use crate::driver::DRIVER_ADDRESS;
use crate::expander::EXPANDER_ADDRESSES;
use crate::layout::ActuatorLayout;

/// Haptics board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticsConfig {
    /// I2C bus index (`/dev/i2c-N`).
    pub bus_index: u8,

    /// Haptic driver address.
    pub driver_address: SlaveAddress,

    /// Port expander addresses; position is the expander index.
    pub expander_addresses: Vec<SlaveAddress>,

    /// Actuator table.
    pub layout: ActuatorLayout,

    /// Bounded wait when joining the scheduler thread, in milliseconds.
    pub stop_timeout_ms: u64,
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            bus_index: 3,
            driver_address: DRIVER_ADDRESS,
            expander_addresses: EXPANDER_ADDRESSES.to_vec(),
            layout: ActuatorLayout::model_a(),
            stop_timeout_ms: 1000,
        }
    }
}

impl HapticsConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> HapticsConfigBuilder {
        HapticsConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range or repeated addresses, or a layout
    /// that does not fit the expanders.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.expander_addresses.is_empty() {
            return Err(ConfigurationError::invalid(
                "haptics.expander_addresses",
                "at least one expander is required",
            ));
        }
        let mut seen = HashSet::new();
        for &address in self.expander_addresses.iter().chain([&self.driver_address]) {
            if address > 0x7F {
                return Err(ConfigurationError::invalid(
                    "haptics.expander_addresses",
                    format!("{address:#x} is not a 7-bit address"),
                ));
            }
            if !seen.insert(address) {
                return Err(ConfigurationError::invalid(
                    "haptics.expander_addresses",
                    format!("{address:#x} is used twice"),
                ));
            }
        }
        if self.layout.is_empty() {
            return Err(ConfigurationError::invalid(
                "haptics.layout",
                "at least one actuator is required",
            ));
        }
        self.layout.validate(self.expander_addresses.len())
    }

    /// Scheduler join deadline.
    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Builder for `HapticsConfig`.
#[derive(Debug, Default)]
pub struct HapticsConfigBuilder {
    config: HapticsConfig,
}

impl HapticsConfigBuilder {
    /// Set the bus index.
    #[must_use]
    pub fn bus_index(mut self, index: u8) -> Self {
        self.config.bus_index = index;
        self
    }

    /// Set the driver address.
    #[must_use]
    pub fn driver_address(mut self, address: SlaveAddress) -> Self {
        self.config.driver_address = address;
        self
    }

    /// Replace the expander addresses.
    #[must_use]
    pub fn expander_addresses(mut self, addresses: Vec<SlaveAddress>) -> Self {
        self.config.expander_addresses = addresses;
        self
    }

    /// Replace the actuator table.
    #[must_use]
    pub fn layout(mut self, layout: ActuatorLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the stop join deadline.
    #[must_use]
    pub fn stop_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stop_timeout_ms = ms;
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<HapticsConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(HapticsConfig::default().validate(), Ok(()));
    }

    #[test]
    fn too_few_expanders_for_layout() {
        let result = HapticsConfig::builder()
            .expander_addresses(vec![0x20, 0x21])
            .build();
        assert!(matches!(
            result,
            Err(ConfigurationError::UnknownExpander { expander: 2, .. })
        ));
    }

    #[test]
    fn driver_address_must_not_collide() {
        assert!(
            HapticsConfig::builder()
                .driver_address(0x20)
                .build()
                .is_err()
        );
    }
}
