//! Load surface configuration.

use std::collections::HashSet;
use std::time::Duration;

use anapad_errors::ConfigurationError;
use anapad_filters::low_pass::{ALL_SAMPLES_SMOOTHING_MS, BASELINE_SMOOTHING_MS};
use anapad_geometry::Location;
use anapad_i2c::SlaveAddress;
use anapad_polling::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_LISTENER_CAPACITY};
use serde::{Deserialize, Serialize};

use crate::adc::ADC_ADDRESS;
use crate::multiplexer::{MULTIPLEXER_ADDRESS, MuxChannel};

/// PGA gain (CTRL1 bits 2..0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gain {
    /// x1
    X1,
    /// x2
    X2,
    /// x4
    X4,
    /// x8
    X8,
    /// x16
    X16,
    /// x32
    X32,
    /// x64
    X64,
    /// x128
    #[default]
    X128,
}

impl Gain {
    /// Register field value.
    pub const fn bits(self) -> u8 {
        match self {
            Gain::X1 => 0b000,
            Gain::X2 => 0b001,
            Gain::X4 => 0b010,
            Gain::X8 => 0b011,
            Gain::X16 => 0b100,
            Gain::X32 => 0b101,
            Gain::X64 => 0b110,
            Gain::X128 => 0b111,
        }
    }
}

/// Conversion rate (CTRL2 bits 6..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRate {
    /// 10 samples per second
    Sps10,
    /// 20 samples per second
    Sps20,
    /// 40 samples per second
    Sps40,
    /// 80 samples per second
    Sps80,
    /// 320 samples per second
    #[default]
    Sps320,
}

impl SampleRate {
    /// Register field value.
    pub const fn bits(self) -> u8 {
        match self {
            SampleRate::Sps10 => 0b000,
            SampleRate::Sps20 => 0b001,
            SampleRate::Sps40 => 0b010,
            SampleRate::Sps80 => 0b011,
            SampleRate::Sps320 => 0b111,
        }
    }
}

/// One load cell: its multiplexer channel and position on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Multiplexer channel the ADC sits behind
    pub channel: MuxChannel,
    /// Load cell position, in view pixels
    pub location: Location,
}

impl ChannelConfig {
    /// Create a channel entry.
    pub const fn new(channel: MuxChannel, location: Location) -> Self {
        Self { channel, location }
    }
}

/// Load cells at the four corners of a 1920 x 515 surface, inset 40 px.
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new(MuxChannel::Ch0, Location::new(40.0, 40.0)),
        ChannelConfig::new(MuxChannel::Ch1, Location::new(1880.0, 40.0)),
        ChannelConfig::new(MuxChannel::Ch2, Location::new(40.0, 475.0)),
        ChannelConfig::new(MuxChannel::Ch3, Location::new(1880.0, 475.0)),
    ]
}

/// Load surface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSurfaceConfig {
    /// I2C bus index (`/dev/i2c-N`).
    pub bus_index: u8,

    /// Multiplexer address.
    pub multiplexer_address: SlaveAddress,

    /// ADC address, shared by every channel.
    pub adc_address: SlaveAddress,

    /// Load cells in polling order.
    pub channels: Vec<ChannelConfig>,

    /// PGA gain.
    pub gain: Gain,

    /// Conversion rate.
    pub sample_rate: SampleRate,

    /// Smoothing factor of the per-sample filter, in milliseconds.
    pub all_samples_smoothing_ms: f64,

    /// Smoothing factor of the baseline filter, in milliseconds.
    pub baseline_smoothing_ms: f64,

    /// Calibration attempts per channel before start-up fails.
    pub calibration_attempts: u32,

    /// Deadline for any ADC ready bit, in milliseconds.
    pub ready_timeout_ms: u64,

    /// Consecutive failed ticks tolerated before the loop exits.
    pub failure_threshold: u32,

    /// Bounded wait when joining the polling thread, in milliseconds.
    pub stop_timeout_ms: u64,

    /// Queue depth per result subscriber.
    pub listener_capacity: usize,
}

impl Default for LoadSurfaceConfig {
    fn default() -> Self {
        Self {
            bus_index: 4,
            multiplexer_address: MULTIPLEXER_ADDRESS,
            adc_address: ADC_ADDRESS,
            channels: default_channels(),
            gain: Gain::X128,
            sample_rate: SampleRate::Sps320,
            all_samples_smoothing_ms: ALL_SAMPLES_SMOOTHING_MS,
            baseline_smoothing_ms: BASELINE_SMOOTHING_MS,
            calibration_attempts: 3,
            ready_timeout_ms: 100,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            stop_timeout_ms: 1000,
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
        }
    }
}

impl LoadSurfaceConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> LoadSurfaceConfigBuilder {
        LoadSurfaceConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.channels.is_empty() {
            return Err(ConfigurationError::invalid(
                "load_surface.channels",
                "at least one channel is required",
            ));
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.channel) {
                return Err(ConfigurationError::invalid(
                    "load_surface.channels",
                    format!("channel {} listed twice", channel.channel),
                ));
            }
        }
        for (field, address) in [
            ("load_surface.multiplexer_address", self.multiplexer_address),
            ("load_surface.adc_address", self.adc_address),
        ] {
            if address > 0x7F {
                return Err(ConfigurationError::invalid(field, "not a 7-bit address"));
            }
        }
        for (field, value) in [
            ("load_surface.all_samples_smoothing_ms", self.all_samples_smoothing_ms),
            ("load_surface.baseline_smoothing_ms", self.baseline_smoothing_ms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::invalid(field, "must be positive"));
            }
        }
        if self.calibration_attempts == 0 {
            return Err(ConfigurationError::invalid(
                "load_surface.calibration_attempts",
                "must be at least 1",
            ));
        }
        if self.ready_timeout_ms == 0 {
            return Err(ConfigurationError::invalid(
                "load_surface.ready_timeout_ms",
                "must be positive",
            ));
        }
        if self.listener_capacity == 0 {
            return Err(ConfigurationError::invalid(
                "load_surface.listener_capacity",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// ADC ready-bit deadline.
    #[must_use]
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Polling thread join deadline.
    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Builder for `LoadSurfaceConfig`.
#[derive(Debug, Default)]
pub struct LoadSurfaceConfigBuilder {
    config: LoadSurfaceConfig,
}

impl LoadSurfaceConfigBuilder {
    /// Set the bus index.
    #[must_use]
    pub fn bus_index(mut self, index: u8) -> Self {
        self.config.bus_index = index;
        self
    }

    /// Replace the channel list.
    #[must_use]
    pub fn channels(mut self, channels: Vec<ChannelConfig>) -> Self {
        self.config.channels = channels;
        self
    }

    /// Set the PGA gain.
    #[must_use]
    pub fn gain(mut self, gain: Gain) -> Self {
        self.config.gain = gain;
        self
    }

    /// Set the conversion rate.
    #[must_use]
    pub fn sample_rate(mut self, rate: SampleRate) -> Self {
        self.config.sample_rate = rate;
        self
    }

    /// Set both filter smoothing factors, in milliseconds.
    #[must_use]
    pub fn smoothing_ms(mut self, all_samples: f64, baseline: f64) -> Self {
        self.config.all_samples_smoothing_ms = all_samples;
        self.config.baseline_smoothing_ms = baseline;
        self
    }

    /// Set the calibration attempts per channel.
    #[must_use]
    pub fn calibration_attempts(mut self, attempts: u32) -> Self {
        self.config.calibration_attempts = attempts;
        self
    }

    /// Set the ready-bit deadline.
    #[must_use]
    pub fn ready_timeout_ms(mut self, ms: u64) -> Self {
        self.config.ready_timeout_ms = ms;
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
    pub fn build(self) -> Result<LoadSurfaceConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(LoadSurfaceConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_duplicate_channels() {
        let result = LoadSurfaceConfig::builder()
            .channels(vec![
                ChannelConfig::new(MuxChannel::Ch1, Location::new(0.0, 0.0)),
                ChannelConfig::new(MuxChannel::Ch1, Location::new(1.0, 0.0)),
            ])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_calibration_attempts() {
        assert!(
            LoadSurfaceConfig::builder()
                .calibration_attempts(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn register_fields() {
        assert_eq!(Gain::X128.bits(), 0b111);
        assert_eq!(SampleRate::Sps320.bits(), 0b111);
        assert_eq!(SampleRate::Sps80.bits(), 0b011);
    }
}
