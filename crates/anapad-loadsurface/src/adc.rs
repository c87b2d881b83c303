//! NAU7802 24-bit load cell ADC.
//!
//! Every channel's ADC answers at the same address, so all calls here assume
//! the caller has just selected the channel on the multiplexer.

use std::thread;
use std::time::{Duration, Instant};

use anapad_errors::AnapadResult;
use anapad_filters::LowPassFilter;
use anapad_geometry::Location;
use anapad_i2c::{BusHandle, RegisterAddress, SlaveAddress};
use tracing::{debug, warn};

use crate::config::{ChannelConfig, Gain, LoadSurfaceConfig, SampleRate};
use crate::multiplexer::MuxChannel;

/// Fixed NAU7802 address.
pub const ADC_ADDRESS: SlaveAddress = 0x2A;

/// Full-scale magnitude of a signed 24-bit conversion (2^23).
pub const FULL_SCALE: f64 = 8_388_608.0;

const PU_CTRL: RegisterAddress = RegisterAddress::Bits8(0x00);
const CTRL1: RegisterAddress = RegisterAddress::Bits8(0x01);
const CTRL2: RegisterAddress = RegisterAddress::Bits8(0x02);
const ADCO_B2: RegisterAddress = RegisterAddress::Bits8(0x12);
const POWER_CTRL: RegisterAddress = RegisterAddress::Bits8(0x1C);

// PU_CTRL
const RR: u8 = 0;
const PUD: u8 = 1;
const PUA: u8 = 2;
const PUR: u8 = 3;
const CS: u8 = 4;
const CR: u8 = 5;
const AVDDS: u8 = 7;

// CTRL2
const CALS: u8 = 2;
const CAL_ERR: u8 = 3;

// POWER_CTRL
const PGA_CAP_EN: u8 = 7;

/// LDO output of 3.3 V (CTRL1 bits 5..3).
const VLDO_3V3: u8 = 0b100;

/// Register reset pulse width.
const RESET_PULSE: Duration = Duration::from_millis(1);

/// Distance between two filtered readings as a fraction of full scale.
#[inline]
#[must_use]
pub fn percent_offset(filtered: f64, baseline: f64) -> f64 {
    (filtered - baseline).abs() / FULL_SCALE
}

/// Sign-extend a big-endian 24-bit conversion.
#[inline]
#[must_use]
pub fn decode_sample(bytes: [u8; 3]) -> i32 {
    let [b2, b1, b0] = bytes;
    i32::from_be_bytes([b2, b1, b0, 0]) >> 8
}

/// One load cell channel.
#[derive(Debug, Clone)]
pub struct ForceChannel {
    index: usize,
    channel: MuxChannel,
    location: Location,
    address: SlaveAddress,
    gain: Gain,
    sample_rate: SampleRate,
    ready_timeout: Duration,
    all_samples: LowPassFilter,
    baseline: LowPassFilter,
    last_sample: i32,
    last_filtered: f64,
    last_baseline: f64,
}

impl ForceChannel {
    /// Channel `index` behind multiplexer `channel`, with default settings.
    pub fn new(index: usize, channel: MuxChannel, location: Location) -> Self {
        Self {
            index,
            channel,
            location,
            address: ADC_ADDRESS,
            gain: Gain::X128,
            sample_rate: SampleRate::Sps320,
            ready_timeout: Duration::from_millis(100),
            all_samples: LowPassFilter::all_samples(),
            baseline: LowPassFilter::baseline(),
            last_sample: 0,
            last_filtered: 0.0,
            last_baseline: 0.0,
        }
    }

    /// Channel `index` configured from the load surface settings.
    pub fn from_config(index: usize, channel: &ChannelConfig, config: &LoadSurfaceConfig) -> Self {
        Self {
            address: config.adc_address,
            gain: config.gain,
            sample_rate: config.sample_rate,
            ready_timeout: config.ready_timeout(),
            all_samples: LowPassFilter::new(config.all_samples_smoothing_ms),
            baseline: LowPassFilter::new(config.baseline_smoothing_ms),
            ..Self::new(index, channel.channel, channel.location)
        }
    }

    /// Power up, configure gain and rate, then calibrate.
    ///
    /// Returns the calibration outcome; bus failures are errors.
    pub fn configure(&mut self, bus: &mut BusHandle) -> AnapadResult<bool> {
        let addr = self.address;
        bus.set_register_bit(addr, PU_CTRL, RR)?;
        thread::sleep(RESET_PULSE);
        bus.reset_register_bit(addr, PU_CTRL, RR)?;

        bus.set_register_bit(addr, PU_CTRL, PUD)?;
        bus.set_register_bit(addr, PU_CTRL, AVDDS)?;
        bus.set_register_bits(addr, CTRL1, self.gain.bits(), 2, 0)?;
        bus.set_register_bits(addr, CTRL1, VLDO_3V3, 5, 3)?;
        bus.set_register_bits(addr, CTRL2, self.sample_rate.bits(), 6, 4)?;
        bus.set_register_bit(addr, POWER_CTRL, PGA_CAP_EN)?;

        bus.set_register_bit(addr, PU_CTRL, PUA)?;
        bus.poll_register_bit(addr, PU_CTRL, PUR, true, self.ready_timeout)?;
        debug!(channel = %self.channel, "ADC powered up");

        self.calibrate(bus)
    }

    /// Run internal offset calibration; `false` if the chip flags an error.
    pub fn calibrate(&mut self, bus: &mut BusHandle) -> AnapadResult<bool> {
        let addr = self.address;
        bus.set_register_bit(addr, CTRL2, CALS)?;
        bus.poll_register_bit(addr, CTRL2, CALS, false, self.ready_timeout)?;
        let failed = bus.get_register_bit(addr, CTRL2, CAL_ERR)?;
        if failed {
            warn!(channel = %self.channel, "ADC calibration error");
        } else {
            debug!(channel = %self.channel, "ADC calibrated");
        }
        Ok(!failed)
    }

    /// Restart the conversion cycle so channels convert in step.
    pub fn synchronize_sample_cycle(&mut self, bus: &mut BusHandle) -> AnapadResult<()> {
        bus.set_register_bit(self.address, PU_CTRL, CS)
    }

    /// Wait for a conversion and read it.
    pub fn sample(&mut self, bus: &mut BusHandle) -> AnapadResult<i32> {
        bus.poll_register_bit(self.address, PU_CTRL, CR, true, self.ready_timeout)?;
        let mut bytes = [0u8; 3];
        bus.read_register_bytes(self.address, ADCO_B2, &mut bytes)?;
        self.last_sample = decode_sample(bytes);
        Ok(self.last_sample)
    }

    /// Sample, filter, and return the percent offset from baseline.
    ///
    /// The baseline filter only takes the sample when `apply_to_baseline` is
    /// set, or when it has never been seeded.
    pub fn sample_percent_offset(
        &mut self,
        bus: &mut BusHandle,
        apply_to_baseline: bool,
    ) -> AnapadResult<f64> {
        let raw = self.sample(bus)?;
        Ok(self.apply_sample(raw, apply_to_baseline, Instant::now()))
    }

    /// Feed a raw sample observed at `now` through both filters.
    pub fn apply_sample(&mut self, raw: i32, apply_to_baseline: bool, now: Instant) -> f64 {
        let value = f64::from(raw);
        self.last_filtered = self.all_samples.filter_at(value, now);
        if apply_to_baseline || self.baseline.value().is_none() {
            self.last_baseline = self.baseline.filter_at(value, now);
        }
        percent_offset(self.last_filtered, self.last_baseline)
    }

    /// Position in the controller's channel list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Multiplexer channel.
    pub fn channel(&self) -> MuxChannel {
        self.channel
    }

    /// Load cell position.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Most recent raw conversion.
    pub fn last_sample(&self) -> i32 {
        self.last_sample
    }

    /// Most recent all-samples filter output.
    pub fn last_filtered(&self) -> f64 {
        self.last_filtered
    }

    /// Most recent baseline filter output.
    pub fn last_baseline(&self) -> f64 {
        self.last_baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extension() {
        assert_eq!(decode_sample([0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(decode_sample([0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(decode_sample([0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(decode_sample([0x00, 0x01, 0x00]), 256);
    }

    #[test]
    fn baseline_freezes_while_touched() {
        let mut channel = ForceChannel::new(0, MuxChannel::Ch0, Location::default());
        let start = Instant::now();
        assert!(channel.apply_sample(1000, true, start) < f64::EPSILON);

        let later = start + Duration::from_millis(10);
        let offset = channel.apply_sample(100_000, false, later);
        assert!((channel.last_baseline() - 1000.0).abs() < f64::EPSILON);
        // all-samples: 1000 + 10/25 * 99_000
        assert!((channel.last_filtered() - 40_600.0).abs() < 1e-6);
        assert!((offset - 39_600.0 / FULL_SCALE).abs() < 1e-12);
    }

    #[test]
    fn baseline_seeds_even_when_touched() {
        let mut channel = ForceChannel::new(0, MuxChannel::Ch0, Location::default());
        let offset = channel.apply_sample(5000, false, Instant::now());
        assert!((channel.last_baseline() - 5000.0).abs() < f64::EPSILON);
        assert!(offset < f64::EPSILON);
    }
}
