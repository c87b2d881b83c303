//! DRV2605L haptic driver in real-time playback mode.
//!
//! The driver produces one drive signal shared by every actuator; the port
//! expanders decide which actuators receive it. Only the mode and the RTP
//! amplitude change at runtime.

use anapad_errors::{AnapadResult, BusResult};
use anapad_i2c::{BusHandle, RegisterAddress, SlaveAddress};
use tracing::debug;

/// Fixed DRV2605L address.
pub const DRIVER_ADDRESS: SlaveAddress = 0x5A;

const MODE: RegisterAddress = RegisterAddress::Bits8(0x01);
const RTP_INPUT: RegisterAddress = RegisterAddress::Bits8(0x02);
const OVERDRIVE_CLAMP: RegisterAddress = RegisterAddress::Bits8(0x17);
const FEEDBACK_CONTROL: RegisterAddress = RegisterAddress::Bits8(0x1A);
const CONTROL3: RegisterAddress = RegisterAddress::Bits8(0x1D);

const MODE_RTP: u8 = 0x05;
const MODE_INTERNAL_TRIGGER: u8 = 0x00;
const MAX_CLAMP: u8 = 0xFF;

// FEEDBACK_CONTROL
const N_ERM_LRA: u8 = 7;
// CONTROL3
const LRA_OPEN_LOOP: u8 = 0;

/// Haptic driver with mirrors of its two runtime registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HapticDriver {
    address: SlaveAddress,
    rtp_mode_enabled: bool,
    rtp_value: u8,
}

impl Default for HapticDriver {
    fn default() -> Self {
        Self::new(DRIVER_ADDRESS)
    }
}

impl HapticDriver {
    /// Driver at `address`, mirrors cleared.
    pub fn new(address: SlaveAddress) -> Self {
        Self {
            address,
            rtp_mode_enabled: false,
            rtp_value: 0,
        }
    }

    /// Zero the amplitude, enter RTP mode, and set up an open-loop LRA at
    /// full overdrive clamp.
    pub fn configure(&mut self, bus: &mut BusHandle) -> AnapadResult<()> {
        self.set_rtp_value(bus, 0)?;
        self.set_rtp_mode(bus, true)?;
        bus.write_register_byte(self.address, OVERDRIVE_CLAMP, MAX_CLAMP)?;
        bus.set_register_bit(self.address, FEEDBACK_CONTROL, N_ERM_LRA)?;
        bus.set_register_bit(self.address, CONTROL3, LRA_OPEN_LOOP)?;
        debug!(address = self.address, "haptic driver configured");
        Ok(())
    }

    /// Enter or leave real-time playback.
    pub fn set_rtp_mode(&mut self, bus: &mut BusHandle, enabled: bool) -> BusResult<()> {
        let mode = if enabled {
            MODE_RTP
        } else {
            MODE_INTERNAL_TRIGGER
        };
        bus.write_register_byte(self.address, MODE, mode)?;
        self.rtp_mode_enabled = enabled;
        Ok(())
    }

    /// Set the playback amplitude.
    pub fn set_rtp_value(&mut self, bus: &mut BusHandle, value: u8) -> BusResult<()> {
        bus.write_register_byte(self.address, RTP_INPUT, value)?;
        self.rtp_value = value;
        Ok(())
    }

    /// Whether RTP mode was last written as enabled.
    pub fn rtp_mode_enabled(&self) -> bool {
        self.rtp_mode_enabled
    }

    /// Last written amplitude.
    pub fn rtp_value(&self) -> u8 {
        self.rtp_value
    }

    /// Slave address.
    pub fn address(&self) -> SlaveAddress {
        self.address
    }
}
