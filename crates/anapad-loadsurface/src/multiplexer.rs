//! TCA9544A four-channel I2C multiplexer.
//!
//! Channel selection is global to the bus: every transaction to a chip
//! behind the multiplexer must be preceded, in the same polling iteration,
//! by [`ChannelMultiplexer::set_channel`] for that chip's channel.

use std::fmt;

use anapad_errors::{BusResult, ConfigurationError};
use anapad_i2c::{BusHandle, SlaveAddress};
use serde::{Deserialize, Serialize};

/// Default multiplexer address.
pub const MULTIPLEXER_ADDRESS: SlaveAddress = 0x70;

/// Channel-enable bit of the control register.
const ENABLE: u8 = 0b100;

/// Downstream segment of the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MuxChannel {
    /// Segment 0
    Ch0,
    /// Segment 1
    Ch1,
    /// Segment 2
    Ch2,
    /// Segment 3
    Ch3,
}

impl MuxChannel {
    /// All channels in selection order.
    pub const ALL: [MuxChannel; 4] = [
        MuxChannel::Ch0,
        MuxChannel::Ch1,
        MuxChannel::Ch2,
        MuxChannel::Ch3,
    ];

    /// Channel number.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            MuxChannel::Ch0 => 0,
            MuxChannel::Ch1 => 1,
            MuxChannel::Ch2 => 2,
            MuxChannel::Ch3 => 3,
        }
    }

    /// Control byte selecting this channel.
    #[must_use]
    pub const fn control_byte(self) -> u8 {
        ENABLE | self.index()
    }
}

impl TryFrom<u8> for MuxChannel {
    type Error = ConfigurationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MuxChannel::Ch0),
            1 => Ok(MuxChannel::Ch1),
            2 => Ok(MuxChannel::Ch2),
            3 => Ok(MuxChannel::Ch3),
            other => Err(ConfigurationError::InvalidChannel(other)),
        }
    }
}

impl From<MuxChannel> for u8 {
    fn from(channel: MuxChannel) -> Self {
        channel.index()
    }
}

impl fmt::Display for MuxChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Multiplexer driver remembering the selected channel.
#[derive(Debug, Clone)]
pub struct ChannelMultiplexer {
    address: SlaveAddress,
    current: Option<MuxChannel>,
}

impl ChannelMultiplexer {
    /// Driver for the multiplexer at `address`.
    pub fn new(address: SlaveAddress) -> Self {
        Self {
            address,
            current: None,
        }
    }

    /// Deselect every channel. Used as a start-up probe.
    pub fn disable(&mut self, bus: &mut BusHandle) -> BusResult<()> {
        self.current = None;
        bus.write_byte(self.address, 0x00)
    }

    /// Connect `channel` to the bus.
    ///
    /// Always writes, even if `channel` is already selected.
    pub fn set_channel(&mut self, bus: &mut BusHandle, channel: MuxChannel) -> BusResult<()> {
        self.current = None;
        bus.write_byte(self.address, channel.control_byte())?;
        self.current = Some(channel);
        Ok(())
    }

    /// Last successfully selected channel.
    pub fn current_channel(&self) -> Option<MuxChannel> {
        self.current
    }

    /// Slave address.
    pub fn address(&self) -> SlaveAddress {
        self.address
    }
}
