//! GT9110 register codec.

use anapad_errors::{AnapadResult, BusResult, ProtocolError};
use anapad_i2c::{BusHandle, RegisterAddress, SlaveAddress};
use tracing::{debug, trace};

use crate::configuration::{CONFIGURATION_LEN, TouchscreenConfiguration};
use crate::touch::{Resolution, TOUCH_RECORD_LEN, Touch};

/// Touch controller address.
pub const TOUCH_ADDRESS: SlaveAddress = 0x5D;

/// Most touches the chip reports in one frame.
pub const TOUCH_CAPACITY: usize = 10;

const REG_CONFIGURATION: RegisterAddress = RegisterAddress::Bits16(0x8047);
const REG_RESOLUTION: RegisterAddress = RegisterAddress::Bits16(0x8146);
const REG_STATUS: RegisterAddress = RegisterAddress::Bits16(0x814E);
const REG_TOUCHES: RegisterAddress = RegisterAddress::Bits16(0x814F);

const STATUS_READY: u8 = 1 << 7;
const STATUS_COUNT_MASK: u8 = 0x0F;

const TOUCH_BLOCK_LEN: usize = TOUCH_CAPACITY * TOUCH_RECORD_LEN;

/// Touch count carried in a status byte, clamped to the chip's capacity.
pub fn touch_count(status: u8) -> usize {
    usize::from(status & STATUS_COUNT_MASK).min(TOUCH_CAPACITY)
}

/// Decode the first `count` records of a touch block.
pub fn decode_touches(block: &[u8], count: usize, resolution: Resolution) -> Vec<Touch> {
    block
        .chunks_exact(TOUCH_RECORD_LEN)
        .take(count)
        .filter_map(|chunk| <[u8; TOUCH_RECORD_LEN]>::try_from(chunk).ok())
        .map(|record| Touch::decode(record, resolution))
        .collect()
}

/// Stateful view of one GT9110.
///
/// Remembers whether a sample has ever been triggered and caches the
/// resolution after the first read.
#[derive(Debug, Clone)]
pub struct TouchscreenDriver {
    address: SlaveAddress,
    resolution: Option<Resolution>,
    never_sampled: bool,
}

impl TouchscreenDriver {
    /// Driver for the chip at `address`.
    pub fn new(address: SlaveAddress) -> Self {
        Self {
            address,
            resolution: None,
            never_sampled: true,
        }
    }

    /// Chip address.
    pub fn address(&self) -> SlaveAddress {
        self.address
    }

    /// Read the configuration block currently on the chip.
    pub fn read_configuration(&self, bus: &mut BusHandle) -> AnapadResult<TouchscreenConfiguration> {
        let bytes = bus.read_register_vec(self.address, REG_CONFIGURATION, CONFIGURATION_LEN)?;
        Ok(TouchscreenConfiguration::from_bytes(&bytes)?)
    }

    /// Write a configuration block, followed by its checksum and the fresh
    /// marker, as one message.
    pub fn write_configuration(
        &self,
        bus: &mut BusHandle,
        configuration: &TouchscreenConfiguration,
    ) -> BusResult<()> {
        debug!(
            version = configuration.version(),
            checksum = configuration.checksum(),
            "writing touchscreen configuration"
        );
        bus.write_register_bytes(self.address, REG_CONFIGURATION, &configuration.to_wire())
    }

    /// Panel resolution, read once and cached.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidResolution`] when either axis reads
    /// zero, or the bus error.
    pub fn read_resolution(&mut self, bus: &mut BusHandle) -> AnapadResult<Resolution> {
        if let Some(resolution) = self.resolution {
            return Ok(resolution);
        }
        let mut bytes = [0u8; 4];
        bus.read_register_bytes(self.address, REG_RESOLUTION, &mut bytes)?;
        let resolution = Resolution::from_le_bytes(bytes);
        if resolution.x == 0 || resolution.y == 0 {
            return Err(ProtocolError::InvalidResolution {
                x: resolution.x,
                y: resolution.y,
            }
            .into());
        }
        debug!(%resolution, "touchscreen resolution");
        self.resolution = Some(resolution);
        Ok(resolution)
    }

    /// Cached resolution, if read.
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    fn trigger_sample(&self, bus: &mut BusHandle) -> BusResult<()> {
        bus.write_register_byte(self.address, REG_STATUS, 0)
    }

    /// Read one touch frame.
    ///
    /// Returns `Ok(None)` when the chip has no new frame, which is a normal
    /// polling miss. A ready frame is acknowledged before its records are
    /// read so the chip can start on the next one.
    pub fn sample_touches(&mut self, bus: &mut BusHandle) -> AnapadResult<Option<Vec<Touch>>> {
        if self.never_sampled {
            self.trigger_sample(bus)?;
            self.never_sampled = false;
        }

        let status = bus.read_register_byte(self.address, REG_STATUS)?;
        if status & STATUS_READY == 0 {
            return Ok(None);
        }
        self.trigger_sample(bus)?;

        let resolution = self.read_resolution(bus)?;
        let count = touch_count(status);
        let mut block = [0u8; TOUCH_BLOCK_LEN];
        bus.read_register_bytes(self.address, REG_TOUCHES, &mut block)?;
        let touches = decode_touches(&block, count, resolution);
        trace!(count = touches.len(), "touch frame");
        Ok(Some(touches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_clamped() {
        assert_eq!(touch_count(0x80), 0);
        assert_eq!(touch_count(0x83), 3);
        assert_eq!(touch_count(0x8A), 10);
        assert_eq!(touch_count(0x8F), 10);
    }

    #[test]
    fn decodes_only_counted_records() {
        let mut block = vec![0u8; TOUCH_BLOCK_LEN];
        for (slot, chunk) in block.chunks_exact_mut(TOUCH_RECORD_LEN).enumerate() {
            if let Some(id) = chunk.first_mut() {
                *id = u8::try_from(slot).unwrap_or(u8::MAX);
            }
        }
        let touches = decode_touches(&block, 2, Resolution::new(100, 50));
        assert_eq!(touches.len(), 2);
        assert_eq!(touches.first().map(|t| (t.id, t.x, t.y)), Some((0, 100, 50)));
        assert_eq!(touches.get(1).map(|t| t.id), Some(1));
    }

    #[test]
    fn short_block_yields_what_fits() {
        let block = [0u8; TOUCH_RECORD_LEN + 3];
        assert_eq!(decode_touches(&block, 5, Resolution::new(1, 1)).len(), 1);
    }
}
