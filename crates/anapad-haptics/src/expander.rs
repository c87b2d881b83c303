//! TCA9534 eight-bit port expander.
//!
//! Each output bit gates one actuator. The driver keeps a shadow of the
//! output register and always rewrites the whole register, so the shadow and
//! the chip agree after every successful call.

use anapad_errors::{AnapadResult, BusResult};
use anapad_i2c::{BusHandle, RegisterAddress, SlaveAddress, bits};

/// Expander addresses on the haptics bus, in index order.
pub const EXPANDER_ADDRESSES: [SlaveAddress; 5] = [0x20, 0x21, 0x22, 0x23, 0x24];

/// Output ports per expander.
pub const PORTS_PER_EXPANDER: u8 = 8;

const OUTPUT: RegisterAddress = RegisterAddress::Bits8(0x01);
const CONFIGURATION: RegisterAddress = RegisterAddress::Bits8(0x03);

/// Configuration value making every pin an output.
const ALL_OUTPUTS: u8 = 0x00;

/// One port expander and its output shadow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortExpander {
    index: usize,
    address: SlaveAddress,
    output: u8,
}

impl PortExpander {
    /// Expander `index` at `address`, shadow zero.
    pub fn new(index: usize, address: SlaveAddress) -> Self {
        Self {
            index,
            address,
            output: 0,
        }
    }

    /// Drive every output low, then make every pin an output.
    pub fn configure(&mut self, bus: &mut BusHandle) -> BusResult<()> {
        self.write_output(bus, 0)?;
        bus.write_register_byte(self.address, CONFIGURATION, ALL_OUTPUTS)
    }

    /// Write the full output register. The shadow follows only on success.
    pub fn write_output(&mut self, bus: &mut BusHandle, value: u8) -> BusResult<()> {
        bus.write_register_byte(self.address, OUTPUT, value)?;
        self.output = value;
        Ok(())
    }

    /// Drive `port` high.
    pub fn set_output(&mut self, bus: &mut BusHandle, port: u8) -> AnapadResult<()> {
        let value = bits::set_bit(self.output, port)?;
        Ok(self.write_output(bus, value)?)
    }

    /// Drive `port` low.
    pub fn reset_output(&mut self, bus: &mut BusHandle, port: u8) -> AnapadResult<()> {
        let value = bits::reset_bit(self.output, port)?;
        Ok(self.write_output(bus, value)?)
    }

    /// Drive every output low.
    pub fn zero_output(&mut self, bus: &mut BusHandle) -> BusResult<()> {
        self.write_output(bus, 0)
    }

    /// Shadow of the output register.
    pub fn output(&self) -> u8 {
        self.output
    }

    /// Index in the board's expander list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slave address.
    pub fn address(&self) -> SlaveAddress {
        self.address
    }
}
