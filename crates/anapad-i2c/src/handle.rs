use std::fmt;
use std::time::{Duration, Instant};

use anapad_errors::{AnapadResult, BusError, BusResult};
use tracing::{debug, trace};

use crate::bits;
use crate::register::RegisterAddress;
use crate::transport::{I2cTransport, SlaveAddress};

/// An open bus session bound to one bus index.
///
/// Each subsystem owns its handle exclusively. Register read-modify-write
/// helpers are three separate transactions and are not atomic with respect
/// to any other writer of the same register.
pub struct BusHandle {
    bus: u8,
    transport: Option<Box<dyn I2cTransport>>,
}

impl BusHandle {
    /// Wrap an already opened transport.
    pub fn new(bus: u8, transport: Box<dyn I2cTransport>) -> Self {
        Self {
            bus,
            transport: Some(transport),
        }
    }

    /// Bus index this handle was opened on.
    pub fn bus_index(&self) -> u8 {
        self.bus
    }

    /// Whether [`close`](Self::close) has not yet been called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    fn transport(&mut self) -> BusResult<&mut Box<dyn I2cTransport>> {
        let bus = self.bus;
        self.transport.as_mut().ok_or(BusError::Closed { bus })
    }

    /// Read one byte with no register address.
    pub fn read_byte(&mut self, slave: SlaveAddress) -> BusResult<u8> {
        let mut buf = [0u8; 1];
        self.transport()?.read(slave, &mut buf)?;
        Ok(u8::from_be_bytes(buf))
    }

    /// Write one byte with no register address.
    pub fn write_byte(&mut self, slave: SlaveAddress, value: u8) -> BusResult<()> {
        self.transport()?.write(slave, &[value])
    }

    /// Read a single register.
    pub fn read_register_byte(&mut self, slave: SlaveAddress, reg: RegisterAddress) -> BusResult<u8> {
        let mut buf = [0u8; 1];
        self.read_register_bytes(slave, reg, &mut buf)?;
        Ok(u8::from_be_bytes(buf))
    }

    /// Write a single register.
    pub fn write_register_byte(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        value: u8,
    ) -> BusResult<()> {
        self.write_register_bytes(slave, reg, &[value])
    }

    /// Read `buf.len()` consecutive bytes starting at `reg`.
    pub fn read_register_bytes(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        buf: &mut [u8],
    ) -> BusResult<()> {
        let address = reg.encode();
        trace!(slave, %reg, len = buf.len(), "register read");
        self.transport()?.write_read(slave, &address, buf)
    }

    /// Read `len` consecutive bytes starting at `reg` into a new buffer.
    pub fn read_register_vec(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        len: usize,
    ) -> BusResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_register_bytes(slave, reg, &mut buf)?;
        Ok(buf)
    }

    /// Write `data` to consecutive registers starting at `reg`, as one
    /// message.
    pub fn write_register_bytes(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        data: &[u8],
    ) -> BusResult<()> {
        let mut message = Vec::with_capacity(reg.width().byte_len() + data.len());
        reg.encode_into(&mut message);
        message.extend_from_slice(data);
        trace!(slave, %reg, len = data.len(), "register write");
        self.transport()?.write(slave, &message)
    }

    /// Read one bit of a register.
    pub fn get_register_bit(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        index: u8,
    ) -> AnapadResult<bool> {
        bits::check_index(index)?;
        let value = self.read_register_byte(slave, reg)?;
        Ok(bits::get_bit(value, index)?)
    }

    /// Read the inclusive bit range `[lsb, msb]` of a register.
    pub fn get_register_bits(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        msb: u8,
        lsb: u8,
    ) -> AnapadResult<u8> {
        bits::check_range(msb, lsb)?;
        let value = self.read_register_byte(slave, reg)?;
        Ok(bits::get_bits(value, msb, lsb)?)
    }

    /// Read-modify-write `[lsb, msb]` of a register to `value`.
    pub fn set_register_bits(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        value: u8,
        msb: u8,
        lsb: u8,
    ) -> AnapadResult<()> {
        // Validate before touching the bus so a bad call leaves no trace.
        bits::set_bits(0, value, msb, lsb)?;
        let current = self.read_register_byte(slave, reg)?;
        let updated = bits::set_bits(current, value, msb, lsb)?;
        self.write_register_byte(slave, reg, updated)?;
        Ok(())
    }

    /// Read-modify-write one register bit to 1.
    pub fn set_register_bit(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        index: u8,
    ) -> AnapadResult<()> {
        self.set_register_bits(slave, reg, 1, index, index)
    }

    /// Read-modify-write one register bit to 0.
    pub fn reset_register_bit(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        index: u8,
    ) -> AnapadResult<()> {
        self.set_register_bits(slave, reg, 0, index, index)
    }

    /// Spin until a register bit reads `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Timeout`] once `timeout` has elapsed without a
    /// match, or the first transport error encountered.
    pub fn poll_register_bit(
        &mut self,
        slave: SlaveAddress,
        reg: RegisterAddress,
        index: u8,
        expected: bool,
        timeout: Duration,
    ) -> AnapadResult<()> {
        let started = Instant::now();
        loop {
            if self.get_register_bit(slave, reg, index)? == expected {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(BusError::timeout(slave, reg.value(), timeout_ms).into());
            }
            std::thread::yield_now();
        }
    }

    /// Close the session. Calling it again is a no-op.
    pub fn close(&mut self) -> BusResult<()> {
        match self.transport.take() {
            Some(mut transport) => {
                debug!(bus = self.bus, "closing I2C bus");
                transport.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for BusHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!(bus = self.bus, error = %e, "I2C bus close on drop failed");
        }
    }
}

impl fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusHandle")
            .field("bus", &self.bus)
            .field("open", &self.is_open())
            .finish()
    }
}
