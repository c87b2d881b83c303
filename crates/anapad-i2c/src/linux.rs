//! Linux `/dev/i2c-N` transport.

use std::io;

use anapad_errors::{BusError, BusResult};
use i2cdev::core::{I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CBus, LinuxI2CError, LinuxI2CMessage};
use tracing::info;

use crate::transport::{BusProvider, I2cTransport, SlaveAddress};
use crate::{BusHandle, device_path};

/// No device responded at the address.
const ENXIO: i32 = 6;
/// Adapter reported a missing acknowledge.
const EREMOTEIO: i32 = 121;

/// Transport over the kernel `i2c-dev` interface using combined
/// `I2C_RDWR` transfers.
///
/// Transfers are bounded only by the adapter driver's own timeout; the
/// `I2C_TIMEOUT` ioctl is not issued. Ready-bit waits are bounded above this
/// layer by [`BusHandle::poll_register_bit`](crate::BusHandle::poll_register_bit).
pub struct LinuxTransport {
    bus: u8,
    device: Option<LinuxI2CBus>,
}

impl LinuxTransport {
    /// Open `/dev/i2c-{bus}`.
    pub fn open(bus: u8) -> BusResult<Self> {
        let path = device_path(bus);
        let device = LinuxI2CBus::new(&path).map_err(|e| BusError::open(&path, e.to_string()))?;
        info!(%path, "opened I2C bus");
        Ok(Self {
            bus,
            device: Some(device),
        })
    }

    fn device(&mut self) -> BusResult<&mut LinuxI2CBus> {
        let bus = self.bus;
        self.device.as_mut().ok_or(BusError::Closed { bus })
    }
}

fn map_error(slave: SlaveAddress, error: LinuxI2CError) -> BusError {
    let message = error.to_string();
    let io_error = io::Error::from(error);
    match io_error.raw_os_error() {
        Some(ENXIO | EREMOTEIO) => BusError::NotAcknowledged { slave },
        _ => BusError::transfer(slave, message),
    }
}

impl I2cTransport for LinuxTransport {
    fn write(&mut self, slave: SlaveAddress, bytes: &[u8]) -> BusResult<()> {
        let mut messages = [LinuxI2CMessage::write(bytes).with_address(slave)];
        self.device()?
            .transfer(&mut messages)
            .map_err(|e| map_error(slave, e))?;
        Ok(())
    }

    fn read(&mut self, slave: SlaveAddress, buf: &mut [u8]) -> BusResult<()> {
        let mut messages = [LinuxI2CMessage::read(buf).with_address(slave)];
        self.device()?
            .transfer(&mut messages)
            .map_err(|e| map_error(slave, e))?;
        Ok(())
    }

    fn write_read(&mut self, slave: SlaveAddress, bytes: &[u8], buf: &mut [u8]) -> BusResult<()> {
        let mut messages = [
            LinuxI2CMessage::write(bytes).with_address(slave),
            LinuxI2CMessage::read(buf).with_address(slave),
        ];
        self.device()?
            .transfer(&mut messages)
            .map_err(|e| map_error(slave, e))?;
        Ok(())
    }

    fn close(&mut self) -> BusResult<()> {
        // Dropping the bus closes the file descriptor.
        self.device = None;
        Ok(())
    }
}

/// Opens buses through the kernel `i2c-dev` interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxBusProvider;

impl BusProvider for LinuxBusProvider {
    fn open(&self, bus: u8) -> BusResult<BusHandle> {
        Ok(BusHandle::new(bus, Box::new(LinuxTransport::open(bus)?)))
    }
}
