use anapad_errors::BusResult;

use crate::BusHandle;

/// 7-bit slave address, widened the way the kernel interface takes it.
pub type SlaveAddress = u16;

/// Byte-level I2C operations.
///
/// Implementations perform each call as one bus transaction. `write_read`
/// issues the write and the read under a single repeated start so that
/// register pointers cannot be disturbed between them.
pub trait I2cTransport: Send {
    /// Write `bytes` to `slave`.
    fn write(&mut self, slave: SlaveAddress, bytes: &[u8]) -> BusResult<()>;

    /// Fill `buf` from `slave`.
    fn read(&mut self, slave: SlaveAddress, buf: &mut [u8]) -> BusResult<()>;

    /// Write `bytes` then fill `buf`, as one combined transaction.
    fn write_read(&mut self, slave: SlaveAddress, bytes: &[u8], buf: &mut [u8]) -> BusResult<()>;

    /// Release the underlying device. Later calls may fail.
    fn close(&mut self) -> BusResult<()> {
        Ok(())
    }
}

/// Opens bus sessions by index.
pub trait BusProvider: Send + Sync {
    /// Open bus `bus`.
    ///
    /// # Errors
    ///
    /// Returns [`anapad_errors::BusError::Open`] if the bus cannot be opened.
    fn open(&self, bus: u8) -> BusResult<BusHandle>;
}
