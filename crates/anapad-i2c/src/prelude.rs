//! Convenience re-exports.

pub use crate::bits;
pub use crate::{BusHandle, BusProvider, I2cTransport, RegisterAddress, RegisterWidth, SlaveAddress};

#[cfg(target_os = "linux")]
pub use crate::LinuxBusProvider;
