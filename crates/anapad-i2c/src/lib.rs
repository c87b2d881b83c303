//! I2C register transactions for anapad peripherals.
//!
//! The crate is layered bottom-up:
//!
//! - [`bits`]: pure bit manipulation over a single byte.
//! - [`I2cTransport`]: the byte-level seam (write, read, combined
//!   write-then-read) implemented by the Linux character device transport
//!   and by test doubles.
//! - [`BusHandle`]: an open bus session with register helpers built on the
//!   transport, including read-modify-write of bits and bounded polling of
//!   chip ready bits.
//! - [`BusProvider`]: maps a bus index to an open [`BusHandle`].
//!
//! Register address width is always supplied by the caller through
//! [`RegisterAddress`]; the wire protocol cannot infer it.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bits;
mod handle;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod prelude;
mod register;
mod transport;

pub use handle::BusHandle;
pub use register::{RegisterAddress, RegisterWidth};
pub use transport::{BusProvider, I2cTransport, SlaveAddress};

#[cfg(target_os = "linux")]
pub use linux::{LinuxBusProvider, LinuxTransport};

/// Platform device node for a bus index.
pub fn device_path(bus: u8) -> String {
    format!("/dev/i2c-{bus}")
}
