//! GT9110 touchscreen support for the anapad.
//!
//! [`TouchscreenDriver`] speaks the chip's 16-bit register protocol: it
//! reads and programs the configuration block, reads the panel resolution
//! and decodes touch frames. [`TouchscreenController`] owns the bus and a
//! polling thread that publishes each frame and keeps a [`TouchSignal`]
//! current for the load surface.
//!
//! The chip raises a ready bit when a frame is available; the host
//! acknowledges by writing zero to the status register, which also starts
//! the next frame. Reads between frames are not errors.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod config;
pub mod configuration;
pub mod controller;
pub mod driver;
pub mod prelude;
pub mod touch;

pub use anapad_polling::TouchSignal;
pub use config::{TouchscreenConfig, TouchscreenConfigBuilder};
pub use configuration::{CONFIGURATION_LEN, TouchscreenConfiguration};
pub use controller::{TouchFrame, TouchscreenController};
pub use driver::{TOUCH_ADDRESS, TOUCH_CAPACITY, TouchscreenDriver};
pub use touch::{Resolution, Touch};
