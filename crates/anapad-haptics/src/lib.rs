//! Haptic actuation for the anapad surface.
//!
//! A grid of linear resonant actuators sits under the surface. One DRV2605L
//! driver produces the drive signal in real-time playback (RTP) mode, and
//! five TCA9534 port expanders gate which actuators receive it. Actuating a
//! region therefore means writing the expander outputs for every actuator
//! within a radius, then setting the RTP amplitude.
//!
//! [`HapticsBoardController`] owns the bus and serialises every actuation
//! through one mutex, including the timed pulses run by its
//! [`ImpulseScheduler`].

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod actuator;
pub mod board;
pub mod config;
pub mod controller;
pub mod driver;
pub mod expander;
pub mod layout;
pub mod prelude;
pub mod scheduler;

pub use actuator::{Actuator, Column, Reference, Row};
pub use board::HapticsBoard;
pub use config::{HapticsConfig, HapticsConfigBuilder};
pub use controller::HapticsBoardController;
pub use driver::{DRIVER_ADDRESS, HapticDriver};
pub use expander::{EXPANDER_ADDRESSES, PORTS_PER_EXPANDER, PortExpander};
pub use layout::{ActuatorLayout, ActuatorSpec};
pub use scheduler::{ImpulseScheduler, Task};
