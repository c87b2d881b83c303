//! Load surface sampling for the anapad.
//!
//! Four strain-gauge load cells sit under the surface, each read by a NAU7802
//! ADC at the same I2C address behind a TCA9544A channel multiplexer. The
//! [`LoadSurfaceController`] owns the bus, brings every channel up, and runs
//! a dedicated polling thread producing one [`SampleResult`] per tick.
//!
//! Each channel keeps a fast filter over all samples and a slow baseline
//! filter that only tracks while nobody is touching the surface. The
//! per-channel force metric is the *percent offset*: the distance between
//! the two, normalised to the ADC full scale. [`SampleResult`] interpolates
//! that metric at any surface location.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod adc;
pub mod config;
pub mod controller;
pub mod multiplexer;
pub mod prelude;
pub mod sample;

pub use adc::{ADC_ADDRESS, FULL_SCALE, ForceChannel};
pub use config::{ChannelConfig, Gain, LoadSurfaceConfig, LoadSurfaceConfigBuilder, SampleRate};
pub use controller::LoadSurfaceController;
pub use multiplexer::{ChannelMultiplexer, MULTIPLEXER_ADDRESS, MuxChannel};
pub use sample::{Sample, SampleResult};
