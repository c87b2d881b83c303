//! Shared test utilities for the anapad workspace.
//!
//! - [`must`]: unwrap helpers with `#[track_caller]` panic locations.
//! - [`sim`]: an in-memory I2C bus with chip models, transaction logging and
//!   failure injection, so controllers can be driven end to end without
//!   hardware.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod must;
pub mod prelude;
pub mod sim;

pub use must::{must, must_some};
pub use sim::{
    Gt9110Sim, Nau7802Sim, RegisterFile, SimDevice, SimulatedBus, SimulatedBusProvider,
    Transaction,
};
