//! Glob-import for tests.
//!
//! ```rust
//! use anapad_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some};
pub use crate::sim::{
    Gt9110Sim, Nau7802Sim, RegisterFile, SimDevice, SimulatedBus, SimulatedBusProvider,
    Transaction,
};
