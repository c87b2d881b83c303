//! Convenience re-exports.

pub use crate::{
    Actuator, ActuatorLayout, Column, HapticsBoardController, HapticsConfig, Reference, Row,
};
pub use anapad_geometry::Location;
