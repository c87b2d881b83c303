//! Actuator placement tables.

use std::collections::HashSet;

use anapad_errors::ConfigurationError;
use anapad_geometry::Location;
use serde::{Deserialize, Serialize};

use crate::actuator::{Column, Reference, Row};
use crate::expander::PORTS_PER_EXPANDER;

const ORIGIN_X: f64 = 90.0;
const ORIGIN_Y: f64 = 60.0;
const COLUMN_PITCH: f64 = 145.0;
const ROW_PITCH: f64 = 99.0;

/// Placement and wiring of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorSpec {
    /// Board reference
    pub reference: Reference,
    /// Centre, in view pixels
    pub location: Location,
    /// Expander index
    pub expander: usize,
    /// Expander port
    pub port: u8,
}

/// Ordered list of actuators on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorLayout {
    actuators: Vec<ActuatorSpec>,
}

impl Default for ActuatorLayout {
    fn default() -> Self {
        Self::model_a()
    }
}

impl ActuatorLayout {
    /// Layout from explicit entries.
    pub fn new(actuators: Vec<ActuatorSpec>) -> Self {
        Self { actuators }
    }

    /// The production board: 33 actuators in a staggered grid.
    ///
    /// Odd rows carry columns A, C, .. M and even rows carry B, D, .. L.
    /// Ports are assigned in reading order, eight per expander.
    pub fn model_a() -> Self {
        let positions = Row::ALL.into_iter().flat_map(|row| {
            Column::ALL
                .into_iter()
                .filter(move |column| column.index() % 2 == row.index() % 2)
                .map(move |column| Reference::new(column, row))
        });
        let actuators = (0u8..)
            .zip(positions)
            .map(|(slot, reference)| ActuatorSpec {
                reference,
                location: Location::new(
                    ORIGIN_X + f64::from(reference.column.index()) * COLUMN_PITCH,
                    ORIGIN_Y + f64::from(reference.row.index()) * ROW_PITCH,
                ),
                expander: usize::from(slot / PORTS_PER_EXPANDER),
                port: slot % PORTS_PER_EXPANDER,
            })
            .collect();
        Self { actuators }
    }

    /// Entries in table order.
    pub fn specs(&self) -> &[ActuatorSpec] {
        &self.actuators
    }

    /// Number of actuators.
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// Check wiring against a board with `expander_count` expanders.
    ///
    /// # Errors
    ///
    /// Rejects ports above 7, unknown expanders, and any reference or port
    /// used twice.
    pub fn validate(&self, expander_count: usize) -> Result<(), ConfigurationError> {
        let mut references = HashSet::new();
        let mut ports = HashSet::new();
        for entry in &self.actuators {
            if entry.port >= PORTS_PER_EXPANDER {
                return Err(ConfigurationError::InvalidPortIndex(entry.port));
            }
            if entry.expander >= expander_count {
                return Err(ConfigurationError::UnknownExpander {
                    reference: entry.reference.to_string(),
                    expander: entry.expander,
                });
            }
            if !references.insert(entry.reference) {
                return Err(ConfigurationError::DuplicateReference(
                    entry.reference.to_string(),
                ));
            }
            if !ports.insert((entry.expander, entry.port)) {
                return Err(ConfigurationError::DuplicatePort {
                    expander: entry.expander,
                    port: entry.port,
                });
            }
        }
        Ok(())
    }
}
