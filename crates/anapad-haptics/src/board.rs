//! The actuator grid: expanders, driver and actuator table on one bus.

use std::collections::HashMap;

use anapad_errors::{AnapadResult, BusResult, ConfigurationError};
use anapad_geometry::Location;
use anapad_i2c::{BusHandle, SlaveAddress, bits};
use tracing::{debug, trace};

use crate::actuator::{Actuator, Reference};
use crate::driver::HapticDriver;
use crate::expander::PortExpander;
use crate::layout::ActuatorLayout;

/// Expanders, driver and actuator table sharing one bus session.
///
/// Not synchronised; the controller wraps it in a mutex so every actuation
/// runs under one exclusion.
#[derive(Debug)]
pub struct HapticsBoard {
    bus: BusHandle,
    expanders: Vec<PortExpander>,
    driver: HapticDriver,
    actuators: Vec<Actuator>,
    by_reference: HashMap<Reference, usize>,
}

impl HapticsBoard {
    /// Build the board model. Nothing is written to the bus.
    ///
    /// # Errors
    ///
    /// Returns the layout's validation error against `expander_addresses`.
    pub fn new(
        bus: BusHandle,
        expander_addresses: &[SlaveAddress],
        driver_address: SlaveAddress,
        layout: &ActuatorLayout,
    ) -> Result<Self, ConfigurationError> {
        layout.validate(expander_addresses.len())?;
        let expanders = expander_addresses
            .iter()
            .enumerate()
            .map(|(index, &address)| PortExpander::new(index, address))
            .collect();
        let actuators: Vec<Actuator> = layout
            .specs()
            .iter()
            .map(|entry| Actuator {
                reference: entry.reference,
                location: entry.location,
                expander: entry.expander,
                port: entry.port,
                enabled: false,
            })
            .collect();
        let by_reference = actuators
            .iter()
            .enumerate()
            .map(|(index, actuator)| (actuator.reference, index))
            .collect();
        Ok(Self {
            bus,
            expanders,
            driver: HapticDriver::new(driver_address),
            actuators,
            by_reference,
        })
    }

    /// Configure every expander, then the driver.
    pub fn configure(&mut self) -> AnapadResult<()> {
        for expander in &mut self.expanders {
            expander.configure(&mut self.bus)?;
        }
        self.driver.configure(&mut self.bus)?;
        debug!(
            expanders = self.expanders.len(),
            actuators = self.actuators.len(),
            "haptics board configured"
        );
        Ok(())
    }

    /// Drive exactly the actuators within `radius` of `location` at
    /// amplitude `rtp_value`; returns the actuators now on.
    ///
    /// Only expanders whose output changes are written, each once.
    pub fn set_lras_within(
        &mut self,
        location: Location,
        radius: f64,
        rtp_value: u8,
    ) -> AnapadResult<Vec<Actuator>> {
        let mut outputs = vec![0u8; self.expanders.len()];
        for actuator in &self.actuators {
            if actuator.is_within(&location, radius) {
                if let Some(output) = outputs.get_mut(actuator.expander) {
                    *output = bits::set_bit(*output, actuator.port)?;
                }
            }
        }

        let written = self.write_outputs(&outputs);
        self.sync_enabled();
        written?;

        self.driver.set_rtp_value(&mut self.bus, rtp_value)?;
        if !self.driver.rtp_mode_enabled() {
            self.driver.set_rtp_mode(&mut self.bus, true)?;
        }

        let enabled: Vec<Actuator> = self
            .actuators
            .iter()
            .filter(|a| a.enabled)
            .copied()
            .collect();
        trace!(
            x = location.x,
            y = location.y,
            radius,
            rtp_value,
            on = enabled.len(),
            "actuation"
        );
        Ok(enabled)
    }

    /// Silence everything: RTP off, amplitude zero, every expander low.
    ///
    /// Every step is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn stop_all_lras(&mut self) -> BusResult<()> {
        let mut first_error = None;
        let mut note = |result: BusResult<()>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };
        note(self.driver.set_rtp_mode(&mut self.bus, false));
        note(self.driver.set_rtp_value(&mut self.bus, 0));
        for expander in &mut self.expanders {
            note(expander.zero_output(&mut self.bus));
        }
        self.sync_enabled();
        first_error.map_or(Ok(()), Err)
    }

    fn write_outputs(&mut self, outputs: &[u8]) -> BusResult<()> {
        for (expander, &value) in self.expanders.iter_mut().zip(outputs) {
            if expander.output() != value {
                expander.write_output(&mut self.bus, value)?;
            }
        }
        Ok(())
    }

    /// Derive actuator flags from the expander shadows.
    fn sync_enabled(&mut self) {
        for actuator in &mut self.actuators {
            actuator.enabled = self
                .expanders
                .get(actuator.expander)
                .is_some_and(|e| bits::get_bit(e.output(), actuator.port).unwrap_or(false));
        }
    }

    /// Actuators in table order.
    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// Actuator by reference.
    pub fn actuator(&self, reference: Reference) -> Option<&Actuator> {
        self.by_reference
            .get(&reference)
            .and_then(|&index| self.actuators.get(index))
    }

    /// Port expanders in index order.
    pub fn expanders(&self) -> &[PortExpander] {
        &self.expanders
    }

    /// Haptic driver.
    pub fn driver(&self) -> &HapticDriver {
        &self.driver
    }

    /// Close the bus session.
    pub fn close(&mut self) -> BusResult<()> {
        self.bus.close()
    }
}
