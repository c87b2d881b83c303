//! Haptics board lifecycle and the actuation entry points.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anapad_errors::{AnapadError, AnapadResult};
use anapad_geometry::Location;
use anapad_i2c::BusProvider;
use anapad_polling::{LifecycleState, SharedLifecycle};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::actuator::{Actuator, Reference};
use crate::board::HapticsBoard;
use crate::config::HapticsConfig;
use crate::scheduler::ImpulseScheduler;

const SUBSYSTEM: &str = "haptics";

struct Running {
    board: Arc<Mutex<HapticsBoard>>,
    scheduler: ImpulseScheduler,
}

/// Owns the haptics bus, the board and the impulse scheduler.
///
/// Every actuation, direct or scheduled, goes through the board mutex.
pub struct HapticsBoardController {
    config: HapticsConfig,
    provider: Arc<dyn BusProvider>,
    lifecycle: SharedLifecycle,
    running: Option<Running>,
}

impl HapticsBoardController {
    /// Create a stopped controller.
    pub fn new(config: HapticsConfig, provider: Arc<dyn BusProvider>) -> Self {
        Self {
            config,
            provider,
            lifecycle: SharedLifecycle::default(),
            running: None,
        }
    }

    /// Open the bus, configure the board and start the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::AlreadyRunning`] if started twice, or the
    /// first configuration, bus or thread error. Nothing is left open.
    pub fn start(&mut self) -> AnapadResult<()> {
        if self.running.is_some() {
            return Err(AnapadError::AlreadyRunning(SUBSYSTEM));
        }
        self.config.validate()?;
        self.lifecycle.set(LifecycleState::Starting);
        info!(
            bus = self.config.bus_index,
            actuators = self.config.layout.len(),
            "starting haptics"
        );

        match self.bring_up() {
            Ok(running) => {
                self.running = Some(running);
                self.lifecycle.set(LifecycleState::Running);
                info!("haptics running");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "haptics start failed");
                self.lifecycle.set(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    fn bring_up(&self) -> AnapadResult<Running> {
        let bus = self.provider.open(self.config.bus_index)?;
        let mut board = HapticsBoard::new(
            bus,
            &self.config.expander_addresses,
            self.config.driver_address,
            &self.config.layout,
        )?;
        let started = board.configure().and_then(|()| ImpulseScheduler::start());
        match started {
            Ok(scheduler) => Ok(Running {
                board: Arc::new(Mutex::new(board)),
                scheduler,
            }),
            Err(e) => {
                if let Err(close) = board.close() {
                    warn!(error = %close, "bus close after failed start failed");
                }
                Err(e)
            }
        }
    }

    /// Drain the scheduler, silence every actuator, then close the bus.
    /// Safe to call when stopped.
    ///
    /// # Errors
    ///
    /// Returns the bus error if the actuators could not be silenced; the
    /// bus is closed regardless.
    pub fn stop(&mut self) -> AnapadResult<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };
        info!("stopping haptics");
        match running.scheduler.shutdown(self.config.stop_timeout()) {
            Some(dropped) => debug!(dropped, "haptics scheduler stopped"),
            None => warn!("haptics scheduler did not stop in time"),
        }

        let mut board = running.board.lock();
        let silenced = board.stop_all_lras();
        if let Err(e) = &silenced {
            error!(error = %e, "failed to silence actuators");
        }
        if let Err(e) = board.close() {
            warn!(error = %e, "haptics bus close failed");
        }
        drop(board);
        self.lifecycle.set(LifecycleState::Stopped);
        Ok(silenced?)
    }

    fn board(&self) -> AnapadResult<&Arc<Mutex<HapticsBoard>>> {
        self.running
            .as_ref()
            .map(|r| &r.board)
            .ok_or(AnapadError::NotRunning(SUBSYSTEM))
    }

    /// Drive exactly the actuators within `radius` of `location`.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] when stopped, or the bus error.
    pub fn set_lras_within(
        &self,
        location: Location,
        radius: f64,
        rtp_value: u8,
    ) -> AnapadResult<Vec<Actuator>> {
        self.board()?
            .lock()
            .set_lras_within(location, radius, rtp_value)
    }

    /// Turn every actuator off.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] when stopped, or the bus error.
    pub fn stop_all_lras(&self) -> AnapadResult<()> {
        Ok(self.board()?.lock().stop_all_lras()?)
    }

    /// Pulse the actuators within `radius` of `location`: on after `delay`,
    /// all off after `delay + duration`.
    ///
    /// Both deadlines are taken from the same instant. Failures inside the
    /// pulse are logged on the scheduler thread.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] when stopped.
    pub fn schedule_lra_impulse(
        &self,
        location: Location,
        radius: f64,
        rtp_value: u8,
        delay: Duration,
        duration: Duration,
    ) -> AnapadResult<()> {
        let running = self.running.as_ref().ok_or(AnapadError::NotRunning(SUBSYSTEM))?;
        let now = Instant::now();
        let start = now + delay;
        let end = start + duration;

        let board = Arc::clone(&running.board);
        running.scheduler.schedule_at(
            start,
            "lra-impulse-start",
            Box::new(move || {
                board
                    .lock()
                    .set_lras_within(location, radius, rtp_value)
                    .map(drop)
            }),
        )?;
        let board = Arc::clone(&running.board);
        running.scheduler.schedule_at(
            end,
            "lra-impulse-stop",
            Box::new(move || Ok(board.lock().stop_all_lras()?)),
        )
    }

    /// Snapshot of the actuator table.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] when stopped.
    pub fn actuators(&self) -> AnapadResult<Vec<Actuator>> {
        Ok(self.board()?.lock().actuators().to_vec())
    }

    /// Snapshot of one actuator.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] when stopped.
    pub fn actuator(&self, reference: Reference) -> AnapadResult<Option<Actuator>> {
        Ok(self.board()?.lock().actuator(reference).copied())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    /// Whether the board is running.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Active configuration.
    pub fn config(&self) -> &HapticsConfig {
        &self.config
    }
}

impl Drop for HapticsBoardController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "haptics stop on drop failed");
        }
    }
}

impl std::fmt::Debug for HapticsBoardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticsBoardController")
            .field("bus_index", &self.config.bus_index)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
