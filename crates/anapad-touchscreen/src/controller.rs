//! Touchscreen lifecycle and polling loop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anapad_errors::{AnapadError, AnapadResult};
use anapad_i2c::{BusHandle, BusProvider};
use anapad_polling::{
    FailureTracker, FailureVerdict, Latest, LifecycleState, Listeners, PollFailure, PollingThread,
    SharedLifecycle, StopToken, Subscription, TouchSignal,
};
use tracing::{debug, error, info, warn};

use crate::config::TouchscreenConfig;
use crate::configuration::TouchscreenConfiguration;
use crate::driver::TouchscreenDriver;
use crate::touch::{Resolution, Touch};

const SUBSYSTEM: &str = "touchscreen";
const THREAD_NAME: &str = "touchscreen";

/// Longest wait for a full subscriber queue when publishing a lift.
const LIFT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(100);

/// Touches from one frame, shared between subscribers.
pub type TouchFrame = Arc<Vec<Touch>>;

#[derive(Debug)]
struct Hardware {
    bus: BusHandle,
    driver: TouchscreenDriver,
}

impl Hardware {
    fn shutdown(mut self) {
        if let Err(e) = self.bus.close() {
            warn!(error = %e, "touchscreen bus close failed");
        }
    }
}

#[derive(Debug)]
struct Shared {
    latest: Latest<Vec<Touch>>,
    resolution: Latest<Resolution>,
    touches: Listeners<TouchFrame>,
    configuration_changes: Listeners<TouchscreenConfiguration>,
    resolutions: Listeners<Resolution>,
    failures: Listeners<PollFailure>,
    lifecycle: SharedLifecycle,
    signal: TouchSignal,
}

impl Shared {
    fn publish(&self, touches: Vec<Touch>) {
        self.signal.set(!touches.is_empty());
        let touches = Arc::new(touches);
        self.latest.store(Arc::clone(&touches));
        if touches.is_empty() {
            self.touches.publish_within(&touches, LIFT_DELIVERY_TIMEOUT);
        } else {
            self.touches.publish(&touches);
        }
    }
}

/// Owns the touchscreen bus and its polling thread.
///
/// The polling thread keeps a [`TouchSignal`] current; hand it to the load
/// surface through [`TouchscreenController::touch_signal`].
pub struct TouchscreenController {
    config: TouchscreenConfig,
    provider: Arc<dyn BusProvider>,
    desired: Option<TouchscreenConfiguration>,
    shared: Arc<Shared>,
    thread: Option<PollingThread<Hardware>>,
}

impl TouchscreenController {
    /// Create a stopped controller.
    pub fn new(config: TouchscreenConfig, provider: Arc<dyn BusProvider>) -> Self {
        let shared = Arc::new(Shared {
            latest: Latest::new(),
            resolution: Latest::new(),
            touches: Listeners::new("touchscreen-touches", config.listener_capacity),
            configuration_changes: Listeners::new(
                "touchscreen-configuration",
                config.listener_capacity,
            ),
            resolutions: Listeners::new("touchscreen-resolution", config.listener_capacity),
            failures: Listeners::new("touchscreen-failures", config.listener_capacity),
            lifecycle: SharedLifecycle::default(),
            signal: TouchSignal::new(),
        });
        Self {
            config,
            provider,
            desired: None,
            shared,
            thread: None,
        }
    }

    /// Configuration block to program on the next start, overriding
    /// `configuration_path`.
    pub fn set_desired_configuration(&mut self, configuration: Option<TouchscreenConfiguration>) {
        self.desired = configuration;
    }

    /// Open the bus, read the resolution, reprogram the chip if its
    /// configuration differs from the desired one, and start polling.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::AlreadyRunning`] if started twice, an I/O or
    /// length error for an unreadable configuration file, or the first bus
    /// or protocol error. Nothing is left open.
    pub fn start(&mut self) -> AnapadResult<()> {
        if self.thread.is_some() {
            return Err(AnapadError::AlreadyRunning(SUBSYSTEM));
        }
        self.config.validate()?;
        self.shared.lifecycle.set(LifecycleState::Starting);
        info!(bus = self.config.bus_index, "starting touchscreen");

        let started = self
            .desired_configuration()
            .and_then(|desired| self.bring_up(desired.as_ref()))
            .and_then(|hardware| self.spawn(hardware));
        match started {
            Ok(thread) => {
                self.thread = Some(thread);
                self.shared.lifecycle.set(LifecycleState::Running);
                info!("touchscreen running");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "touchscreen start failed");
                self.shared.lifecycle.set(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    fn desired_configuration(&self) -> AnapadResult<Option<TouchscreenConfiguration>> {
        if let Some(desired) = &self.desired {
            return Ok(Some(desired.clone()));
        }
        match &self.config.configuration_path {
            Some(path) => {
                debug!(path = %path.display(), "loading touchscreen configuration");
                TouchscreenConfiguration::from_file(path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn bring_up(&self, desired: Option<&TouchscreenConfiguration>) -> AnapadResult<Hardware> {
        let mut bus = self.provider.open(self.config.bus_index)?;
        let mut driver = TouchscreenDriver::new(self.config.address);
        match self.configure(&mut bus, &mut driver, desired) {
            Ok(()) => Ok(Hardware { bus, driver }),
            Err(e) => {
                if let Err(close) = bus.close() {
                    warn!(error = %close, "bus close after failed start failed");
                }
                Err(e)
            }
        }
    }

    fn configure(
        &self,
        bus: &mut BusHandle,
        driver: &mut TouchscreenDriver,
        desired: Option<&TouchscreenConfiguration>,
    ) -> AnapadResult<()> {
        let resolution = driver.read_resolution(bus)?;

        if let Some(desired) = desired {
            let current = driver.read_configuration(bus)?;
            if current == *desired {
                debug!(version = current.version(), "touchscreen configuration up to date");
            } else {
                info!(
                    from = current.version(),
                    to = desired.version(),
                    "reprogramming touchscreen"
                );
                driver.write_configuration(bus, desired)?;
                self.shared.configuration_changes.publish(desired);
            }
        }

        self.shared.resolution.store(Arc::new(resolution));
        self.shared.resolutions.publish(&resolution);
        Ok(())
    }

    fn spawn(&self, hardware: Hardware) -> AnapadResult<PollingThread<Hardware>> {
        let shared = Arc::clone(&self.shared);
        let threshold = self.config.failure_threshold;
        let idle = self.config.idle_poll_interval();
        PollingThread::spawn(THREAD_NAME, move |stop| {
            poll(hardware, &stop, &shared, threshold, idle)
        })
    }

    /// Stop polling and release the bus. Safe to call when stopped.
    ///
    /// The touch signal drops to "no touch".
    ///
    /// # Errors
    ///
    /// Currently infallible; shutdown problems are logged.
    pub fn stop(&mut self) -> AnapadResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        info!("stopping touchscreen");
        match thread.stop(self.config.stop_timeout()) {
            Some(hardware) => hardware.shutdown(),
            None => warn!("touchscreen thread did not return its bus"),
        }
        self.shared.signal.set(false);
        self.shared.lifecycle.set(LifecycleState::Stopped);
        Ok(())
    }

    /// Touch-present flag kept current by the polling thread.
    pub fn touch_signal(&self) -> TouchSignal {
        self.shared.signal.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.shared.lifecycle.get()
    }

    /// Whether the polling thread is active.
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Touches from the most recent ready frame.
    pub fn latest_touches(&self) -> Option<TouchFrame> {
        self.shared.latest.load()
    }

    /// Panel resolution, once read at start.
    pub fn resolution(&self) -> Option<Resolution> {
        self.shared.resolution.load().map(|r| *r)
    }

    /// Receive every touch frame. An empty frame means all fingers lifted.
    ///
    /// Frames with touches are dropped for a subscriber whose queue is full.
    /// Empty frames wait up to 100 ms for room, so only a subscriber stalled
    /// longer than that can miss a lift.
    pub fn subscribe_touches(&self) -> Subscription<TouchFrame> {
        self.shared.touches.subscribe()
    }

    /// Receive each configuration block programmed into the chip.
    pub fn subscribe_configuration_changes(&self) -> Subscription<TouchscreenConfiguration> {
        self.shared.configuration_changes.subscribe()
    }

    /// Receive the resolution read at each start.
    pub fn subscribe_resolution(&self) -> Subscription<Resolution> {
        self.shared.resolutions.subscribe()
    }

    /// Receive the one notification sent if the loop gives up.
    pub fn subscribe_failures(&self) -> Subscription<PollFailure> {
        self.shared.failures.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &TouchscreenConfig {
        &self.config
    }
}

impl Drop for TouchscreenController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "touchscreen stop on drop failed");
        }
    }
}

impl std::fmt::Debug for TouchscreenController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchscreenController")
            .field("bus_index", &self.config.bus_index)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn poll(
    mut hardware: Hardware,
    stop: &StopToken,
    shared: &Shared,
    threshold: u32,
    idle: Option<Duration>,
) -> Hardware {
    let mut failures = FailureTracker::new(threshold);
    while !stop.is_stop_requested() {
        match hardware.driver.sample_touches(&mut hardware.bus) {
            Ok(Some(touches)) => {
                failures.record_success();
                shared.publish(touches);
            }
            Ok(None) => {
                failures.record_success();
                if let Some(idle) = idle {
                    thread::sleep(idle);
                }
            }
            Err(e) => match failures.record_failure() {
                FailureVerdict::Continue { consecutive } => {
                    warn!(
                        error = %e,
                        severity = %e.severity(),
                        retryable = e.is_retryable(),
                        consecutive,
                        "touch sample failed"
                    );
                }
                FailureVerdict::Tripped { consecutive } => {
                    error!(
                        error = %e,
                        severity = %e.severity(),
                        consecutive,
                        "touchscreen polling giving up"
                    );
                    shared.signal.set(false);
                    shared.lifecycle.set(LifecycleState::Failed);
                    shared
                        .failures
                        .publish(&PollFailure::new(SUBSYSTEM, consecutive, &e));
                    break;
                }
            },
        }
    }
    hardware
}
