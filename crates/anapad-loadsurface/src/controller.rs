//! Load surface lifecycle and polling loop.

use std::sync::Arc;

use anapad_errors::{AnapadError, AnapadResult, ProtocolError};
use anapad_i2c::{BusHandle, BusProvider};
use anapad_polling::{
    FailureTracker, FailureVerdict, Latest, LifecycleState, Listeners, OneShot, PendingResults,
    PollFailure, PollingThread, SharedLifecycle, StopToken, Subscription, TouchPresence,
};
use tracing::{debug, error, info, warn};

use crate::adc::ForceChannel;
use crate::config::LoadSurfaceConfig;
use crate::multiplexer::ChannelMultiplexer;
use crate::sample::{Sample, SampleResult};

const SUBSYSTEM: &str = "load surface";
const THREAD_NAME: &str = "load-surface";

/// Everything the polling thread owns while running.
#[derive(Debug)]
struct Hardware {
    bus: BusHandle,
    mux: ChannelMultiplexer,
    channels: Vec<ForceChannel>,
}

impl Hardware {
    /// Sample every channel once, in order.
    fn tick(&mut self, touch_present: bool) -> AnapadResult<SampleResult> {
        let mut samples = Vec::with_capacity(self.channels.len());
        for channel in &mut self.channels {
            self.mux.set_channel(&mut self.bus, channel.channel())?;
            let percent_offset = channel.sample_percent_offset(&mut self.bus, !touch_present)?;
            samples.push(Sample {
                index: channel.index(),
                channel: channel.channel(),
                location: channel.location(),
                raw_sample: channel.last_sample(),
                filtered_sample: channel.last_filtered(),
                filtered_baseline_sample: channel.last_baseline(),
                percent_offset,
            });
        }
        Ok(SampleResult::new(samples))
    }

    fn shutdown(mut self) {
        if let Err(e) = self.mux.disable(&mut self.bus) {
            debug!(error = %e, "multiplexer disable on stop failed");
        }
        if let Err(e) = self.bus.close() {
            warn!(error = %e, "load surface bus close failed");
        }
    }
}

/// State shared between the controller and its polling thread.
#[derive(Debug)]
struct Shared {
    latest: Latest<SampleResult>,
    results: Listeners<Arc<SampleResult>>,
    pending: PendingResults<Arc<SampleResult>>,
    failures: Listeners<PollFailure>,
    lifecycle: SharedLifecycle,
}

impl Shared {
    fn publish(&self, result: SampleResult) {
        let result = Arc::new(result);
        self.latest.store(Arc::clone(&result));
        self.results.publish(&result);
        self.pending.fulfill(&result);
    }
}

/// Owns the load surface bus and its polling thread.
pub struct LoadSurfaceController {
    config: LoadSurfaceConfig,
    provider: Arc<dyn BusProvider>,
    touch: Arc<dyn TouchPresence>,
    shared: Arc<Shared>,
    thread: Option<PollingThread<Hardware>>,
}

impl LoadSurfaceController {
    /// Create a stopped controller.
    ///
    /// `touch` tells the polling loop when to freeze baseline tracking.
    pub fn new(
        config: LoadSurfaceConfig,
        provider: Arc<dyn BusProvider>,
        touch: Arc<dyn TouchPresence>,
    ) -> Self {
        let shared = Arc::new(Shared {
            latest: Latest::new(),
            results: Listeners::new("load-surface-results", config.listener_capacity),
            pending: PendingResults::new(),
            failures: Listeners::new("load-surface-failures", config.listener_capacity),
            lifecycle: SharedLifecycle::default(),
        });
        Self {
            config,
            provider,
            touch,
            shared,
            thread: None,
        }
    }

    /// Open the bus, bring up every channel and start polling.
    ///
    /// On failure nothing is left running and the bus is closed.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::AlreadyRunning`] if started twice, a
    /// configuration error for invalid settings, a bus error from any
    /// bring-up step, or [`ProtocolError::CalibrationFailed`] when a channel
    /// never calibrates.
    pub fn start(&mut self) -> AnapadResult<()> {
        if self.thread.is_some() {
            return Err(AnapadError::AlreadyRunning(SUBSYSTEM));
        }
        self.config.validate()?;
        self.shared.lifecycle.set(LifecycleState::Starting);
        info!(
            bus = self.config.bus_index,
            channels = self.config.channels.len(),
            "starting load surface"
        );

        match self.bring_up().and_then(|hardware| self.spawn(hardware)) {
            Ok(thread) => {
                self.thread = Some(thread);
                self.shared.lifecycle.set(LifecycleState::Running);
                info!("load surface running");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "load surface start failed");
                self.shared.lifecycle.set(LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    fn bring_up(&self) -> AnapadResult<Hardware> {
        let mut bus = self.provider.open(self.config.bus_index)?;
        let mut mux = ChannelMultiplexer::new(self.config.multiplexer_address);
        match self.configure_channels(&mut bus, &mut mux) {
            Ok(channels) => Ok(Hardware { bus, mux, channels }),
            Err(e) => {
                if let Err(close) = bus.close() {
                    warn!(error = %close, "bus close after failed start failed");
                }
                Err(e)
            }
        }
    }

    fn configure_channels(
        &self,
        bus: &mut BusHandle,
        mux: &mut ChannelMultiplexer,
    ) -> AnapadResult<Vec<ForceChannel>> {
        mux.disable(bus)?;

        let mut channels = Vec::with_capacity(self.config.channels.len());
        for (index, entry) in self.config.channels.iter().enumerate() {
            let mut channel = ForceChannel::from_config(index, entry, &self.config);
            mux.set_channel(bus, entry.channel)?;
            let mut calibrated = channel.configure(bus)?;
            let mut attempts = 1;
            while !calibrated && attempts < self.config.calibration_attempts {
                attempts += 1;
                calibrated = channel.calibrate(bus)?;
            }
            if !calibrated {
                return Err(ProtocolError::CalibrationFailed {
                    channel: entry.channel.index(),
                    attempts,
                }
                .into());
            }
            debug!(channel = %entry.channel, attempts, "force channel ready");
            channels.push(channel);
        }

        for channel in &mut channels {
            mux.set_channel(bus, channel.channel())?;
            channel.synchronize_sample_cycle(bus)?;
        }
        Ok(channels)
    }

    fn spawn(&self, hardware: Hardware) -> AnapadResult<PollingThread<Hardware>> {
        let shared = Arc::clone(&self.shared);
        let touch = Arc::clone(&self.touch);
        let threshold = self.config.failure_threshold;
        PollingThread::spawn(THREAD_NAME, move |stop| {
            poll(hardware, &stop, &shared, touch.as_ref(), threshold)
        })
    }

    /// Stop polling and release the bus. Safe to call when stopped.
    ///
    /// Pending one-shot receivers are cancelled.
    ///
    /// # Errors
    ///
    /// Currently infallible; shutdown problems are logged.
    pub fn stop(&mut self) -> AnapadResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        info!("stopping load surface");
        match thread.stop(self.config.stop_timeout()) {
            Some(hardware) => hardware.shutdown(),
            None => warn!("load surface thread did not return its bus"),
        }
        self.shared.pending.cancel_all();
        self.shared.lifecycle.set(LifecycleState::Stopped);
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.shared.lifecycle.get()
    }

    /// Whether the polling thread is active.
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Receive every future result.
    pub fn subscribe_results(&self) -> Subscription<Arc<SampleResult>> {
        self.shared.results.subscribe()
    }

    /// Receive the next result only.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] unless the loop is running.
    pub fn next_result(&self) -> AnapadResult<OneShot<Arc<SampleResult>>> {
        if !self.is_running() {
            return Err(AnapadError::NotRunning(SUBSYSTEM));
        }
        Ok(self.shared.pending.register())
    }

    /// Most recent result, if any tick has completed.
    pub fn latest_result(&self) -> Option<Arc<SampleResult>> {
        self.shared.latest.load()
    }

    /// Receive the one notification sent if the loop gives up.
    pub fn subscribe_failures(&self) -> Subscription<PollFailure> {
        self.shared.failures.subscribe()
    }

    /// Active configuration.
    pub fn config(&self) -> &LoadSurfaceConfig {
        &self.config
    }
}

impl Drop for LoadSurfaceController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "load surface stop on drop failed");
        }
    }
}

impl std::fmt::Debug for LoadSurfaceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadSurfaceController")
            .field("bus_index", &self.config.bus_index)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn poll(
    mut hardware: Hardware,
    stop: &StopToken,
    shared: &Shared,
    touch: &dyn TouchPresence,
    threshold: u32,
) -> Hardware {
    let mut failures = FailureTracker::new(threshold);
    while !stop.is_stop_requested() {
        match hardware.tick(touch.touch_present()) {
            Ok(result) => {
                failures.record_success();
                shared.publish(result);
            }
            Err(e) => match failures.record_failure() {
                FailureVerdict::Continue { consecutive } => {
                    warn!(
                        error = %e,
                        severity = %e.severity(),
                        retryable = e.is_retryable(),
                        consecutive,
                        "load surface tick failed"
                    );
                }
                FailureVerdict::Tripped { consecutive } => {
                    error!(
                        error = %e,
                        severity = %e.severity(),
                        consecutive,
                        "load surface polling giving up"
                    );
                    shared.lifecycle.set(LifecycleState::Failed);
                    shared
                        .failures
                        .publish(&PollFailure::new(SUBSYSTEM, consecutive, &e));
                    shared.pending.cancel_all();
                    break;
                }
            },
        }
    }
    hardware
}
