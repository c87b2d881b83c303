//! Whole-device lifecycle.

use std::sync::Arc;

use anapad_errors::AnapadResult;
use anapad_haptics::HapticsBoardController;
use anapad_i2c::BusProvider;
use anapad_loadsurface::LoadSurfaceController;
use anapad_polling::{PollFailure, Subscription};
use anapad_touchscreen::{Touch, TouchscreenController};
use tracing::{error, info, warn};

use crate::config::AnapadConfig;
use crate::feedback::{FeedbackAction, FeedbackConfig, ForceFeedback, TouchTransform};

/// The three subsystems, started and stopped together.
///
/// Start order is touchscreen, haptics, load surface, so that the load
/// surface's baseline freeze is backed by a live touch signal from its first
/// tick. Stop runs in reverse.
pub struct Anapad {
    touchscreen: TouchscreenController,
    haptics: HapticsBoardController,
    load_surface: LoadSurfaceController,
    feedback: FeedbackConfig,
}

impl Anapad {
    /// Build stopped subsystems on buses from `provider`.
    pub fn new(config: AnapadConfig, provider: Arc<dyn BusProvider>) -> Self {
        let touchscreen = TouchscreenController::new(config.touchscreen, Arc::clone(&provider));
        let touch = Arc::new(touchscreen.touch_signal());
        let haptics = HapticsBoardController::new(config.haptics, Arc::clone(&provider));
        let load_surface = LoadSurfaceController::new(config.load_surface, provider, touch);
        Self {
            touchscreen,
            haptics,
            load_surface,
            feedback: config.feedback,
        }
    }

    /// Start every subsystem.
    ///
    /// # Errors
    ///
    /// Returns the first start error, after stopping whatever had already
    /// started.
    pub fn start(&mut self) -> AnapadResult<()> {
        info!("starting anapad");
        self.touchscreen.start()?;

        if let Err(e) = self.haptics.start() {
            self.stop_touchscreen();
            return Err(e);
        }

        if let Err(e) = self.load_surface.start() {
            self.stop_haptics();
            self.stop_touchscreen();
            return Err(e);
        }
        info!("anapad running");
        Ok(())
    }

    /// Stop every subsystem, continuing past failures.
    ///
    /// # Errors
    ///
    /// Returns the first stop error once all three have been stopped.
    pub fn stop(&mut self) -> AnapadResult<()> {
        info!("stopping anapad");
        let load_surface = self.load_surface.stop();
        if let Err(e) = &load_surface {
            error!(error = %e, "load surface stop failed");
        }
        let haptics = self.haptics.stop();
        if let Err(e) = &haptics {
            error!(error = %e, "haptics stop failed");
        }
        let touchscreen = self.touchscreen.stop();
        if let Err(e) = &touchscreen {
            error!(error = %e, "touchscreen stop failed");
        }
        load_surface.and(haptics).and(touchscreen)
    }

    fn stop_haptics(&mut self) {
        if let Err(e) = self.haptics.stop() {
            warn!(error = %e, "haptics stop during rollback failed");
        }
    }

    fn stop_touchscreen(&mut self) {
        if let Err(e) = self.touchscreen.stop() {
            warn!(error = %e, "touchscreen stop during rollback failed");
        }
    }

    /// Whether all three subsystems are running.
    pub fn is_running(&self) -> bool {
        self.touchscreen.is_running()
            && self.haptics.is_running()
            && self.load_surface.is_running()
    }

    /// Touch controller.
    pub fn touchscreen(&self) -> &TouchscreenController {
        &self.touchscreen
    }

    /// Haptics board.
    pub fn haptics(&self) -> &HapticsBoardController {
        &self.haptics
    }

    /// Load surface.
    pub fn load_surface(&self) -> &LoadSurfaceController {
        &self.load_surface
    }

    /// Failure notifications from both polling subsystems.
    pub fn subscribe_failures(&self) -> [Subscription<PollFailure>; 2] {
        [
            self.touchscreen.subscribe_failures(),
            self.load_surface.subscribe_failures(),
        ]
    }

    /// Feedback state built from the configured tuning.
    pub fn force_feedback(&self) -> ForceFeedback {
        ForceFeedback::new(self.feedback.clone())
    }

    /// Chip-to-view transform, once the resolution is known.
    pub fn touch_transform(&self) -> Option<TouchTransform> {
        self.touchscreen.resolution().map(|resolution| {
            TouchTransform::new(resolution, self.feedback.view_width, self.feedback.view_height)
        })
    }

    /// Run one touch frame through `feedback` against the latest force
    /// sample.
    ///
    /// # Errors
    ///
    /// Returns the actuation error.
    pub fn feed(
        &self,
        touches: &[Touch],
        feedback: &mut ForceFeedback,
    ) -> AnapadResult<FeedbackAction> {
        let Some(transform) = self.touch_transform() else {
            return Ok(FeedbackAction::Idle);
        };
        let locations: Vec<_> = touches.iter().map(|t| transform.apply(t)).collect();
        let sample = self.load_surface.latest_result();
        feedback.on_touches(&locations, sample.as_deref(), &self.haptics)
    }
}

impl Drop for Anapad {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "anapad stop on drop failed");
        }
    }
}

impl std::fmt::Debug for Anapad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anapad")
            .field("touchscreen", &self.touchscreen)
            .field("haptics", &self.haptics)
            .field("load_surface", &self.load_surface)
            .finish_non_exhaustive()
    }
}
