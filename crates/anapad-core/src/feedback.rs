//! Correlating touches with force to drive the actuators.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anapad_errors::{AnapadResult, ConfigurationError};
use anapad_geometry::Location;
use anapad_haptics::HapticsBoardController;
use anapad_loadsurface::SampleResult;
use anapad_touchscreen::{Resolution, Touch};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// How force turns into haptics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    /// One short impulse per press, like a trackpad click
    #[default]
    Click,
    /// Vibration under the finger, scaled by force, for as long as it is down
    Continuous,
}

impl fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackMode::Click => write!(f, "click"),
            FeedbackMode::Continuous => write!(f, "continuous"),
        }
    }
}

impl FromStr for FeedbackMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "click" => Ok(FeedbackMode::Click),
            "continuous" => Ok(FeedbackMode::Continuous),
            other => Err(ConfigurationError::invalid(
                "feedback.mode",
                format!("unknown mode '{other}', expected click or continuous"),
            )),
        }
    }
}

/// Force feedback tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// View width in pixels; touches are scaled into this space.
    pub view_width: f64,

    /// View height in pixels.
    pub view_height: f64,

    /// Actuators within this many pixels of the touch are driven.
    pub actuation_radius: f64,

    /// Percent offset that maps to full amplitude in continuous mode.
    pub max_load_offset: f64,

    /// Percent offset above which an armed detector fires.
    pub press_threshold: f64,

    /// Percent offset below which the detector re-arms.
    pub release_threshold: f64,

    /// RTP amplitude of a click, and the ceiling in continuous mode.
    pub impulse_amplitude: u8,

    /// Click length, in milliseconds.
    pub impulse_duration_ms: u64,

    /// Feedback mode.
    pub mode: FeedbackMode,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            view_width: 1920.0,
            view_height: 515.0,
            actuation_radius: 130.0,
            max_load_offset: 0.08,
            press_threshold: 0.006,
            release_threshold: 0.004,
            impulse_amplitude: 127,
            impulse_duration_ms: 30,
            mode: FeedbackMode::Click,
        }
    }
}

impl FeedbackConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive sizes or thresholds, or a release
    /// threshold above the press threshold.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("feedback.view_width", self.view_width),
            ("feedback.view_height", self.view_height),
            ("feedback.actuation_radius", self.actuation_radius),
            ("feedback.max_load_offset", self.max_load_offset),
            ("feedback.press_threshold", self.press_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::invalid(field, "must be positive"));
            }
        }
        if !self.release_threshold.is_finite()
            || self.release_threshold < 0.0
            || self.release_threshold > self.press_threshold
        {
            return Err(ConfigurationError::invalid(
                "feedback.release_threshold",
                "must be between zero and the press threshold",
            ));
        }
        Ok(())
    }

    /// Click length.
    #[must_use]
    pub fn impulse_duration(&self) -> Duration {
        Duration::from_millis(self.impulse_duration_ms)
    }
}

/// Scales chip coordinates into view coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchTransform {
    x_multiplier: f64,
    y_multiplier: f64,
}

impl TouchTransform {
    /// Transform from a panel `resolution` to a `width` x `height` view.
    pub fn new(resolution: Resolution, width: f64, height: f64) -> Self {
        Self {
            x_multiplier: width / f64::from(resolution.x.max(1)),
            y_multiplier: height / f64::from(resolution.y.max(1)),
        }
    }

    /// View location of `touch`.
    pub fn apply(&self, touch: &Touch) -> Location {
        Location::new(
            f64::from(touch.x) * self.x_multiplier,
            f64::from(touch.y) * self.y_multiplier,
        )
    }
}

/// Press detection with hysteresis.
///
/// Fires once when the offset rises above the press threshold, then stays
/// quiet until the offset falls below the release threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PressDetector {
    press_threshold: f64,
    release_threshold: f64,
    armed: bool,
}

impl PressDetector {
    /// Armed detector.
    pub fn new(press_threshold: f64, release_threshold: f64) -> Self {
        Self {
            press_threshold,
            release_threshold,
            armed: true,
        }
    }

    /// Feed one offset; returns `true` on a press.
    pub fn update(&mut self, offset: f64) -> bool {
        if self.armed && offset > self.press_threshold {
            self.armed = false;
            return true;
        }
        if offset < self.release_threshold {
            self.armed = true;
        }
        false
    }

    /// Re-arm, for example when the finger lifts.
    pub fn rearm(&mut self) {
        self.armed = true;
    }

    /// Whether the next offset above the press threshold fires.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Actuation surface used by [`ForceFeedback`].
pub trait Actuation {
    /// Drive exactly the actuators within `radius` of `location`.
    fn set_lras_within(&self, location: Location, radius: f64, rtp_value: u8) -> AnapadResult<()>;

    /// Turn every actuator off.
    fn stop_all_lras(&self) -> AnapadResult<()>;

    /// Pulse the actuators within `radius` of `location`.
    fn schedule_lra_impulse(
        &self,
        location: Location,
        radius: f64,
        rtp_value: u8,
        delay: Duration,
        duration: Duration,
    ) -> AnapadResult<()>;
}

impl Actuation for HapticsBoardController {
    fn set_lras_within(&self, location: Location, radius: f64, rtp_value: u8) -> AnapadResult<()> {
        HapticsBoardController::set_lras_within(self, location, radius, rtp_value).map(drop)
    }

    fn stop_all_lras(&self) -> AnapadResult<()> {
        HapticsBoardController::stop_all_lras(self)
    }

    fn schedule_lra_impulse(
        &self,
        location: Location,
        radius: f64,
        rtp_value: u8,
        delay: Duration,
        duration: Duration,
    ) -> AnapadResult<()> {
        HapticsBoardController::schedule_lra_impulse(
            self, location, radius, rtp_value, delay, duration,
        )
    }
}

/// What one call to [`ForceFeedback::on_touches`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackAction {
    /// Nothing to do
    Idle,
    /// Click impulse scheduled at the location
    Impulse(Location),
    /// Actuators driven at the location
    Drive {
        /// Touch location
        location: Location,
        /// RTP amplitude
        rtp_value: u8,
    },
    /// Every actuator turned off
    Silence,
}

/// Turns touch frames and force samples into actuation.
///
/// Only the first touch of a frame is considered.
#[derive(Debug, Clone)]
pub struct ForceFeedback {
    config: FeedbackConfig,
    press: PressDetector,
    driving: bool,
}

impl ForceFeedback {
    /// Feedback with the given tuning.
    pub fn new(config: FeedbackConfig) -> Self {
        let press = PressDetector::new(config.press_threshold, config.release_threshold);
        Self {
            config,
            press,
            driving: false,
        }
    }

    /// Active tuning.
    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Handle one frame of view-space touch locations.
    ///
    /// `sample` is the most recent load surface result; without one no
    /// force is known and nothing is driven.
    ///
    /// # Errors
    ///
    /// Returns the actuation error.
    pub fn on_touches(
        &mut self,
        touches: &[Location],
        sample: Option<&SampleResult>,
        haptics: &dyn Actuation,
    ) -> AnapadResult<FeedbackAction> {
        let Some(&primary) = touches.first() else {
            return self.on_release(haptics);
        };
        let Some(sample) = sample else {
            return Ok(FeedbackAction::Idle);
        };
        let offset = sample.weighted_percent_offset(primary);
        trace!(%primary, offset, "feedback input");

        match self.config.mode {
            FeedbackMode::Click => {
                if !self.press.update(offset) {
                    return Ok(FeedbackAction::Idle);
                }
                debug!(%primary, offset, "press");
                haptics.schedule_lra_impulse(
                    primary,
                    self.config.actuation_radius,
                    self.config.impulse_amplitude,
                    Duration::ZERO,
                    self.config.impulse_duration(),
                )?;
                Ok(FeedbackAction::Impulse(primary))
            }
            FeedbackMode::Continuous => {
                let rtp_value = self.amplitude_for(offset);
                haptics.set_lras_within(primary, self.config.actuation_radius, rtp_value)?;
                self.driving = true;
                Ok(FeedbackAction::Drive {
                    location: primary,
                    rtp_value,
                })
            }
        }
    }

    fn on_release(&mut self, haptics: &dyn Actuation) -> AnapadResult<FeedbackAction> {
        self.press.rearm();
        if !self.driving {
            return Ok(FeedbackAction::Idle);
        }
        self.driving = false;
        haptics.stop_all_lras()?;
        Ok(FeedbackAction::Silence)
    }

    /// Continuous-mode amplitude: offset clamped to `[0, max_load_offset]`,
    /// scaled to `[0, impulse_amplitude]`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the scaled value lies in [0, impulse_amplitude]"
    )]
    pub fn amplitude_for(&self, offset: f64) -> u8 {
        let ratio = offset.clamp(0.0, self.config.max_load_offset) / self.config.max_load_offset;
        (ratio * f64::from(self.config.impulse_amplitude)).floor() as u8
    }
}
