//! Aggregate configuration and file loading.

use std::fs;
use std::path::Path;

use anapad_errors::{AnapadError, AnapadResult, ConfigurationError};
use anapad_haptics::HapticsConfig;
use anapad_loadsurface::LoadSurfaceConfig;
use anapad_touchscreen::TouchscreenConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feedback::FeedbackConfig;

/// Whole-device configuration.
///
/// Every field defaults, so an empty file yields the stock Model A setup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnapadConfig {
    /// Touch controller settings.
    pub touchscreen: TouchscreenConfig,

    /// Haptics board settings.
    pub haptics: HapticsConfig,

    /// Load surface settings.
    pub load_surface: LoadSurfaceConfig,

    /// Force feedback tuning.
    pub feedback: FeedbackConfig,
}

impl AnapadConfig {
    /// Load a YAML (`.yaml`, `.yml`) or JSON (`.json`) file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, a config error for an
    /// unknown extension or malformed contents, or the validation error.
    pub fn load(path: impl AsRef<Path>) -> AnapadResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let content = fs::read_to_string(path)?;
        let config = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(AnapadError::config(format!(
                    "{}: expected a .yaml, .yml or .json file",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML.
    ///
    /// # Errors
    ///
    /// Returns a config error for malformed YAML, or the validation error.
    pub fn from_yaml_str(content: &str) -> AnapadResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| AnapadError::config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON.
    ///
    /// # Errors
    ///
    /// Returns a config error for malformed JSON, or the validation error.
    pub fn from_json_str(content: &str) -> AnapadResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| AnapadError::config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first section's error.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.touchscreen.validate()?;
        self.haptics.validate()?;
        self.load_surface.validate()?;
        self.feedback.validate()
    }
}
