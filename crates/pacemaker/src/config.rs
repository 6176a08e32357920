//! Pacing configuration with sensible defaults.
//!
//! [`PacingConfig`] holds every tunable the decision orchestrator reads. It
//! deserializes from a JSON object in which every key is optional, so a config
//! file only needs to list the settings it overrides. Keys owned by other
//! collaborators (poll interval, retention, ...) are ignored.
//!
//! # Examples
//!
//! ```ignore
//! let config = PacingConfig::load_or_default(Path::new("config.json"))?
//!     .with_weekly_limit(false);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{PacingError, PacingResult};
use crate::pacing::adaptive::{DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY, DEFAULT_SAFETY_BUFFER_PCT};
use crate::pacing::legacy::LEGACY_MIN_DELAY;

/// Settings for [`decide`](crate::pacing::decide).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Master switch. When `false` no decision is computed. Default: `true`.
    pub enabled: bool,
    /// Base delay for the legacy formula and minimum adaptive delay. Default: 5.
    pub base_delay: u32,
    /// Delay cap in seconds. Default: 350.
    pub max_delay: u32,
    /// Legacy deviation tolerance in percentage points. Default: 0.
    pub threshold_percent: f64,
    /// Share of the allowance usable before throttling. Default: 95.
    pub safety_buffer_pct: f64,
    /// Preload plateau for the 7-day window, in weekday hours. Default: 0.
    pub preload_hours: f64,
    /// Whether the 7-day window participates in pacing. Default: `true`.
    pub weekly_limit_enabled: bool,
    /// Use the adaptive engine; `false` selects the legacy formula. Default: `true`.
    pub use_adaptive: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            threshold_percent: 0.0,
            safety_buffer_pct: DEFAULT_SAFETY_BUFFER_PCT,
            preload_hours: 0.0,
            weekly_limit_enabled: true,
            use_adaptive: true,
        }
    }
}

impl PacingConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> PacingResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| PacingError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: PacingConfig =
            serde_json::from_str(&data).map_err(|source| PacingError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Loaded pacing config from {}", path.display());
        Ok(config)
    }

    /// Load a config from a JSON file, or use defaults if it doesn't exist.
    pub fn load_or_default(path: &Path) -> PacingResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> PacingResult<()> {
        if self.max_delay < self.base_delay {
            return Err(PacingError::InvalidConfig(format!(
                "max_delay ({}) must be at least base_delay ({})",
                self.max_delay, self.base_delay
            )));
        }
        // The legacy formula never returns less than its floor.
        if self.max_delay < LEGACY_MIN_DELAY {
            return Err(PacingError::InvalidConfig(format!(
                "max_delay ({}) must be at least {LEGACY_MIN_DELAY}",
                self.max_delay
            )));
        }
        if !(self.safety_buffer_pct > 0.0 && self.safety_buffer_pct <= 100.0) {
            return Err(PacingError::InvalidConfig(format!(
                "safety_buffer_pct must be in (0, 100], got {}",
                self.safety_buffer_pct
            )));
        }
        if self.preload_hours < 0.0 {
            return Err(PacingError::InvalidConfig(format!(
                "preload_hours must not be negative, got {}",
                self.preload_hours
            )));
        }
        if self.threshold_percent < 0.0 {
            return Err(PacingError::InvalidConfig(format!(
                "threshold_percent must not be negative, got {}",
                self.threshold_percent
            )));
        }
        Ok(())
    }

    pub fn with_delays(mut self, base_delay: u32, max_delay: u32) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_threshold(mut self, threshold_percent: f64) -> Self {
        self.threshold_percent = threshold_percent;
        self
    }

    pub fn with_safety_buffer(mut self, safety_buffer_pct: f64) -> Self {
        self.safety_buffer_pct = safety_buffer_pct;
        self
    }

    pub fn with_preload_hours(mut self, preload_hours: f64) -> Self {
        self.preload_hours = preload_hours;
        self
    }

    pub fn with_weekly_limit(mut self, enabled: bool) -> Self {
        self.weekly_limit_enabled = enabled;
        self
    }

    pub fn with_adaptive(mut self, enabled: bool) -> Self {
        self.use_adaptive = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = PacingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.base_delay, 5);
        assert_eq!(config.max_delay, 350);
        assert_eq!(config.threshold_percent, 0.0);
        assert_eq!(config.safety_buffer_pct, 95.0);
        assert_eq!(config.preload_hours, 0.0);
        assert!(config.weekly_limit_enabled);
        assert!(config.use_adaptive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_and_ignores_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"max_delay": 200, "preload_hours": 12.0, "poll_interval": 60}}"#
        )
        .unwrap();

        let config = PacingConfig::load(file.path()).unwrap();
        assert_eq!(config.max_delay, 200);
        assert_eq!(config.preload_hours, 12.0);
        assert_eq!(config.base_delay, 5);
        assert!(config.weekly_limit_enabled);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PacingConfig::load_or_default(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, PacingConfig::default());
    }

    #[test]
    fn missing_file_is_an_error_for_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = PacingConfig::load(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, PacingError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = PacingConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, PacingError::ConfigParse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert!(PacingConfig::default().with_delays(10, 5).validate().is_err());
        assert!(PacingConfig::default().with_delays(1, 3).validate().is_err());
        assert!(PacingConfig::default().with_delays(1, 5).validate().is_ok());
        assert!(PacingConfig::default().with_safety_buffer(0.0).validate().is_err());
        assert!(PacingConfig::default().with_safety_buffer(120.0).validate().is_err());
        assert!(PacingConfig::default().with_preload_hours(-1.0).validate().is_err());
        assert!(PacingConfig::default().with_threshold(-2.0).validate().is_err());
    }

    #[test]
    fn builder_methods_chain() {
        let config = PacingConfig::default()
            .with_delays(10, 200)
            .with_weekly_limit(false)
            .with_adaptive(false);
        assert_eq!(config.base_delay, 10);
        assert_eq!(config.max_delay, 200);
        assert!(!config.weekly_limit_enabled);
        assert!(!config.use_adaptive);
    }
}
