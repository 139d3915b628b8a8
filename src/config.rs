//! # Config Module
//!
//! Operator-editable settings, persisted as RON.
//!
//! A missing file is replaced by the defaults (written back so they can be
//! edited); a file that fails to parse is reported and the defaults are used.

use crate::error::{Result, TurretError};
use crate::serial::port::PortSettings;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default location of the configuration file.
pub const CONFIG_FILE: &str = "config/turret.ron";

/// Distance thresholds in centimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// LASER_ACTIVATION_MIN_RANGE
    pub laser_min_cm: f32,
    /// LASER_ACTIVATION_MAX_RANGE
    pub laser_max_cm: f32,
    /// MAX_DETECTION_RANGE
    pub max_detection_cm: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            laser_min_cm: 20.0,
            laser_max_cm: 80.0,
            max_detection_cm: 200.0,
        }
    }
}

/// Timer periods of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub scan_period_ms: u64,
    /// servo degrees per scan tick
    pub scan_step_deg: u16,
    pub laser_cooldown_ms: u64,
    pub resume_delay_ms: u64,
}

impl Timing {
    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms)
    }

    pub fn laser_cooldown(&self) -> Duration {
        Duration::from_millis(self.laser_cooldown_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            scan_period_ms: 50,
            scan_step_deg: 2,
            laser_cooldown_ms: 2000,
            resume_delay_ms: 0,
        }
    }
}

/// Complete controller configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretConfig {
    pub port: PortSettings,
    pub thresholds: Thresholds,
    pub timing: Timing,
}

impl TurretConfig {
    /// Parses a RON document.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| TurretError::config_parse(e.to_string()))
    }

    /// Serializes to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| TurretError::config_parse(e.to_string()))
    }

    /// Reads and validates the configuration at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Loads `path`, falling back to defaults when it is missing or broken.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!("Wrote default configuration to {}", path.display()),
                Err(e) => warn!("Failed to write default configuration: {e}"),
            }
            return config;
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Rejects settings the controller cannot run with.
    // negated comparisons so NaN thresholds fail as well
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        // a distance of 0 or below is "no echo" and must never fire the laser
        if !(t.laser_min_cm > 0.0) {
            return Err(TurretError::invalid_config(format!(
                "laser_min_cm must be positive, got {}",
                t.laser_min_cm
            )));
        }
        if !(t.laser_min_cm <= t.laser_max_cm) {
            return Err(TurretError::invalid_config(format!(
                "laser_min_cm ({}) exceeds laser_max_cm ({})",
                t.laser_min_cm, t.laser_max_cm
            )));
        }
        if !(t.laser_max_cm <= t.max_detection_cm) {
            return Err(TurretError::invalid_config(format!(
                "laser_max_cm ({}) exceeds max_detection_cm ({})",
                t.laser_max_cm, t.max_detection_cm
            )));
        }
        if self.timing.scan_period_ms == 0 {
            return Err(TurretError::invalid_config("scan_period_ms must be positive"));
        }
        if self.timing.scan_step_deg == 0 || self.timing.scan_step_deg > 180 {
            return Err(TurretError::invalid_config(format!(
                "scan_step_deg must be within 1..=180, got {}",
                self.timing.scan_step_deg
            )));
        }
        if self.port.baud_rate == 0 {
            return Err(TurretError::invalid_config("baud_rate must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = TurretConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.scan_period(), Duration::from_millis(50));
        assert_eq!(config.timing.laser_cooldown(), Duration::from_secs(2));
        assert_eq!(config.timing.resume_delay(), Duration::ZERO);
        assert_eq!(config.port.baud_rate, 115200);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = TurretConfig::from_ron("(thresholds: (laser_max_cm: 60.0))").unwrap();
        assert_eq!(config.thresholds.laser_max_cm, 60.0);
        assert_eq!(config.thresholds.laser_min_cm, 20.0);
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = TurretConfig::default();
        config.thresholds.laser_min_cm = 90.0;
        assert!(matches!(config.validate(), Err(TurretError::InvalidConfig(_))));

        let mut config = TurretConfig::default();
        config.thresholds.max_detection_cm = 50.0;
        assert!(config.validate().is_err());

        let mut config = TurretConfig::default();
        config.timing.scan_step_deg = 0;
        assert!(config.validate().is_err());

        let mut config = TurretConfig::default();
        config.thresholds.laser_min_cm = 0.0;
        assert!(matches!(config.validate(), Err(TurretError::InvalidConfig(_))));

        let mut config = TurretConfig::default();
        config.thresholds.laser_min_cm = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("turret.ron");
        let mut config = TurretConfig::default();
        config.port.port_name = Some("/dev/ttyACM1".to_string());
        config.timing.laser_cooldown_ms = 1500;
        config.save(&path).unwrap();

        let loaded = TurretConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_writes_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turret.ron");
        let config = TurretConfig::load_or_default(&path);
        assert_eq!(config, TurretConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_or_default_on_broken_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("turret.ron");
        std::fs::write(&path, "(timing: (scan_period_ms: \"fast\"))").unwrap();
        assert!(matches!(
            TurretConfig::load(&path),
            Err(TurretError::ConfigParse(_))
        ));
        assert_eq!(TurretConfig::load_or_default(&path), TurretConfig::default());
    }
}
