//! Configuration management.
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmark detector settings
    pub detector: DetectorConfig,
    /// Serial link settings
    pub serial: SerialConfig,
    /// Operator display settings
    pub display: DisplayConfig,
    /// Main loop settings
    pub relay: RelayConfig,
}

/// Landmark detector configuration.
///
/// The thresholds and hand count are forwarded to the detector process;
/// high confidences trade recall for fewer false positives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detector helper command line (program followed by arguments)
    pub command: Vec<String>,
    /// Minimum confidence for a new hand detection (0.0-1.0)
    pub detection_confidence: f32,
    /// Minimum confidence to keep tracking a hand (0.0-1.0)
    pub tracking_confidence: f32,
    /// Maximum number of hands the detector reports
    pub max_hands: u32,
    /// Flip landmarks horizontally (x -> 1 - x) so they match the selfie
    /// view.  Turn off only for a detector that already mirrors its input.
    pub mirror: bool,
}

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Open the link at startup; when false the relay runs detect-only
    pub enabled: bool,
    /// Device path (e.g. /dev/ttyUSB0, /dev/rfcomm0)
    pub port: PathBuf,
    /// Line speed in baud
    pub baud_rate: u32,
    /// Delay after opening before the first write (ms)
    pub settle_ms: u64,
}

/// Operator display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Run without the terminal overlay
    pub headless: bool,
    /// Exit-key poll timeout per frame (ms)
    pub poll_timeout_ms: u64,
    /// Landmark plot width in character cells
    pub plot_cols: u16,
    /// Landmark plot height in character cells
    pub plot_rows: u16,
    /// Log destination while the terminal overlay owns the screen
    pub log_file: PathBuf,
}

/// Main loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Interval between status log lines (seconds, 0 = disabled)
    pub status_interval_secs: u64,
    /// Number of frames kept for timing statistics
    pub timing_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string(), "hand_landmarks.py".to_string()],
            detection_confidence: 0.7,
            tracking_confidence: 0.7,
            max_hands: 1,
            mirror: true,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 9600,
            settle_ms: 2000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            headless: false,
            poll_timeout_ms: 1,
            plot_cols: 48,
            plot_rows: 20,
            log_file: base_dir().join("relay.log"),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 30,
            timing_window: 300,
        }
    }
}

/// `~/.gesture_relay`, or the working directory without a home.
fn base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".gesture_relay"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.detector.command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(Error::Config("detector command must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.detector.detection_confidence) {
            return Err(Error::Config(format!(
                "detection_confidence must be in [0, 1], got {}",
                self.detector.detection_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.detector.tracking_confidence) {
            return Err(Error::Config(format!(
                "tracking_confidence must be in [0, 1], got {}",
                self.detector.tracking_confidence
            )));
        }
        if self.detector.max_hands == 0 {
            return Err(Error::Config("max_hands must be > 0".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("baud_rate must be > 0".to_string()));
        }
        if self.serial.enabled && self.serial.port.as_os_str().is_empty() {
            return Err(Error::Config("serial port must not be empty".to_string()));
        }
        if self.display.plot_cols < 8 || self.display.plot_rows < 4 {
            return Err(Error::Config(format!(
                "plot must be at least 8x4 cells, got {}x{}",
                self.display.plot_cols, self.display.plot_rows
            )));
        }
        if self.relay.timing_window == 0 {
            return Err(Error::Config("timing_window must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load config from file.  Not validated here: command-line overrides
    /// are applied first, then the caller validates the result.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load config from the default location, or defaults if no file exists
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        base_dir().join("config.toml")
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detector.detection_confidence, 0.7);
        assert_eq!(config.detector.tracking_confidence, 0.7);
        assert_eq!(config.detector.max_hands, 1);
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.settle_ms, 2000);
        assert!(config.serial.enabled);
        assert!(!config.display.headless);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("[detector]"));
        assert!(toml.contains("[serial]"));
        assert!(toml.contains("[display]"));
        assert!(toml.contains("[relay]"));
        assert!(toml.contains("max_hands = 1"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [serial]
            port = "/dev/rfcomm0"
            "#,
        )
        .unwrap();
        assert_eq!(config.serial.port, PathBuf::from("/dev/rfcomm0"));
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.detector.max_hands, 1);
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.detector.detection_confidence = 0.5;
        original.serial.baud_rate = 115200;
        original.display.headless = true;

        original.save(&config_path).expect("Failed to save config");
        assert!(config_path.exists());

        let loaded = Config::load(&config_path).expect("Failed to load config");
        assert_eq!(loaded.detector.detection_confidence, 0.5);
        assert_eq!(loaded.serial.baud_rate, 115200);
        assert!(loaded.display.headless);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_out_of_range_values_fail_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[detector]\ndetection_confidence = 1.5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_mirror_defaults_on() {
        let config: Config = toml::from_str("[detector]\nmax_hands = 2\n").unwrap();
        assert!(config.detector.mirror);
        let config: Config = toml::from_str("[detector]\nmirror = false\n").unwrap();
        assert!(!config.detector.mirror);
    }

    #[test]
    fn test_invalid_toml_parsing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("garbage.toml");
        std::fs::write(&path, "this is not valid toml {{{}}}").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_validate_tracking_confidence() {
        let mut config = Config::default();
        config.detector.tracking_confidence = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_max_hands_zero() {
        let mut config = Config::default();
        config.detector.max_hands = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_command() {
        let mut config = Config::default();
        config.detector.command.clear();
        assert!(config.validate().is_err());

        config.detector.command = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_baud_zero() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_plot_size() {
        let mut config = Config::default();
        config.display.plot_rows = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.to_string_lossy().contains("gesture_relay"));
    }
}
