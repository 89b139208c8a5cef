//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `x10hub.toml` in the working directory (or the file named by
//! `X10HUB_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use x10hub_adapter_serial::SerialConfig;
use x10hub_app::EngineConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link to the TI103.
    pub serial: SerialConfig,
    /// Engine buffer sizes.
    pub engine: EngineSection,
    /// Loop timers.
    pub timers: TimersConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Files and external commands.
    pub files: FilesConfig,
}

/// Bounded buffers inside the engine.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Unverified commands kept before the oldest is dropped.
    pub queue_capacity: usize,
    /// Bytes buffered while waiting for a frame terminator.
    pub frame_capacity: usize,
    /// Longest rendered action command, in bytes.
    pub action_capacity: usize,
}

/// Event loop periods.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimersConfig {
    pub status_poll_secs: u64,
    pub read_request_secs: u64,
    pub reconnect_secs: u64,
    pub read_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Events log, appended to on every recorded device event.
    pub events: Option<PathBuf>,
    /// Commands file replayed at startup and rewritten on shutdown.
    pub commands: Option<PathBuf>,
    /// Shell used to run trigger actions (`<shell> -c <command>`).
    pub shell: String,
}

impl Config {
    /// Load configuration from `x10hub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting values are out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("X10HUB_CONFIG").unwrap_or_else(|_| "x10hub.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("X10HUB_DEVICE") {
            self.serial.device = val;
        }
        if let Ok(val) = std::env::var("X10HUB_BAUD_RATE") {
            if let Ok(baud_rate) = val.parse() {
                self.serial.baud_rate = baud_rate;
            }
        }
        if let Ok(val) = std::env::var("X10HUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.device.trim().is_empty() {
            return Err(ConfigError::Validation(
                "serial device must not be empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "baud rate must be non-zero".to_string(),
            ));
        }
        if self.engine.queue_capacity < 2 {
            return Err(ConfigError::Validation(
                "queue capacity must be at least 2".to_string(),
            ));
        }
        if self.engine.frame_capacity == 0 || self.engine.action_capacity == 0 {
            return Err(ConfigError::Validation(
                "frame and action capacities must be non-zero".to_string(),
            ));
        }
        let timers = &self.timers;
        if timers.status_poll_secs == 0
            || timers.read_request_secs == 0
            || timers.reconnect_secs == 0
            || timers.read_interval_ms == 0
        {
            return Err(ConfigError::Validation(
                "timer periods must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Engine buffer sizes in the form the engine takes them.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            queue_capacity: self.engine.queue_capacity,
            frame_capacity: self.engine.frame_capacity,
            action_capacity: self.engine.action_capacity,
        }
    }
}

impl TimersConfig {
    #[must_use]
    pub fn status_poll(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs)
    }

    #[must_use]
    pub fn read_request(&self) -> Duration {
        Duration::from_secs(self.read_request_secs)
    }

    #[must_use]
    pub fn reconnect(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }

    #[must_use]
    pub fn read_interval(&self) -> Duration {
        Duration::from_millis(self.read_interval_ms)
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            frame_capacity: defaults.frame_capacity,
            action_capacity: defaults.action_capacity,
        }
    }
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            status_poll_secs: 2,
            read_request_secs: 5,
            reconnect_secs: 10,
            read_interval_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "x10hubd=info,x10hub_app=info,x10hub_adapter_serial=info".to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            events: None,
            commands: None,
            shell: "/bin/sh".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.serial.device, "/dev/ttyS0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.engine.queue_capacity, 50);
        assert_eq!(config.timers.status_poll_secs, 2);
        assert_eq!(config.timers.read_request_secs, 5);
        assert_eq!(config.files.shell, "/bin/sh");
        assert!(config.files.events.is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [serial]
            device = '/dev/ttyUSB0'
            baud_rate = 19200
            timeout_ms = 40

            [engine]
            queue_capacity = 8
            frame_capacity = 256
            action_capacity = 128

            [timers]
            status_poll_secs = 1
            read_request_secs = 3
            reconnect_secs = 30
            read_interval_ms = 25

            [logging]
            filter = 'debug'

            [files]
            events = '/var/log/x10.events'
            commands = '/etc/x10hub/commands'
            shell = '/bin/bash'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert_eq!(config.serial.timeout_ms, 40);
        assert_eq!(config.engine.queue_capacity, 8);
        assert_eq!(config.timers.reconnect(), Duration::from_secs(30));
        assert_eq!(config.timers.read_interval(), Duration::from_millis(25));
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(
            config.files.events.as_deref(),
            Some(std::path::Path::new("/var/log/x10.events"))
        );
        assert_eq!(config.files.shell, "/bin/bash");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.serial.device, "/dev/ttyS0");
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_reject_zero_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_tiny_queue() {
        let mut config = Config::default();
        config.engine.queue_capacity = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_zero_timer() {
        let mut config = Config::default();
        config.timers.status_poll_secs = 0;
        assert!(config.validate().is_err());
    }
}
