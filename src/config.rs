//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{Result, SonarUplinkError};

/// Environment variable that overrides `[transport] connection_string`
pub const CONNECTION_STRING_ENV: &str = "SONAR_UPLINK_CONNECTION_STRING";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub uplink: UplinkConfig,
}

/// Rangefinder GPIO configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_trigger_pin")]
    pub trigger_pin: u8,

    #[serde(default = "default_echo_pin")]
    pub echo_pin: u8,

    /// Ambient temperature in Celsius, used by the driver to correct the
    /// speed of sound. Omit to use the driver default.
    #[serde(default)]
    pub ambient_temperature: Option<f32>,
}

/// Cloud transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Device-to-cloud connection string. Overridden by the
    /// `SONAR_UPLINK_CONNECTION_STRING` environment variable when set.
    #[serde(default)]
    pub connection_string: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

/// Telemetry loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UplinkConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

// Default value functions
fn default_trigger_pin() -> u8 { 23 }
fn default_echo_pin() -> u8 { 24 }

fn default_connect_timeout_ms() -> u64 { 10000 }
fn default_keep_alive_secs() -> u64 { 30 }

fn default_interval_ms() -> u64 { 1000 }

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            trigger_pin: default_trigger_pin(),
            echo_pin: default_echo_pin(),
            ambient_temperature: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            transport: TransportConfig::default(),
            uplink: UplinkConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to built-in
    /// defaults when the file does not exist
    ///
    /// With defaults the connection string must come from the
    /// `SONAR_UPLINK_CONNECTION_STRING` environment variable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the device-to-cloud connection string
    ///
    /// The `SONAR_UPLINK_CONNECTION_STRING` environment variable takes
    /// precedence over the configuration file.
    ///
    /// # Errors
    ///
    /// Returns `SonarUplinkError::Credential` if neither source provides a
    /// non-empty value.
    pub fn connection_string(&self) -> Result<String> {
        let from_env = std::env::var(CONNECTION_STRING_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());

        from_env
            .or_else(|| {
                let configured = self.transport.connection_string.trim();
                (!configured.is_empty()).then(|| configured.to_string())
            })
            .ok_or_else(|| {
                SonarUplinkError::Credential(format!(
                    "no connection string configured (set {} or [transport] connection_string)",
                    CONNECTION_STRING_ENV
                ))
            })
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate GPIO assignment
        if self.sensor.trigger_pin == self.sensor.echo_pin {
            return Err(SonarUplinkError::Config(
                toml::de::Error::custom("trigger_pin and echo_pin must be different GPIO pins")
            ));
        }

        // HC-SR04 rated operating range
        if let Some(temperature) = self.sensor.ambient_temperature {
            if !(-40.0..=85.0).contains(&temperature) {
                return Err(SonarUplinkError::Config(
                    toml::de::Error::custom("ambient_temperature must be between -40 and 85")
                ));
            }
        }

        // Validate timing fields
        if self.uplink.interval_ms == 0 || self.uplink.interval_ms > 60000 {
            return Err(SonarUplinkError::Config(
                toml::de::Error::custom("interval_ms must be between 1 and 60000")
            ));
        }

        if self.transport.connect_timeout_ms == 0 || self.transport.connect_timeout_ms > 60000 {
            return Err(SonarUplinkError::Config(
                toml::de::Error::custom("connect_timeout_ms must be between 1 and 60000")
            ));
        }

        if self.transport.keep_alive_secs == 0 || self.transport.keep_alive_secs > 300 {
            return Err(SonarUplinkError::Config(
                toml::de::Error::custom("keep_alive_secs must be between 1 and 300")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            sensor: SensorConfig {
                trigger_pin: default_trigger_pin(),
                echo_pin: default_echo_pin(),
                ambient_temperature: None,
            },
            transport: TransportConfig {
                connection_string: "HostName=broker.example.com;DeviceId=pi-01".to_string(),
                connect_timeout_ms: default_connect_timeout_ms(),
                keep_alive_secs: default_keep_alive_secs(),
            },
            uplink: UplinkConfig {
                interval_ms: default_interval_ms(),
            },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_pins_match_wiring() {
        let config = Config::default();
        assert_eq!(config.sensor.trigger_pin, 23, "Trigger should default to GPIO 23");
        assert_eq!(config.sensor.echo_pin, 24, "Echo should default to GPIO 24");
    }

    #[test]
    fn test_default_interval_is_one_second() {
        let config = Config::default();
        assert_eq!(config.uplink.interval_ms, 1000);
    }

    #[test]
    fn test_same_trigger_and_echo_pin() {
        let mut config = create_valid_config();
        config.sensor.echo_pin = config.sensor.trigger_pin;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_ms_zero() {
        let mut config = create_valid_config();
        config.uplink.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_ms_too_high() {
        let mut config = create_valid_config();
        config.uplink.interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connect_timeout_ms_zero() {
        let mut config = create_valid_config();
        config.transport.connect_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_keep_alive_secs_out_of_range() {
        let mut config = create_valid_config();
        config.transport.keep_alive_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ambient_temperature_out_of_range() {
        let mut config = create_valid_config();
        config.sensor.ambient_temperature = Some(120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[sensor]
trigger_pin = 17
echo_pin = 27

[transport]
connection_string = "HostName=broker.example.com;DeviceId=pi-01"

[uplink]
interval_ms = 2000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.sensor.trigger_pin, 17);
        assert_eq!(config.sensor.echo_pin, 27);
        assert_eq!(config.uplink.interval_ms, 2000);
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[uplink]\ninterval_ms = 500\n").unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.uplink.interval_ms, 500);
        assert_eq!(config.sensor.trigger_pin, default_trigger_pin());
        assert_eq!(config.transport.keep_alive_secs, default_keep_alive_secs());
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let config = Config::load_or_default("/nonexistent/sonar-uplink.toml").unwrap();
        assert_eq!(config.uplink.interval_ms, default_interval_ms());
    }

    #[test]
    fn test_connection_string_from_config() {
        let config = create_valid_config();
        let connection_string = config.connection_string().unwrap();
        assert_eq!(connection_string, "HostName=broker.example.com;DeviceId=pi-01");
    }

    #[test]
    fn test_connection_string_missing_everywhere() {
        let config = Config::default();
        // Default config has no connection string; the environment variable
        // is not set under `cargo test`.
        if std::env::var(CONNECTION_STRING_ENV).is_err() {
            assert!(config.connection_string().is_err());
        }
    }
}
