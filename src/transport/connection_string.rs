//! # Connection String Parsing
//!
//! Parses the device-to-cloud credential string into endpoint settings.
//!
//! The credential is a single opaque string handed to the process at
//! startup, in semicolon-separated `Key=Value` form:
//!
//! ```text
//! HostName=hub.example.com;DeviceId=rpi-backyard;Password=s3cret
//! ```
//!
//! Recognized keys:
//! - `HostName` (required) - broker hostname
//! - `DeviceId` (required) - device identity, also used as the MQTT client id
//! - `Port` - broker port, defaults to 8883
//! - `Username` / `Password` - passed through to the broker unchanged
//! - `Topic` - publish topic, defaults to `devices/<DeviceId>/messages/events`
//! - `Tls` - `true`/`false`, defaults to `true` on port 8883 only

use crate::error::{Result, SonarUplinkError};

/// Default MQTT-over-TLS port
pub const DEFAULT_MQTT_PORT: u16 = 8883;

/// Parsed device-to-cloud credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub host: String,
    pub port: u16,
    pub device_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
    pub use_tls: bool,
}

impl ConnectionString {
    /// Parse a `Key=Value;...` credential string
    ///
    /// # Arguments
    ///
    /// * `raw` - The credential string as configured
    ///
    /// # Errors
    ///
    /// Returns `SonarUplinkError::Credential` if the string is empty, a
    /// segment is not `Key=Value`, a key is unknown or repeated, a required
    /// key is missing, or the port is not a valid TCP port.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(SonarUplinkError::Credential(
                "connection string is empty".to_string(),
            ));
        }

        let mut host = None;
        let mut port = None;
        let mut device_id = None;
        let mut username = None;
        let mut password = None;
        let mut topic = None;
        let mut tls = None;

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = segment.split_once('=').ok_or_else(|| {
                SonarUplinkError::Credential(format!("segment '{}' is not Key=Value", segment))
            })?;

            let slot = match key {
                "HostName" => &mut host,
                "Port" => &mut port,
                "DeviceId" => &mut device_id,
                "Username" => &mut username,
                "Password" => &mut password,
                "Topic" => &mut topic,
                "Tls" => &mut tls,
                unknown => {
                    return Err(SonarUplinkError::Credential(format!(
                        "unknown key '{}'",
                        unknown
                    )));
                }
            };

            if slot.is_some() {
                return Err(SonarUplinkError::Credential(format!(
                    "key '{}' given more than once",
                    key
                )));
            }
            *slot = Some(value.to_string());
        }

        let host = host
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SonarUplinkError::Credential("HostName is required".to_string()))?;

        let device_id = device_id
            .filter(|value| !value.is_empty())
            .ok_or_else(|| SonarUplinkError::Credential("DeviceId is required".to_string()))?;

        let port = match port {
            Some(value) => value.parse::<u16>().ok().filter(|&p| p != 0).ok_or_else(|| {
                SonarUplinkError::Credential(format!("Port '{}' is not a valid TCP port", value))
            })?,
            None => DEFAULT_MQTT_PORT,
        };

        let use_tls = match tls.as_deref() {
            Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(SonarUplinkError::Credential(format!(
                    "Tls must be 'true' or 'false', got '{}'",
                    other
                )));
            }
            None => port == DEFAULT_MQTT_PORT,
        };

        let topic = topic
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("devices/{}/messages/events", device_id));

        Ok(Self {
            host,
            port,
            device_id,
            username,
            password,
            topic,
            use_tls,
        })
    }
}
