//! # Error Types
//!
//! Custom error types for Sonar Uplink using `thiserror`.

use thiserror::Error;

/// Main error type for Sonar Uplink
#[derive(Debug, Error)]
pub enum SonarUplinkError {
    /// Rangefinder read or initialization errors
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// Cloud transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed connection credential
    #[error("Invalid connection string: {0}")]
    Credential(String),

    /// Telemetry payload encoding errors
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Sonar Uplink
pub type Result<T> = std::result::Result<T, SonarUplinkError>;
