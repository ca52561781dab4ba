//! # Telemetry Payload Module
//!
//! Builds the device-to-cloud telemetry record.
//!
//! This module handles:
//! - Converting raw sensor readings (meters) to centimeters
//! - Enforcing the non-negativity invariant on distance readings
//! - Encoding the record as a flat JSON payload (`{"distance": <cm>}`)
//!
//! Encoding goes through `serde_json` rather than string interpolation so
//! the payload is well-formed by construction and testable without a live
//! transport.

use serde::Serialize;

use crate::error::{Result, SonarUplinkError};

/// Conversion factor from the sensor's meter readings to centimeters
pub const CM_PER_METER: f64 = 100.0;

/// One distance measurement, ready for transmission
///
/// Created fresh each loop tick from the raw sensor reading and dropped
/// after the send completes. The centimeter value is rounded to two
/// decimals, matching the reported display precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetrySample {
    distance: f64,
}

impl TelemetrySample {
    /// Build a sample from a raw sensor reading in meters
    ///
    /// # Arguments
    ///
    /// * `meters` - Raw distance reading from the rangefinder
    ///
    /// # Errors
    ///
    /// Returns `SonarUplinkError::Sensor` if the reading is negative or not
    /// a finite number. Distance cannot be negative; such a value means the
    /// sensor collaborator misread and the tick should be skipped.
    pub fn from_meters(meters: f64) -> Result<Self> {
        if !meters.is_finite() {
            return Err(SonarUplinkError::Sensor(format!(
                "non-finite distance reading: {} m",
                meters
            )));
        }

        if meters < 0.0 {
            return Err(SonarUplinkError::Sensor(format!(
                "negative distance reading: {} m",
                meters
            )));
        }

        let centimeters = (meters * CM_PER_METER * 100.0).round() / 100.0;

        Ok(Self { distance: centimeters })
    }

    /// Measured distance in centimeters
    pub fn distance_cm(&self) -> f64 {
        self.distance
    }

    /// Encode the sample as the wire payload
    ///
    /// # Returns
    ///
    /// * `Result<String>` - Flat JSON record with the single `distance` field
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
