//! # Sensor Module
//!
//! Handles distance acquisition from the HC-SR04 ultrasonic rangefinder.
//!
//! This module handles:
//! - Initializing the GPIO-backed driver (one trigger pin, one echo pin)
//! - Polling one distance reading per loop tick
//! - Mapping driver faults and out-of-range echoes to sensor errors
//!
//! The trigger/echo pulse timing itself lives in the `hc-sr04` driver crate;
//! this module only adapts it to the [`DistanceSampler`] seam.

use hc_sr04::{HcSr04, Unit};
use tracing::{debug, info};

use crate::error::{Result, SonarUplinkError};

pub mod sampler_trait;

pub use sampler_trait::DistanceSampler;

/// HC-SR04 rangefinder attached to two GPIO pins
///
/// Construction claims the pins and is a fatal startup step; a process that
/// cannot reach its sensor has nothing to report.
pub struct UltrasonicSensor {
    driver: HcSr04,
    trigger_pin: u8,
    echo_pin: u8,
}

impl std::fmt::Debug for UltrasonicSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UltrasonicSensor")
            .field("trigger_pin", &self.trigger_pin)
            .field("echo_pin", &self.echo_pin)
            .finish_non_exhaustive()
    }
}

impl UltrasonicSensor {
    /// Initialize the rangefinder on the given BCM GPIO pins
    ///
    /// # Arguments
    ///
    /// * `trigger_pin` - BCM number of the trigger pin
    /// * `echo_pin` - BCM number of the echo pin
    /// * `ambient_temperature` - Optional ambient temperature in Celsius for
    ///   the driver's speed-of-sound correction
    ///
    /// # Errors
    ///
    /// Returns `SonarUplinkError::Sensor` if the GPIO pins cannot be claimed
    /// (missing permissions, pins already in use, not running on a Pi).
    pub fn new(trigger_pin: u8, echo_pin: u8, ambient_temperature: Option<f32>) -> Result<Self> {
        let driver = HcSr04::new(trigger_pin, echo_pin, ambient_temperature).map_err(|e| {
            SonarUplinkError::Sensor(format!(
                "Failed to initialize HC-SR04 (trigger GPIO {}, echo GPIO {}): {}",
                trigger_pin, echo_pin, e
            ))
        })?;

        info!(
            "HC-SR04 initialized (trigger GPIO {}, echo GPIO {})",
            trigger_pin, echo_pin
        );

        Ok(Self {
            driver,
            trigger_pin,
            echo_pin,
        })
    }

    /// BCM number of the trigger pin
    pub fn trigger_pin(&self) -> u8 {
        self.trigger_pin
    }

    /// BCM number of the echo pin
    pub fn echo_pin(&self) -> u8 {
        self.echo_pin
    }
}

impl DistanceSampler for UltrasonicSensor {
    fn sample_distance(&mut self) -> Result<f64> {
        let reading = self
            .driver
            .measure_distance(Unit::Meters)
            .map_err(|e| SonarUplinkError::Sensor(format!("Failed to read HC-SR04: {}", e)))?;

        match reading {
            Some(meters) => {
                debug!("Raw sensor reading: {} m", meters);
                Ok(f64::from(meters))
            }
            // The driver reports None when no echo returns within the
            // sensor's ~4m envelope
            None => Err(SonarUplinkError::Sensor(
                "no echo received (object out of range)".to_string(),
            )),
        }
    }
}
