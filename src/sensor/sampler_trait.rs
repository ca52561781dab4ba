//! Trait abstraction for distance sampling to enable testing

use crate::error::Result;

#[cfg(test)]
use mockall::automock;

/// Trait for polling a rangefinder for one distance reading
///
/// Implementations must return the measured distance in meters. Any other
/// native unit has to be converted behind this seam; the telemetry loop owns
/// the meters-to-centimeters conversion and assumes nothing else.
#[cfg_attr(test, automock)]
pub trait DistanceSampler: Send {
    /// Poll the sensor once, blocking until the echo is measured
    fn sample_distance(&mut self) -> Result<f64>;
}
