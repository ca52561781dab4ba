//! # Telemetry Loop Module
//!
//! Drives the sample-and-send cycle against the sensor and transport
//! collaborators.
//!
//! This module handles:
//! - One sensor read, payload build and send per tick
//! - Per-tick error containment (a bad read or a failed send skips the
//!   tick, it never stops the loop)
//! - Graceful shutdown on an external signal, releasing the transport on
//!   every exit path
//!
//! The loop owns both collaborator handles for its whole lifetime; nothing
//! else touches the connection, so no locking is involved.

use std::future::Future;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::Result;
use crate::sensor::DistanceSampler;
use crate::telemetry::TelemetrySample;
use crate::transport::TelemetryTransport;

/// Periodic sense-format-send loop
///
/// States: running until the shutdown future resolves, then releasing the
/// transport, then stopped. There is no pause state and no way to cancel a
/// single tick.
pub struct TelemetryLoop<S, T> {
    sampler: S,
    transport: T,
    tick_interval: Duration,
    sent_count: u64,
}

impl<S, T> TelemetryLoop<S, T>
where
    S: DistanceSampler,
    T: TelemetryTransport,
{
    /// Build a loop over the given collaborators
    ///
    /// # Arguments
    ///
    /// * `sampler` - Distance sensor, polled once per tick
    /// * `transport` - Open cloud connection, released when the loop exits
    /// * `tick_interval` - Time between consecutive ticks
    pub fn new(sampler: S, transport: T, tick_interval: Duration) -> Self {
        Self {
            sampler,
            transport,
            tick_interval,
            sent_count: 0,
        }
    }

    /// Run until the shutdown future resolves
    ///
    /// The first tick fires immediately; subsequent ticks are spaced at
    /// least `tick_interval` apart. On shutdown the transport is released
    /// exactly once and no further sends are attempted.
    ///
    /// # Returns
    ///
    /// * `Result<u64>` - Number of successfully sent messages
    ///
    /// # Errors
    ///
    /// Returns error only if releasing the transport fails; tick-level
    /// failures are logged and absorbed.
    pub async fn run<F>(mut self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.tick_interval);
        // A slow tick must delay the next one, not trigger a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Starting telemetry loop ({} ms per tick)",
            self.tick_interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }

                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping telemetry loop");
                    break;
                }
            }
        }

        let sent_count = self.sent_count;
        self.transport.shutdown().await?;

        Ok(sent_count)
    }

    /// Execute one sense-format-send cycle
    async fn tick(&mut self) {
        let meters = match self.sampler.sample_distance() {
            Ok(meters) => meters,
            Err(e) => {
                warn!("Skipping tick, sensor read failed: {}", e);
                return;
            }
        };

        let sample = match TelemetrySample::from_meters(meters) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Skipping tick, discarding reading: {}", e);
                return;
            }
        };

        info!("Measured distance: {:.2} cm", sample.distance_cm());

        let payload = match sample.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping tick, payload encoding failed: {}", e);
                return;
            }
        };

        match self.transport.send(&payload).await {
            Ok(()) => {
                self.sent_count += 1;
                info!("Sent message: {}", payload);
            }
            Err(e) => {
                // The next tick carries fresh data anyway
                warn!("Failed to send telemetry: {}", e);
            }
        }
    }
}
