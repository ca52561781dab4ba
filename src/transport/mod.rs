//! # Transport Module
//!
//! Handles the managed device-to-cloud MQTT connection.
//!
//! This module handles:
//! - Building the MQTT session from the parsed connection string
//! - Confirming the broker handshake before the telemetry loop starts
//! - Publishing one telemetry payload per tick to the device topic
//! - Releasing the connection on shutdown
//!
//! Protocol framing, keep-alive and reconnection are delegated to
//! `rumqttc`; its event loop runs in a background task owned by the
//! transport handle.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::error::{Result, SonarUplinkError};

pub mod client_trait;
pub mod connection_string;

pub use client_trait::TelemetryTransport;
pub use connection_string::ConnectionString;

/// Capacity of the rumqttc request channel
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Pause before the event loop retries after a connection error
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

/// Cloud MQTT connection handle
///
/// Created once at startup, used by every loop tick, released exactly once
/// on exit.
pub struct MqttTransport {
    client: AsyncClient,
    topic: String,
    event_loop_task: JoinHandle<()>,
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl MqttTransport {
    /// Open the device-to-cloud connection
    ///
    /// Blocks until the broker acknowledges the session or the connect
    /// timeout elapses, so an invalid credential or unreachable endpoint
    /// fails startup instead of surfacing on the first tick.
    ///
    /// # Arguments
    ///
    /// * `credential` - Parsed connection string
    /// * `config` - Transport timing configuration
    ///
    /// # Errors
    ///
    /// Returns `SonarUplinkError::Transport` if the broker rejects the
    /// session or cannot be reached within `connect_timeout_ms`.
    pub async fn connect(credential: &ConnectionString, config: &TransportConfig) -> Result<Self> {
        let mut options = MqttOptions::new(
            credential.device_id.clone(),
            credential.host.clone(),
            credential.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if let Some(username) = &credential.username {
            options.set_credentials(
                username.clone(),
                credential.password.clone().unwrap_or_default(),
            );
        }

        if credential.use_tls {
            options.set_transport(rumqttc::Transport::tls_with_default_config());
        }

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        // Drive the handshake to completion before handing the connection out
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
        timeout(connect_timeout, async {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => break Ok(()),
                    Ok(event) => debug!("MQTT event during connect: {:?}", event),
                    Err(e) => {
                        break Err(SonarUplinkError::Transport(format!(
                            "Failed to connect to {}:{}: {}",
                            credential.host, credential.port, e
                        )))
                    }
                }
            }
        })
        .await
        .map_err(|_| {
            SonarUplinkError::Transport(format!(
                "Connection to {}:{} timed out after {} ms",
                credential.host, credential.port, config.connect_timeout_ms
            ))
        })??;

        info!(
            "Connected to {}:{} as device '{}'",
            credential.host, credential.port, credential.device_id
        );

        // rumqttc makes progress only while its event loop is polled; it
        // also performs reconnection there, so a dropped link heals without
        // the telemetry loop noticing beyond failed publishes
        let event_loop_task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(event) => debug!("MQTT event: {:?}", event),
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(RECONNECT_PAUSE).await;
                    }
                }
            }
        });

        Ok(Self {
            client,
            topic: credential.topic.clone(),
            event_loop_task,
        })
    }

    /// Topic telemetry is published to
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl TelemetryTransport for MqttTransport {
    async fn send(&mut self, payload: &str) -> Result<()> {
        self.client
            .publish(self.topic.clone(), QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| SonarUplinkError::Transport(format!("Failed to publish telemetry: {}", e)))?;

        debug!("Published telemetry payload ({} bytes)", payload.len());
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        let disconnect_result = self.client.disconnect().await;

        // The event loop must not outlive the session it was pumping
        self.event_loop_task.abort();

        disconnect_result
            .map_err(|e| SonarUplinkError::Transport(format!("Failed to disconnect: {}", e)))?;

        info!("Cloud connection released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;

    fn fast_timeout_config() -> TransportConfig {
        TransportConfig {
            connection_string: String::new(),
            connect_timeout_ms: 500,
            keep_alive_secs: 30,
        }
    }

    #[test]
    fn test_request_channel_capacity() {
        // One in-flight publish per second needs very little headroom
        assert_eq!(REQUEST_CHANNEL_CAPACITY, 10);
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_endpoint_fails() {
        // Port 1 is reserved and nothing listens on it
        let credential =
            ConnectionString::parse("HostName=127.0.0.1;DeviceId=test-device;Port=1;Tls=false")
                .unwrap();

        let result = MqttTransport::connect(&credential, &fast_timeout_config()).await;

        assert!(result.is_err());
        match result.unwrap_err() {
            SonarUplinkError::Transport(msg) => {
                assert!(msg.contains("127.0.0.1"), "message was: {}", msg);
            }
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    // Integration test - only runs with a local MQTT broker listening on
    // the default plaintext port. Skipped in CI/CD environments.
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_connect_and_publish_with_real_broker() {
        let credential =
            ConnectionString::parse("HostName=localhost;DeviceId=test-device;Port=1883;Tls=false")
                .unwrap();

        let result = MqttTransport::connect(&credential, &fast_timeout_config()).await;

        if let Ok(mut transport) = result {
            assert_eq!(transport.topic(), "devices/test-device/messages/events");

            let send_result = transport.send(r#"{"distance":45.2}"#).await;
            assert!(send_result.is_ok(), "Failed to publish: {:?}", send_result);

            let shutdown_result = transport.shutdown().await;
            assert!(shutdown_result.is_ok(), "Failed to disconnect: {:?}", shutdown_result);
        } else {
            println!("No local broker detected (this is OK for CI/CD)");
        }
    }
}
