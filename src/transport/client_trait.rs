//! Trait abstraction for the cloud transport to enable testing

use async_trait::async_trait;

use crate::error::Result;

/// Trait for the device-to-cloud telemetry transport
///
/// One implementation wraps the live MQTT client; tests substitute a
/// recording fake. The handle is owned by the telemetry loop, which calls
/// `shutdown` exactly once on its way out.
#[async_trait]
pub trait TelemetryTransport: Send {
    /// Send one telemetry payload, waiting for the hand-off to complete
    async fn send(&mut self, payload: &str) -> Result<()>;

    /// Release the connection
    async fn shutdown(&mut self) -> Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::SonarUplinkError;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    /// Mock transport for testing
    #[derive(Clone)]
    pub struct MockTransport {
        pub sent_payloads: Arc<Mutex<Vec<String>>>,
        pub sent_instants: Arc<Mutex<Vec<Instant>>>,
        pub send_failures_remaining: Arc<Mutex<u32>>,
        pub shutdown_error: Arc<Mutex<Option<String>>>,
        pub shutdown_calls: Arc<Mutex<u32>>,
        pub sends_after_shutdown: Arc<Mutex<u32>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                sent_payloads: Arc::new(Mutex::new(Vec::new())),
                sent_instants: Arc::new(Mutex::new(Vec::new())),
                send_failures_remaining: Arc::new(Mutex::new(0)),
                shutdown_error: Arc::new(Mutex::new(None)),
                shutdown_calls: Arc::new(Mutex::new(0)),
                sends_after_shutdown: Arc::new(Mutex::new(0)),
            }
        }

        pub fn get_sent_payloads(&self) -> Vec<String> {
            self.sent_payloads.lock().unwrap().clone()
        }

        pub fn get_sent_instants(&self) -> Vec<Instant> {
            self.sent_instants.lock().unwrap().clone()
        }

        /// Make the next `count` send calls fail
        pub fn set_send_failures(&self, count: u32) {
            *self.send_failures_remaining.lock().unwrap() = count;
        }

        pub fn set_shutdown_error(&self, message: &str) {
            *self.shutdown_error.lock().unwrap() = Some(message.to_string());
        }

        pub fn shutdown_count(&self) -> u32 {
            *self.shutdown_calls.lock().unwrap()
        }

        pub fn sends_after_shutdown(&self) -> u32 {
            *self.sends_after_shutdown.lock().unwrap()
        }
    }

    #[async_trait]
    impl TelemetryTransport for MockTransport {
        async fn send(&mut self, payload: &str) -> Result<()> {
            if *self.shutdown_calls.lock().unwrap() > 0 {
                *self.sends_after_shutdown.lock().unwrap() += 1;
                return Err(SonarUplinkError::Transport(
                    "Mock send after shutdown".to_string(),
                ));
            }

            {
                let mut failures = self.send_failures_remaining.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(SonarUplinkError::Transport("Mock send error".to_string()));
                }
            }

            self.sent_payloads.lock().unwrap().push(payload.to_string());
            self.sent_instants.lock().unwrap().push(Instant::now());
            Ok(())
        }

        async fn shutdown(&mut self) -> Result<()> {
            *self.shutdown_calls.lock().unwrap() += 1;

            if let Some(message) = self.shutdown_error.lock().unwrap().clone() {
                return Err(SonarUplinkError::Transport(message));
            }
            Ok(())
        }
    }
}
