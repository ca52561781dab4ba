//! # Sonar Uplink
//!
//! Stream HC-SR04 ultrasonic distance readings from a Raspberry Pi to a
//! cloud MQTT endpoint.
//!
//! This application polls an ultrasonic rangefinder once per second and
//! forwards each measurement as a telemetry message over a managed
//! device-to-cloud connection.

use anyhow::Result;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber;

mod config;
mod error;
mod sensor;
mod telemetry;
mod transport;
mod uplink;

use config::Config;
use sensor::UltrasonicSensor;
use transport::{ConnectionString, MqttTransport};
use uplink::TelemetryLoop;

/// Default configuration file path
const CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for Sonar Uplink
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (built-in defaults if no config file exists)
///    - Parse the connection string and open the cloud connection
///    - Claim the rangefinder GPIO pins
///
/// 2. **Main Loop**
///    - Read one distance sample per tick, convert to centimeters
///    - Publish the `{"distance": <cm>}` payload to the device topic
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop sampling
///    - Release the cloud connection
///    - Log total message count
///
/// # Errors
///
/// Returns error if:
/// - The configuration or connection string is invalid
/// - The GPIO pins cannot be claimed (not a Pi, missing permissions)
/// - The broker cannot be reached at startup
///
/// Failures after startup (a misread echo, a dropped link) are logged per
/// tick and do not terminate the process.
///
/// # Examples
///
/// Run the application:
/// ```bash
/// SONAR_UPLINK_CONNECTION_STRING="HostName=hub.example.com;DeviceId=rpi-01" cargo run --release
/// ```
///
/// Expected output:
/// ```text
/// INFO sonar_uplink: Sonar Uplink v0.1.0 starting...
/// INFO sonar_uplink::transport: Connected to hub.example.com:8883 as device 'rpi-01'
/// INFO sonar_uplink::sensor: HC-SR04 initialized (trigger GPIO 23, echo GPIO 24)
/// INFO sonar_uplink::uplink: Measured distance: 45.20 cm
/// INFO sonar_uplink::uplink: Sent message: {"distance":45.2}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Sonar Uplink v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(CONFIG_PATH)?;
    let credential = ConnectionString::parse(&config.connection_string()?)?;

    // Open the cloud connection before claiming hardware so a bad
    // credential fails fast
    let transport = MqttTransport::connect(&credential, &config.transport).await?;

    let sensor = UltrasonicSensor::new(
        config.sensor.trigger_pin,
        config.sensor.echo_pin,
        config.sensor.ambient_temperature,
    )?;

    info!("Press Ctrl+C to stop");

    let tick_interval = Duration::from_millis(config.uplink.interval_ms);
    let telemetry_loop = TelemetryLoop::new(sensor, transport, tick_interval);

    let sent = telemetry_loop
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C, shutting down: {}", e);
            }
        })
        .await?;

    info!("Measurement stopped by user");
    info!("Total messages sent: {}", sent);

    Ok(())
}
