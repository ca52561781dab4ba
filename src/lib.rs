//! # Sonar Uplink Library
//!
//! Stream HC-SR04 ultrasonic distance readings from a Raspberry Pi to a
//! cloud MQTT endpoint.
//!
//! This library provides the telemetry loop and its collaborator seams:
//! a GPIO-backed distance sampler, a structured payload encoder, and a
//! managed device-to-cloud transport.

pub mod config;
pub mod error;
pub mod sensor;
pub mod telemetry;
pub mod transport;
pub mod uplink;
