//! MQTT input source for the button sensor nodes.
//!
//! Each node publishes `button/pressed/<id>` with its tick counter as the
//! payload whenever a button goes down.

mod client;
mod ingestor;

pub use client::{MqttClient, MqttMessage};
pub use ingestor::{ingest, parse_button_id};
