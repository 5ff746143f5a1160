//! MQTT button bridge library.
//!
//! Receives button presses from the sensor nodes over MQTT, debounces them,
//! and mirrors the pressed state of each button into a realtime database.

pub mod bridge;
pub mod config;
pub mod debounce;
pub mod error;
pub mod input;
pub mod publish;
pub mod sink;
