//! Input sources for the bridge.
//!
//! Current input sources:
//! - `mqtt`: button presses published by the sensor nodes

pub mod mqtt;
