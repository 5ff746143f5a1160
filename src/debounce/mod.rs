//! Press debouncing.
//!
//! A single physical press on the sensor nodes can arrive as several MQTT
//! messages in quick succession. The [`Debouncer`] decides which of them
//! count as real presses.

mod debouncer;

pub use debouncer::{DebounceState, Debouncer};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Identifier of a physical button (trailing segment of its MQTT topic).
pub type ButtonId = u32;

/// A press reported by a sensor node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub id: ButtonId,
    pub timestamp: Instant,
    /// Raw payload text. The firmware sends its tick counter here.
    pub payload: String,
}

impl ButtonEvent {
    pub fn new(id: ButtonId, timestamp: Instant) -> Self {
        Self {
            id,
            timestamp,
            payload: String::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Which presses share a cooldown window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebounceScope {
    /// One window for all buttons: a press on any button blocks every
    /// button until the cooldown elapses.
    #[default]
    Global,
    /// Each button has its own window.
    PerButton,
}

impl DebounceScope {
    /// Key of the cooldown window an event for `id` falls into.
    pub(crate) fn window(self, id: ButtonId) -> Option<ButtonId> {
        match self {
            DebounceScope::Global => None,
            DebounceScope::PerButton => Some(id),
        }
    }
}

impl FromStr for DebounceScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(DebounceScope::Global),
            "per-button" | "per_button" | "button" => Ok(DebounceScope::PerButton),
            other => Err(format!("unknown debounce scope: {other}")),
        }
    }
}

impl fmt::Display for DebounceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceScope::Global => write!(f, "global"),
            DebounceScope::PerButton => write!(f, "per-button"),
        }
    }
}
