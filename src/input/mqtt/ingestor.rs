//! Turns raw MQTT messages into button events.

use crate::debounce::{ButtonEvent, ButtonId};
use crate::error::{BridgeError, Result};
use std::time::Instant;

/// Extract the button id from the last segment of `topic`
/// (`button/pressed/3` → `3`).
pub fn parse_button_id(topic: &str) -> Result<ButtonId> {
    let segment = topic.rsplit('/').next().unwrap_or_default();

    segment.parse().map_err(|e| BridgeError::Parse {
        topic: topic.to_string(),
        reason: format!("button id {segment:?}: {e}"),
    })
}

/// Build the event for a message received at `now`.
pub fn ingest(topic: &str, payload: &str, now: Instant) -> Result<ButtonEvent> {
    let id = parse_button_id(topic)?;
    Ok(ButtonEvent::new(id, now).with_payload(payload.trim()))
}
