//! Pressed-state publishing.
//!
//! An accepted press becomes a short-lived task that marks the button as
//! pressed in the sink, holds, and marks it as released again.

mod publisher;
mod retry;

pub use publisher::{ReleaseHook, StatePublisher};
pub use retry::RetryPolicy;

use std::fmt;

/// Phase of a press sequence a sink write belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPhase {
    Pressed,
    Released,
}

impl PressPhase {
    /// Value stored in the sink for this phase.
    pub fn value(self) -> bool {
        matches!(self, PressPhase::Pressed)
    }
}

impl fmt::Display for PressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressPhase::Pressed => write!(f, "pressed"),
            PressPhase::Released => write!(f, "released"),
        }
    }
}
