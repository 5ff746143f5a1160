use crate::debounce::ButtonId;
use crate::publish::PressPhase;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Malformed button topic {topic:?}: {reason}")]
    Parse { topic: String, reason: String },

    #[error("Failed to write {phase} state for button {button}: {reason}")]
    SinkWrite {
        button: ButtonId,
        phase: PressPhase,
        reason: String,
    },

    #[error("Database rejected write to {path} with status {status}: {body}")]
    SinkRejected {
        path: String,
        status: u16,
        body: String,
    },

    #[error("MQTT connection error: {0}")]
    Connection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
