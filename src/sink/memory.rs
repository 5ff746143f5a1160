//! In-memory sink that records every write attempt.

use super::StateSink;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

/// One write attempt seen by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub path: String,
    pub value: bool,
    pub at: Instant,
    pub succeeded: bool,
}

/// Records writes instead of sending them. Can be told to fail writes of
/// one value to simulate an unreachable database.
#[derive(Default)]
pub struct MemorySink {
    writes: Mutex<Vec<RecordedWrite>>,
    fail_value: Mutex<Option<bool>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of `value` fail.
    pub fn failing_writes_of(self, value: bool) -> Self {
        *self.fail_value.lock() = Some(value);
        self
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().clone()
    }

    /// Value of the last successful write to `path`.
    pub fn value(&self, path: &str) -> Option<bool> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|w| w.succeeded && w.path == path)
            .map(|w| w.value)
    }
}

#[async_trait]
impl StateSink for MemorySink {
    async fn set(&self, path: &str, value: bool) -> Result<()> {
        let succeeded = *self.fail_value.lock() != Some(value);
        self.writes.lock().push(RecordedWrite {
            path: path.to_string(),
            value,
            at: Instant::now(),
            succeeded,
        });

        if succeeded {
            Ok(())
        } else {
            Err(BridgeError::SinkRejected {
                path: path.to_string(),
                status: 503,
                body: "simulated failure".to_string(),
            })
        }
    }
}
