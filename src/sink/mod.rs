//! Key-value sinks receiving pressed-state writes.
//!
//! Current sinks:
//! - `firebase`: Firebase Realtime Database over its REST API
//! - `log_sink`: logs writes without sending them anywhere
//! - `memory`: records writes in memory, for tests

mod firebase;
mod log_sink;
mod memory;

pub use firebase::FirebaseSink;
pub use log_sink::LogSink;
pub use memory::{MemorySink, RecordedWrite};

use crate::error::Result;
use async_trait::async_trait;

/// Write-only boolean store addressed by slash-separated paths.
///
/// Writes overwrite whatever is stored at the path.
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn set(&self, path: &str, value: bool) -> Result<()>;
}
