use super::StateSink;
use crate::error::Result;
use async_trait::async_trait;
use log::info;

/// Sink that only logs writes. Used when no database is configured.
pub struct LogSink;

#[async_trait]
impl StateSink for LogSink {
    async fn set(&self, path: &str, value: bool) -> Result<()> {
        info!("[Sink] {} = {}", path, value);
        Ok(())
    }
}
