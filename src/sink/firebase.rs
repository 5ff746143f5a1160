//! Firebase Realtime Database sink.
//!
//! Uses the database REST API: every write is a `PUT` of a JSON boolean to
//! `<database_url>/<path>.json`.

use super::StateSink;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FirebaseSink {
    client: reqwest::Client,
    database_url: String,
    auth_token: Option<String>,
}

impl FirebaseSink {
    /// Create a sink for the database at `database_url`
    /// (e.g. `https://my-db.firebaseio.com`).
    ///
    /// `auth_token` is sent as the `auth` query parameter when present
    /// (a database secret or an ID token).
    pub fn new(database_url: &str, auth_token: Option<String>) -> Result<Self> {
        let database_url = database_url.trim().trim_end_matches('/');
        if !database_url.starts_with("http://") && !database_url.starts_with("https://") {
            return Err(BridgeError::InvalidConfig(format!(
                "database URL must be http(s): {database_url:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            database_url: database_url.to_string(),
            auth_token,
        })
    }

    /// REST endpoint for a database path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }
}

#[async_trait]
impl StateSink for FirebaseSink {
    async fn set(&self, path: &str, value: bool) -> Result<()> {
        let url = self.endpoint(path);
        debug!("PUT {} = {}", url, value);

        let mut request = self.client.put(&url).json(&value);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::SinkRejected {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
