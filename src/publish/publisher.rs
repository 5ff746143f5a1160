//! State publisher: pressed write, hold, released write.
//!
//! Every accepted press runs as its own task so the ingestion path never
//! waits on the hold. Tasks are tracked so shutdown can cut holds short and
//! still leave every flag released.

use super::{PressPhase, RetryPolicy};
use crate::debounce::ButtonId;
use crate::error::BridgeError;
use crate::sink::StateSink;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Callback run after a press sequence has written its released state.
pub type ReleaseHook = Arc<dyn Fn(ButtonId) + Send + Sync>;

pub struct StatePublisher {
    sink: Arc<dyn StateSink>,
    path_prefix: String,
    hold: Duration,
    retry: RetryPolicy,
    release_hook: Option<ReleaseHook>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl StatePublisher {
    /// Create a publisher writing to `<path_prefix>/<button id>` in `sink`.
    pub fn new(sink: Arc<dyn StateSink>, path_prefix: impl Into<String>, hold: Duration) -> Self {
        Self {
            sink,
            path_prefix: path_prefix.into().trim_end_matches('/').to_string(),
            hold,
            retry: RetryPolicy::default(),
            release_hook: None,
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the retry policy for failed sink writes.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run `hook` after each sequence has written its released state.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Sink path holding the pressed flag of `button`.
    pub fn path_for(&self, button: ButtonId) -> String {
        format!("{}/{}", self.path_prefix, button)
    }

    /// Start the pressed/hold/released sequence for `button`.
    ///
    /// Returns immediately. Sequences for the same button may overlap; the
    /// sink keeps whichever write lands last.
    pub fn publish(&self, button: ButtonId) -> JoinHandle<()> {
        let sequence = PressSequence {
            sink: self.sink.clone(),
            path: self.path_for(button),
            button,
            hold: self.hold,
            retry: self.retry,
            release_hook: self.release_hook.clone(),
            cancel: self.cancel.child_token(),
        };
        self.tracker.spawn(sequence.run())
    }

    /// Number of sequences still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Cut every pending hold short and wait for all sequences to write
    /// their released state.
    pub async fn shutdown(&self) {
        let pending = self.tracker.len();
        if pending > 0 {
            info!("[Publish] Releasing {} pending press(es)", pending);
        }
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

struct PressSequence {
    sink: Arc<dyn StateSink>,
    path: String,
    button: ButtonId,
    hold: Duration,
    retry: RetryPolicy,
    release_hook: Option<ReleaseHook>,
    cancel: CancellationToken,
}

impl PressSequence {
    async fn run(self) {
        // The hold is measured from the start of the sequence, so retries of
        // the pressed write never delay the release.
        let release_at = Instant::now() + self.hold;

        self.write(PressPhase::Pressed).await;

        tokio::select! {
            _ = tokio::time::sleep_until(release_at) => {}
            _ = self.cancel.cancelled() => {
                debug!("[Publish] Hold for button {} cut short", self.button);
            }
        }

        self.write(PressPhase::Released).await;

        if let Some(hook) = &self.release_hook {
            hook(self.button);
        }
    }

    /// Write the state for `phase`, retrying per the policy. Failures are
    /// reported, never propagated.
    async fn write(&self, phase: PressPhase) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.sink.set(&self.path, phase.value()).await {
                Ok(()) => {
                    info!("[Publish] Button {} {}", self.button, phase);
                    return;
                }
                Err(e) if attempt >= self.retry.max_attempts() => {
                    let err = BridgeError::SinkWrite {
                        button: self.button,
                        phase,
                        reason: e.to_string(),
                    };
                    error!("[Publish] {} (gave up after {} attempts)", err, attempt);
                    return;
                }
                Err(e) => {
                    let delay = self.retry.time_until_next_retry(attempt - 1);
                    warn!(
                        "[Publish] Writing {} for button {} failed: {}; retrying in {:?}",
                        phase, self.button, e, delay
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.cancel.cancelled(), if phase == PressPhase::Pressed => {
                            warn!(
                                "[Publish] Shutting down, skipping {} write for button {}",
                                phase, self.button
                            );
                            return;
                        }
                    }
                }
            }
        }
    }
}
