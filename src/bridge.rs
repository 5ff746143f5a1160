//! Bridge orchestrator: MQTT presses in, database pressed flags out.
//!
//! Keeps MQTT internals out of main.rs. Messages are parsed, debounced and
//! handed to the publisher, which runs each accepted press on its own task.

use crate::config::{Config, MqttConfig};
use crate::debounce::{ButtonId, Debouncer};
use crate::input::mqtt::{self, MqttClient, MqttMessage};
use crate::publish::StatePublisher;
use crate::sink::StateSink;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct ButtonBridge {
    mqtt: MqttConfig,
    debouncer: Arc<Debouncer>,
    publisher: Arc<StatePublisher>,
}

impl ButtonBridge {
    /// Create a bridge writing pressed flags to `sink`.
    pub fn new(config: &Config, sink: Arc<dyn StateSink>) -> Self {
        let debouncer = Arc::new(Debouncer::new(
            config.debounce.cooldown,
            config.debounce.scope,
        ));

        let release_debouncer = debouncer.clone();
        let publisher = StatePublisher::new(
            sink,
            config.database.path_prefix.clone(),
            config.debounce.hold,
        )
        .with_retry_policy(config.debounce.retry_policy())
        .with_release_hook(Arc::new(move |id: ButtonId| release_debouncer.release(id)));

        Self {
            mqtt: config.mqtt.clone(),
            debouncer,
            publisher: Arc::new(publisher),
        }
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn publisher(&self) -> &StatePublisher {
        &self.publisher
    }

    /// Route one MQTT message.
    ///
    /// Returns the button id when the message was accepted as a press.
    /// Malformed topics are reported and dropped. Must be called from
    /// within a tokio runtime.
    pub fn handle_message(&self, topic: &str, payload: &str) -> Option<ButtonId> {
        let now = Instant::now();
        let event = match mqtt::ingest(topic, payload, now) {
            Ok(event) => event,
            Err(e) => {
                warn!("[MQTT] Dropping message: {}", e);
                return None;
            }
        };

        debug!(
            "[MQTT] Button {} reported (payload {:?})",
            event.id, event.payload
        );

        if !self.debouncer.accept(&event, now) {
            return None;
        }

        let _sequence = self.publisher.publish(event.id);
        Some(event.id)
    }

    /// Start the bridge.
    ///
    /// Spawns a background task that connects to the broker, subscribes to
    /// the button topic, and routes messages until shut down.
    pub fn start(self) -> BridgeHandle {
        let stop = CancellationToken::new();
        let publisher = self.publisher.clone();
        let task = tokio::spawn(self.run(stop.clone()));

        BridgeHandle {
            task,
            publisher,
            stop,
        }
    }

    async fn run(self, stop: CancellationToken) {
        info!(
            "[MQTT] Connecting to {}:{}",
            self.mqtt.broker_host, self.mqtt.broker_port
        );

        let mqtt_client = MqttClient::new(&self.mqtt);
        let subscribe_client = mqtt_client.client();

        let (msg_tx, mut msg_rx) = mpsc::channel::<MqttMessage>(64);
        let (connected_tx, mut connected_rx) = mpsc::channel::<()>(1);

        let mqtt_loop = tokio::spawn(mqtt_client.run(msg_tx, Some(connected_tx)));

        let connect_timeout = tokio::time::sleep(Duration::from_secs(10));
        tokio::pin!(connect_timeout);
        let mut awaiting_connection = true;

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    info!("[MQTT] Stopping bridge");
                    break;
                }
                Some(()) = connected_rx.recv() => {
                    awaiting_connection = false;
                    // Sessions are clean, so every reconnect needs a fresh subscription
                    if let Err(e) = subscribe_client
                        .subscribe(&self.mqtt.topic, rumqttc::QoS::AtMostOnce)
                        .await
                    {
                        warn!("[MQTT] Failed to subscribe to {}: {:?}", self.mqtt.topic, e);
                    } else {
                        info!("[MQTT] Subscribed to {}", self.mqtt.topic);
                    }
                }
                msg = msg_rx.recv() => {
                    match msg {
                        Some(msg) => {
                            self.handle_message(&msg.topic, &msg.payload);
                        }
                        None => {
                            warn!("[MQTT] Event loop ended");
                            break;
                        }
                    }
                }
                _ = &mut connect_timeout, if awaiting_connection => {
                    warn!("[MQTT] Not connected after 10 seconds, still retrying");
                    awaiting_connection = false;
                }
            }
        }

        mqtt_loop.abort();
    }
}

/// Handle to a running bridge.
pub struct BridgeHandle {
    task: JoinHandle<()>,
    publisher: Arc<StatePublisher>,
    stop: CancellationToken,
}

impl BridgeHandle {
    /// Stop ingesting, then release every pending press.
    pub async fn shutdown(self) {
        self.stop.cancel();
        if let Err(e) = self.task.await {
            warn!("Bridge task ended abnormally: {}", e);
        }
        self.publisher.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DebounceScope;
    use crate::sink::MemorySink;

    fn bridge(scope: DebounceScope) -> (ButtonBridge, Arc<MemorySink>) {
        let mut config = Config::default();
        config.debounce.scope = scope;
        let sink = Arc::new(MemorySink::new());
        (ButtonBridge::new(&config, sink.clone()), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_press_is_published() {
        let (bridge, sink) = bridge(DebounceScope::Global);

        assert_eq!(bridge.handle_message("button/pressed/0", "1234"), Some(0));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(sink.value("rooside_soda/button/pressed/0"), Some(true));
        assert_eq!(bridge.debouncer().currently_pressed(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounces_are_dropped() {
        let (bridge, sink) = bridge(DebounceScope::Global);

        assert_eq!(bridge.handle_message("button/pressed/0", "1"), Some(0));
        assert_eq!(bridge.handle_message("button/pressed/0", "2"), None);
        assert_eq!(bridge.handle_message("button/pressed/1", "3"), None);
        bridge.publisher().shutdown().await;

        let writes = sink.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|w| w.path == "rooside_soda/button/pressed/0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_button_scope_publishes_both_buttons() {
        let (bridge, sink) = bridge(DebounceScope::PerButton);

        assert_eq!(bridge.handle_message("button/pressed/0", ""), Some(0));
        assert_eq!(bridge.handle_message("button/pressed/1", ""), Some(1));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(sink.value("rooside_soda/button/pressed/0"), Some(true));
        assert_eq!(sink.value("rooside_soda/button/pressed/1"), Some(true));
    }

    #[tokio::test]
    async fn test_malformed_topic_is_dropped() {
        let (bridge, sink) = bridge(DebounceScope::Global);

        assert_eq!(bridge.handle_message("button/pressed/abc", "1"), None);
        assert_eq!(bridge.debouncer().currently_pressed(), None);
        assert_eq!(bridge.publisher().in_flight(), 0);
        assert!(sink.writes().is_empty());

        // The malformed message did not start a cooldown window
        assert_eq!(bridge.handle_message("button/pressed/1", "2"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_clears_currently_pressed() {
        let (bridge, sink) = bridge(DebounceScope::Global);

        assert_eq!(bridge.handle_message("button/pressed/2", ""), Some(2));
        tokio::time::sleep(Duration::from_secs(16)).await;

        assert_eq!(sink.value("rooside_soda/button/pressed/2"), Some(false));
        assert_eq!(bridge.debouncer().currently_pressed(), None);
    }
}
