//! MQTT client wrapper for the button sensor network.

use crate::config::MqttConfig;
use crate::error::BridgeError;
use log::{debug, error, info};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet};
use std::time::Duration;
use tokio::sync::mpsc;

/// Message received from MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
}

/// MQTT client for the button sensor network.
pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 100);

        Self { client, event_loop }
    }

    /// Run the MQTT event loop and forward messages to the provided channel.
    ///
    /// Signals `connected` on every CONNACK, including reconnects, so the
    /// caller can (re)subscribe. Returns when the message channel closes.
    pub async fn run(mut self, tx: mpsc::Sender<MqttMessage>, connected: Option<mpsc::Sender<()>>) {
        info!("[MQTT] Starting event loop");

        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("[MQTT] Connected");
                    if let Some(connected) = &connected {
                        let _ = connected.try_send(());
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    debug!("[MQTT] Received message on {}: {}", publish.topic, payload);

                    let msg = MqttMessage {
                        topic: publish.topic,
                        payload,
                    };
                    if tx.send(msg).await.is_err() {
                        debug!("[MQTT] Message channel closed, stopping event loop");
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("[MQTT] {}", BridgeError::Connection(e.to_string()));
                    // Wait before reconnecting
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Get a clone of the async client for publishing from other tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }
}
