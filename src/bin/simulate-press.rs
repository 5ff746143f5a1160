//! Publishes simulated button presses to the broker.
//!
//! Usage:
//!   cargo run --bin simulate-press -- 0
//!   cargo run --bin simulate-press -- 1 --count 5 --interval-ms 50
//!
//! Sends the same messages as a sensor node: `button/pressed/<id>` with a
//! tick counter as the payload. Several presses in quick succession mimic a
//! bouncing switch and should be collapsed by the bridge.

use button_bridge::config::{self, Config};
use button_bridge::input::mqtt::MqttClient;
use clap::Parser;
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "simulate-press")]
#[command(about = "Publish simulated button presses to the MQTT broker")]
struct Cli {
    /// Button id to press
    button: u32,

    /// Number of presses to send
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Delay between presses in milliseconds
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,

    /// Topic prefix the button id is appended to
    #[arg(long, env = "MQTT_PRESS_TOPIC_PREFIX", default_value = "button/pressed")]
    prefix: String,
}

#[tokio::main]
async fn main() {
    config::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    config.mqtt.client_id = format!("{}-simulator", config.mqtt.client_id);

    info!(
        "Connecting to MQTT broker at {}:{}",
        config.mqtt.broker_host, config.mqtt.broker_port
    );

    let mqtt_client = MqttClient::new(&config.mqtt);
    let async_client = mqtt_client.client();

    // The event loop has to be polled for publishes to leave the client
    let (msg_tx, _msg_rx) = mpsc::channel(1);
    let mqtt_handle = tokio::spawn(mqtt_client.run(msg_tx, None));

    let topic = format!("{}/{}", cli.prefix.trim_end_matches('/'), cli.button);
    let started = Instant::now();

    for i in 0..cli.count {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
        }

        let ticks = started.elapsed().as_millis().to_string();
        match async_client
            .publish(&topic, rumqttc::QoS::AtLeastOnce, false, ticks.as_bytes())
            .await
        {
            Ok(()) => info!("Pressed {} (ticks {})", topic, ticks),
            Err(e) => warn!("Failed to publish to {}: {}", topic, e),
        }
    }

    // Give the event loop time to flush the queued publishes
    tokio::time::sleep(Duration::from_secs(1)).await;
    mqtt_handle.abort();

    info!("Sent {} press(es) to {}", cli.count, topic);
}
