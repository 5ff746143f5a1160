use button_bridge::bridge::ButtonBridge;
use button_bridge::config::{self, Config};
use button_bridge::sink::{FirebaseSink, LogSink, StateSink};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::signal;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    config::load_dotenv();
    init_logger();
    info!("Starting MQTT button bridge");

    let config = Config::from_env();
    info!("Configuration loaded:");
    info!(
        "  MQTT Broker: {}:{} (client {})",
        config.mqtt.broker_host, config.mqtt.broker_port, config.mqtt.client_id
    );
    info!("  Topic: {}", config.mqtt.topic);
    info!("  Database Path: {}", config.database.path_prefix);
    info!(
        "  Debounce: {:?} cooldown, {:?} hold, {} scope",
        config.debounce.cooldown, config.debounce.hold, config.debounce.scope
    );

    let sink: Arc<dyn StateSink> = match &config.database.url {
        Some(url) => match FirebaseSink::new(url, config.database.auth_token.clone()) {
            Ok(sink) => {
                info!("  Database: {}", url);
                Arc::new(sink)
            }
            Err(e) => {
                error!("Failed to initialize database sink: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            warn!("DATABASE_URL not set, pressed states will only be logged");
            Arc::new(LogSink)
        }
    };

    let bridge = ButtonBridge::new(&config, sink).start();
    info!("Bridge is running, press Ctrl+C to exit");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    bridge.shutdown().await;
    info!("MQTT button bridge stopped");
}
