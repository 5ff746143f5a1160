use crate::debounce::DebounceScope;
use crate::publish::RetryPolicy;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Load environment variables from a `.env` file in the working directory.
///
/// Variables already set in the environment take precedence.
pub fn load_dotenv() {
    let Ok(content) = fs::read_to_string(Path::new(".env")) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called at the top of main, before the runtime spawns threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split a `.env` line into key and value. Blank lines and comments yield
/// `None`; surrounding quotes are stripped from the value.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let mut value = value.trim();

    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }

    (!key.is_empty()).then_some((key, value))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub database: DatabaseConfig,
    pub debounce: DebounceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Subscription pattern for button presses.
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Realtime Database URL. Writes are only logged when unset.
    pub url: Option<String>,
    pub auth_token: Option<String>,
    /// Parent path of the per-button pressed flags.
    pub path_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Minimum time between two accepted presses in the same window.
    pub cooldown: Duration,
    /// Time a button stays pressed in the database.
    pub hold: Duration,
    pub scope: DebounceScope,
    /// Attempts per database write, including the first.
    pub retry_attempts: u32,
    pub retry_initial_interval: Duration,
}

impl DebounceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            2,
            self.retry_initial_interval,
            Some(Duration::from_secs(5)),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig {
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: "mqtt-proxy".to_string(),
                username: None,
                password: None,
                topic: "button/pressed/#".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                auth_token: None,
                path_prefix: "rooside_soda/button/pressed".to_string(),
            },
            debounce: DebounceConfig {
                cooldown: Duration::from_secs(15),
                hold: Duration::from_secs(15),
                scope: DebounceScope::Global,
                retry_attempts: 3,
                retry_initial_interval: Duration::from_millis(500),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from defaults overridden by `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // MQTT configuration
        if let Some(host) = lookup("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Some(port) = parse_var(&lookup, "MQTT_BROKER_PORT") {
            config.mqtt.broker_port = port;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Some(username) = lookup("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Some(password) = lookup("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Some(topic) = lookup("MQTT_TOPIC") {
            config.mqtt.topic = topic;
        }

        // Database configuration
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
            config.database.url = Some(url);
        }
        if let Some(token) = lookup("DATABASE_AUTH_TOKEN").filter(|t| !t.is_empty()) {
            config.database.auth_token = Some(token);
        }
        if let Some(prefix) = lookup("DATABASE_PATH_PREFIX") {
            config.database.path_prefix = prefix.trim_matches('/').to_string();
        }

        // Debounce configuration
        if let Some(secs) = parse_var::<u64>(&lookup, "DEBOUNCE_COOLDOWN_SECS") {
            config.debounce.cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DEBOUNCE_HOLD_SECS") {
            config.debounce.hold = Duration::from_secs(secs);
        }
        if let Some(scope) = parse_var(&lookup, "DEBOUNCE_SCOPE") {
            config.debounce.scope = scope;
        }
        if let Some(attempts) = parse_var(&lookup, "SINK_RETRY_ATTEMPTS") {
            config.debounce.retry_attempts = attempts;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "SINK_RETRY_INITIAL_MS") {
            config.debounce.retry_initial_interval = Duration::from_millis(ms);
        }

        config
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
