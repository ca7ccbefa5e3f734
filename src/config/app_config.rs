use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Deserializer};

use super::{ReadRetryConfig, deserialize_broker_list, lenient_u64};

/// Provides the default broker list.
fn default_brokers() -> Vec<String> {
    vec![
        "localhost:9092".to_string(),
        "localhost:9093".to_string(),
        "localhost:9094".to_string(),
    ]
}

/// Provides the default sensor data topic name.
fn default_sensor_data_topic() -> String {
    "sensor-data".to_string()
}

/// Provides the default system logs topic name.
fn default_system_logs_topic() -> String {
    "system-logs".to_string()
}

/// Provides the default consumer group identity.
fn default_consumer_group() -> String {
    "data-processor".to_string()
}

/// Provides the default producer batch size.
fn default_producer_batch_size() -> u32 {
    100
}

/// Provides the default producer batch timeout.
fn default_producer_batch_timeout() -> Duration {
    Duration::from_secs(1)
}

/// Provides the default value for shutdown_timeout_secs.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Deserializes the producer batch size, falling back to the default when
/// the override cannot be parsed.
fn deserialize_batch_size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()) {
        Some(size) => Ok(size),
        None => {
            tracing::warn!("Unparsable producer batch size override, using default");
            Ok(default_producer_batch_size())
        }
    }
}

/// Deserializes the producer batch timeout from milliseconds, falling back
/// to the default when the override cannot be parsed.
fn deserialize_batch_timeout_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_u64(deserializer)? {
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => {
            tracing::warn!("Unparsable producer batch timeout override, using default");
            Ok(default_producer_batch_timeout())
        }
    }
}

/// Deserializes the shutdown timeout from seconds, falling back to the
/// default when the override cannot be parsed.
fn deserialize_shutdown_timeout_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_u64(deserializer)? {
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => {
            tracing::warn!("Unparsable shutdown timeout override, using default");
            Ok(default_shutdown_timeout())
        }
    }
}

/// Returns the environment source read by [`AppConfig::from_env`].
fn environment() -> Environment {
    Environment::with_prefix("PYLON").prefix_separator("_").separator("__")
}

/// Application configuration for Pylon.
///
/// Loaded once at startup and shared read-only by the producer and consumer;
/// never mutated after load.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// List of Kafka broker addresses to bootstrap from.
    #[serde(default = "default_brokers", deserialize_with = "deserialize_broker_list")]
    pub brokers: Vec<String>,

    /// Topic carrying sensor readings.
    #[serde(default = "default_sensor_data_topic")]
    pub sensor_data_topic: String,

    /// Topic carrying system log records.
    #[serde(default = "default_system_logs_topic")]
    pub system_logs_topic: String,

    /// Consumer group identity shared by all topic readers.
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,

    /// Maximum number of messages the producer batches before a send.
    #[serde(default = "default_producer_batch_size", deserialize_with = "deserialize_batch_size")]
    pub producer_batch_size: u32,

    /// How long the producer waits to fill a batch before sending it anyway.
    #[serde(
        default = "default_producer_batch_timeout",
        deserialize_with = "deserialize_batch_timeout_ms"
    )]
    pub producer_batch_timeout_ms: Duration,

    /// The maximum time in seconds to wait for buffered messages to flush at
    /// shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_shutdown_timeout_secs"
    )]
    pub shutdown_timeout: Duration,

    /// Backoff policy for transient read failures on the consumer side.
    #[serde(default)]
    pub read_retry: ReadRetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            sensor_data_topic: default_sensor_data_topic(),
            system_logs_topic: default_system_logs_topic(),
            consumer_group: default_consumer_group(),
            producer_batch_size: default_producer_batch_size(),
            producer_batch_timeout_ms: default_producer_batch_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
            read_retry: ReadRetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Creates a new `AppConfig` from environment variables.
    ///
    /// Variables use the `PYLON_` prefix, with `__` separating nesting
    /// levels (e.g. `PYLON_BROKERS`, `PYLON_CONSUMER_GROUP`,
    /// `PYLON_READ_RETRY__MAX_BACKOFF_MS`). Defaults are used whenever an
    /// override is absent or unparsable; an unparsable override is logged
    /// at warning level and replaced by the field default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(environment())
    }

    /// Loads the configuration from the given environment source.
    fn from_source(env: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder().add_source(env).build()?;
        s.try_deserialize()
    }

    /// Returns the topics known to both the producer and the consumer.
    pub fn topics(&self) -> Vec<String> {
        vec![self.sensor_data_topic.clone(), self.system_logs_topic.clone()]
    }

    /// Returns the broker list as a comma-separated bootstrap string.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn brokers(mut self, brokers: Vec<&str>) -> Self {
        self.config.brokers = brokers.into_iter().map(String::from).collect();
        self
    }

    pub fn sensor_data_topic(mut self, topic: &str) -> Self {
        self.config.sensor_data_topic = topic.to_string();
        self
    }

    pub fn system_logs_topic(mut self, topic: &str) -> Self {
        self.config.system_logs_topic = topic.to_string();
        self
    }

    pub fn consumer_group(mut self, group: &str) -> Self {
        self.config.consumer_group = group.to_string();
        self
    }

    pub fn producer_batch_size(mut self, size: u32) -> Self {
        self.config.producer_batch_size = size;
        self
    }

    pub fn producer_batch_timeout_ms(mut self, ms: u64) -> Self {
        self.config.producer_batch_timeout_ms = Duration::from_millis(ms);
        self
    }

    pub fn read_retry(mut self, retry: ReadRetryConfig) -> Self {
        self.config.read_retry = retry;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds the real environment source backed by an in-memory variable
    /// map, so tests cover the same path as `from_env` without touching the
    /// process environment.
    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(
            config.brokers,
            vec!["localhost:9092", "localhost:9093", "localhost:9094"]
        );
        assert_eq!(config.sensor_data_topic, "sensor-data");
        assert_eq!(config.system_logs_topic, "system-logs");
        assert_eq!(config.consumer_group, "data-processor");
        assert_eq!(config.producer_batch_size, 100);
        assert_eq!(config.producer_batch_timeout_ms, Duration::from_secs(1));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_source_with_no_overrides_uses_defaults() {
        let config = AppConfig::from_source(env_with(&[])).unwrap();
        assert_eq!(config.consumer_group, "data-processor");
        assert_eq!(config.producer_batch_size, 100);
    }

    #[test]
    fn test_from_source_reads_documented_variable_names() {
        let config = AppConfig::from_source(env_with(&[
            ("PYLON_CONSUMER_GROUP", "doc-group"),
            ("PYLON_BROKERS", "b1:9092,b2:9092"),
            ("PYLON_SENSOR_DATA_TOPIC", "readings"),
            ("PYLON_READ_RETRY__MAX_BACKOFF_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.consumer_group, "doc-group");
        assert_eq!(config.brokers, vec!["b1:9092", "b2:9092"]);
        assert_eq!(config.sensor_data_topic, "readings");
        assert_eq!(config.read_retry.max_backoff_ms, 250);
        // Fields without an override keep their defaults.
        assert_eq!(config.producer_batch_size, 100);
    }

    #[test]
    fn test_from_source_parses_numeric_overrides() {
        let config = AppConfig::from_source(env_with(&[
            ("PYLON_PRODUCER_BATCH_SIZE", "250"),
            ("PYLON_PRODUCER_BATCH_TIMEOUT_MS", "500"),
            ("PYLON_SHUTDOWN_TIMEOUT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.producer_batch_size, 250);
        assert_eq!(config.producer_batch_timeout_ms, Duration::from_millis(500));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_source_falls_back_on_unparsable_overrides() {
        let config = AppConfig::from_source(env_with(&[
            ("PYLON_PRODUCER_BATCH_SIZE", "not-a-number"),
            ("PYLON_PRODUCER_BATCH_TIMEOUT_MS", "soon"),
            ("PYLON_SHUTDOWN_TIMEOUT", "later"),
        ]))
        .unwrap();

        assert_eq!(config.producer_batch_size, 100);
        assert_eq!(config.producer_batch_timeout_ms, Duration::from_secs(1));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_topics_lists_both_streams() {
        let config = AppConfig::builder()
            .sensor_data_topic("readings")
            .system_logs_topic("logs")
            .build();
        assert_eq!(config.topics(), vec!["readings", "logs"]);
    }

    #[test]
    fn test_bootstrap_servers_joins_brokers() {
        let config = AppConfig::builder().brokers(vec!["10.0.0.1:9092", "10.0.0.2:9092"]).build();
        assert_eq!(config.bootstrap_servers(), "10.0.0.1:9092,10.0.0.2:9092");
    }

    #[test]
    fn test_app_config_builder() {
        let config = AppConfig::builder()
            .consumer_group("test-group")
            .producer_batch_size(10)
            .producer_batch_timeout_ms(250)
            .build();
        assert_eq!(config.consumer_group, "test-group");
        assert_eq!(config.producer_batch_size, 10);
        assert_eq!(config.producer_batch_timeout_ms, Duration::from_millis(250));
    }
}
