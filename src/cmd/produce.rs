//! The `produce` command: generates synthetic sensor readings and system
//! logs and publishes them through the [`Producer`].

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    models::{LogLevel, SensorReading, SystemLog},
    producer::Producer,
    shutdown,
};

const SENSOR_TYPES: &[&str] = &["temperature", "humidity", "pressure", "light", "motion"];
const LOCATIONS: &[&str] = &["building1", "building2", "building3"];
const SERVICES: &[&str] = &["auth", "api", "database", "cache", "worker"];
const DEVICE_COUNT: u32 = 10;

const SENSOR_INTERVAL: Duration = Duration::from_millis(500);
const SYSTEM_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Runs the producer until a shutdown signal arrives, then flushes and
/// reports what could not be delivered.
pub async fn execute() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting producer...");

    let config = AppConfig::from_env()?;
    tracing::debug!(brokers = ?config.brokers, "Configuration loaded.");

    let producer = Arc::new(Producer::new(&config)?);

    let token = CancellationToken::new();
    shutdown::trigger_on_signal(token.clone());

    let mut join_set = JoinSet::new();

    let sensor_producer = Arc::clone(&producer);
    let sensor_topic = config.sensor_data_topic.clone();
    let sensor_token = token.clone();
    join_set.spawn(async move {
        generate_sensor_readings(sensor_producer, sensor_topic, sensor_token).await;
    });

    let log_producer = Arc::clone(&producer);
    let log_topic = config.system_logs_topic.clone();
    let log_token = token.clone();
    join_set.spawn(async move {
        generate_system_logs(log_producer, log_topic, log_token).await;
    });

    while join_set.join_next().await.is_some() {}

    // Generators have stopped; flush whatever the client still buffers.
    let report = producer.close();
    if report.is_clean() {
        tracing::info!("Producer gracefully shut down.");
    } else {
        tracing::warn!(
            dropped = report.total_dropped(),
            "Producer shut down with unflushed messages."
        );
    }

    Ok(())
}

/// Publishes a random [`SensorReading`] every 500ms, keyed by device id so
/// readings from one device stay on one partition.
async fn generate_sensor_readings(
    producer: Arc<Producer>,
    topic: String,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(SENSOR_INTERVAL);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = interval.tick() => {
                let reading = random_sensor_reading();
                let key = reading.device_id.clone();
                if let Err(e) = producer.publish(&topic, &key, &reading).await {
                    tracing::error!(topic = %topic, key = %key, error = %e, "Failed to publish sensor reading");
                }
            }
        }
    }
}

/// Publishes a random [`SystemLog`] every second, keyed by service name.
async fn generate_system_logs(producer: Arc<Producer>, topic: String, token: CancellationToken) {
    let mut interval = tokio::time::interval(SYSTEM_LOG_INTERVAL);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = interval.tick() => {
                let record = random_system_log();
                let key = record.service.clone();
                if let Err(e) = producer.publish(&topic, &key, &record).await {
                    tracing::error!(topic = %topic, key = %key, error = %e, "Failed to publish system log");
                }
            }
        }
    }
}

fn random_sensor_reading() -> SensorReading {
    let mut rng = rand::thread_rng();

    let sensor_type = *SENSOR_TYPES.choose(&mut rng).unwrap();
    let device_id = format!("device-{}", rng.gen_range(0..DEVICE_COUNT));

    SensorReading {
        id: format!("sensor-{}-{}", sensor_type, Utc::now().timestamp_nanos_opt().unwrap_or(0)),
        sensor_type: sensor_type.to_string(),
        value: rng.gen_range(0.0..100.0),
        unit: unit_for_sensor_type(sensor_type).to_string(),
        timestamp: Utc::now(),
        device_id,
        location_id: LOCATIONS.choose(&mut rng).unwrap().to_string(),
    }
}

fn random_system_log() -> SystemLog {
    let mut rng = rand::thread_rng();

    let service = *SERVICES.choose(&mut rng).unwrap();
    let level = *[
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Debug,
        LogLevel::Critical,
    ]
    .choose(&mut rng)
    .unwrap();

    SystemLog {
        id: format!("log-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0)),
        level,
        message: log_message_for(level, &mut rng),
        service: service.to_string(),
        timestamp: Utc::now(),
    }
}

fn unit_for_sensor_type(sensor_type: &str) -> &'static str {
    match sensor_type {
        "temperature" => "°C",
        "humidity" => "%",
        "pressure" => "hPa",
        "light" => "lux",
        "motion" => "boolean",
        _ => "unknown",
    }
}

fn log_message_for(level: LogLevel, rng: &mut impl Rng) -> String {
    let templates: &[&str] = match level {
        LogLevel::Info => &[
            "Service started successfully",
            "Request processed",
            "User logged in",
            "Cache hit ratio nominal",
        ],
        LogLevel::Warning => &[
            "High resource usage detected",
            "Request took longer than expected",
            "Rate limit approaching",
            "Cache miss rate increasing",
        ],
        LogLevel::Error => &[
            "Failed to connect to database",
            "Request failed",
            "Authentication failed",
            "Service dependency unreachable",
        ],
        LogLevel::Debug => &[
            "Processing request",
            "Query executed",
            "Cache state updated",
            "Worker pool size adjusted",
        ],
        LogLevel::Critical => &[
            "Service is unresponsive",
            "Database connection pool exhausted",
            "Memory usage exceeded threshold",
            "Critical security alert",
        ],
        // The generator never picks this level; it only exists on the
        // consumer side for records with unrecognized severities.
        LogLevel::Unknown => &["Unclassified service event"],
    };

    let template = templates.choose(rng).unwrap();
    format!("{} ({}ms)", template, rng.gen_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_sensor_reading_has_matching_unit() {
        for _ in 0..50 {
            let reading = random_sensor_reading();
            assert_eq!(reading.unit, unit_for_sensor_type(&reading.sensor_type));
            assert!(reading.device_id.starts_with("device-"));
            assert!((0.0..100.0).contains(&reading.value));
        }
    }

    #[test]
    fn test_random_system_log_uses_known_service() {
        for _ in 0..50 {
            let record = random_system_log();
            assert!(SERVICES.contains(&record.service.as_str()));
            assert!(!record.message.is_empty());
        }
    }
}
