//! Integration tests for the produce/dispatch round trip.
//!
//! These tests require a reachable Kafka broker on `localhost:9092` and are
//! ignored by default.
//!
//! To run them locally against a broker:
//! `cargo test -- --ignored`

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use pylon::{
    config::AppConfig,
    consumer::{
        Consumer,
        registry::{HandlerError, MessageHandler},
    },
    models::SensorReading,
    producer::Producer,
};
use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;

/// A handler that forwards everything it sees to a channel for assertions.
struct CapturingHandler {
    tx: mpsc::Sender<(String, Vec<u8>)>,
}

#[async_trait]
impl MessageHandler for CapturingHandler {
    async fn handle(&self, topic: &str, _key: &[u8], value: &[u8]) -> Result<(), HandlerError> {
        self.tx
            .send((topic.to_string(), value.to_vec()))
            .await
            .map_err(|e| HandlerError::Failed(e.to_string()))
    }
}

fn unique_suffix() -> i64 {
    Utc::now().timestamp_millis()
}

fn test_reading() -> SensorReading {
    SensorReading {
        id: "sensor-temperature-it".to_string(),
        sensor_type: "temperature".to_string(),
        value: 23.4,
        unit: "°C".to_string(),
        timestamp: Utc::now(),
        device_id: "device-7".to_string(),
        location_id: "building1".to_string(),
    }
}

fn broker_config(suffix: i64) -> AppConfig {
    let mut config = AppConfig::default();
    config.brokers = vec!["localhost:9092".to_string()];
    config.sensor_data_topic = format!("pylon-it-sensor-{suffix}");
    config.system_logs_topic = format!("pylon-it-logs-{suffix}");
    config.consumer_group = format!("pylon-it-group-{suffix}");
    config
}

#[tokio::test]
#[ignore]
async fn test_published_message_reaches_registered_handler() {
    let config = broker_config(unique_suffix());
    let reading = test_reading();

    let producer = Producer::new(&config).unwrap();
    producer
        .publish(&config.sensor_data_topic, &reading.device_id, &reading)
        .await
        .unwrap();
    // Registered handler on topic A only; topic B gets a message too and
    // must produce nothing but a warning.
    producer
        .publish(&config.system_logs_topic, "api", &serde_json::json!({"orphan": true}))
        .await
        .unwrap();
    assert!(producer.close().is_clean());

    let (tx, mut rx) = mpsc::channel(8);
    let consumer = Consumer::builder()
        .config(config.clone())
        .handler(&config.sensor_data_topic, Arc::new(CapturingHandler { tx }))
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let consumer_token = token.clone();
    let consumer_task = tokio::spawn(async move { consumer.start(consumer_token).await });

    let (topic, payload) = timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for dispatch")
        .expect("capture channel closed");

    assert_eq!(topic, config.sensor_data_topic);
    let decoded: SensorReading = serde_json::from_slice(&payload).unwrap();
    assert_eq!(decoded, reading);

    // The unregistered topic's loop must still be alive and the shutdown
    // clean.
    token.cancel();
    let result = timeout(Duration::from_secs(10), consumer_task)
        .await
        .expect("consumer did not stop after cancellation")
        .expect("consumer task panicked");
    assert!(result.is_ok());
}

#[tokio::test]
#[ignore]
async fn test_cancellation_stops_consumer_with_no_traffic() {
    let config = broker_config(unique_suffix());

    let consumer = Consumer::builder().config(config).build().unwrap();

    let token = CancellationToken::new();
    let consumer_token = token.clone();
    let consumer_task = tokio::spawn(async move { consumer.start(consumer_token).await });

    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();

    let result = timeout(Duration::from_secs(10), consumer_task)
        .await
        .expect("consumer did not stop after cancellation")
        .expect("consumer task panicked");
    assert!(result.is_ok());
}
