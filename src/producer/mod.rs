//! The Producer module owns one Kafka writer per configured topic and
//! publishes JSON-encoded domain events with partition-key routing.
//!
//! ## Delivery semantics
//!
//! `publish` returns once the client has acknowledged queuing the record, so
//! delivery is at-least-once from the caller's perspective. Sends are batched
//! by the client (`batch.num.messages` / `linger.ms`); messages still
//! buffered when the process is killed without a [`Producer::close`] call are
//! lost. `close` flushes every writer within the configured shutdown timeout
//! and reports anything it could not flush.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rdkafka::{
    ClientConfig,
    producer::{FutureProducer, FutureRecord, Producer as KafkaProducer},
};
use serde::Serialize;
use thiserror::Error;

use crate::config::AppConfig;

/// Errors returned by [`Producer::publish`] and construction.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// The payload could not be encoded to JSON.
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No writer is configured for the requested topic. This is a
    /// configuration error for the call, not a runtime retry case.
    #[error("No writer configured for topic '{0}'")]
    UnknownTopic(String),

    /// The broker client rejected the record or could not be created.
    #[error("Kafka transport error: {0}")]
    Transport(#[from] rdkafka::error::KafkaError),
}

/// The result of closing a [`Producer`]: which topics still had unflushed
/// messages when the flush timeout elapsed.
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Topics with messages that were not flushed, and how many.
    pub dropped: Vec<(String, i32)>,
}

impl CloseReport {
    /// Returns `true` if every writer flushed all buffered messages.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }

    /// Total number of messages that were dropped across all topics.
    pub fn total_dropped(&self) -> i64 {
        self.dropped.iter().map(|(_, count)| i64::from(*count)).sum()
    }
}

/// A topic-routed Kafka producer.
///
/// Owns exactly one writer per topic known at construction time. The writer
/// pool is never exposed for external mutation.
pub struct Producer {
    writers: HashMap<String, FutureProducer>,
    flush_timeout: Duration,
}

/// Builds the client configuration shared by every writer.
///
/// The murmur2 partitioner matches Kafka's standard key hashing, so an
/// identical key always routes to the same partition for a fixed partition
/// count.
fn writer_client_config(config: &AppConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", config.bootstrap_servers())
        .set("batch.num.messages", config.producer_batch_size.to_string())
        .set("linger.ms", config.producer_batch_timeout_ms.as_millis().to_string())
        .set("partitioner", "murmur2_random");
    client_config
}

impl Producer {
    /// Creates a new `Producer` with one writer per configured topic.
    pub fn new(config: &AppConfig) -> Result<Self, ProducerError> {
        let client_config = writer_client_config(config);

        let mut writers = HashMap::new();
        for topic in config.topics() {
            let writer = client_config.create::<FutureProducer>()?;
            writers.insert(topic, writer);
        }

        Ok(Self { writers, flush_timeout: config.shutdown_timeout })
    }

    /// Serializes `payload` to JSON and publishes it to `topic` under `key`.
    ///
    /// Returns once the client acknowledges queuing the record; the actual
    /// network send is batched. Errors are the caller's to log or retry. No
    /// network I/O is performed when the topic has no configured writer.
    pub async fn publish<T: Serialize>(
        &self,
        topic: &str,
        key: &str,
        payload: &T,
    ) -> Result<(), ProducerError> {
        let bytes = serde_json::to_vec(payload)?;

        let writer = self
            .writers
            .get(topic)
            .ok_or_else(|| ProducerError::UnknownTopic(topic.to_string()))?;

        let record = FutureRecord::to(topic)
            .key(key)
            .payload(&bytes)
            .timestamp(Utc::now().timestamp_millis());

        writer
            .send(record, Duration::from_secs(0))
            .await
            .map(|_| ())
            .map_err(|(kafka_error, _)| ProducerError::Transport(kafka_error))?;

        tracing::debug!(topic = %topic, key = %key, "Message queued");

        Ok(())
    }

    /// Closes every writer in the pool, best-effort.
    ///
    /// Each writer is flushed within the configured shutdown timeout; flush
    /// failures are logged and do not abort the remaining closes. The
    /// returned [`CloseReport`] records how many messages, if any, were still
    /// unflushed per topic.
    pub fn close(&self) -> CloseReport {
        let mut dropped = Vec::new();

        for (topic, writer) in &self.writers {
            tracing::info!(topic = %topic, "Closing writer");

            if let Err(e) = writer.flush(self.flush_timeout) {
                tracing::error!(topic = %topic, error = %e, "Failed to flush writer");
            }

            let in_flight = writer.in_flight_count();
            if in_flight > 0 {
                tracing::warn!(
                    topic = %topic,
                    count = in_flight,
                    "Messages still unflushed when the close timeout elapsed"
                );
                dropped.push((topic.clone(), in_flight));
            }
        }

        CloseReport { dropped }
    }

    /// Returns the topics this producer can publish to.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }
}
