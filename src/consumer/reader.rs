//! Kafka-backed implementation of the [`TopicReader`] seam.

use async_trait::async_trait;
use rdkafka::{
    ClientConfig, Message,
    consumer::{Consumer as KafkaConsumer, StreamConsumer},
};

use super::{
    ConsumerError,
    traits::{ReceivedMessage, TopicReader},
};
use crate::config::AppConfig;

/// A [`TopicReader`] backed by an `rdkafka` stream consumer subscribed to a
/// single topic under the shared consumer group.
pub struct KafkaTopicReader {
    topic: String,
    consumer: StreamConsumer,
}

impl KafkaTopicReader {
    /// Creates a stream consumer and subscribes it to `topic`.
    ///
    /// Failures here are setup errors and fatal for the owning loop.
    pub fn subscribe(config: &AppConfig, topic: &str) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()?;

        consumer.subscribe(&[topic])?;

        Ok(Self { topic: topic.to_string(), consumer })
    }
}

#[async_trait]
impl TopicReader for KafkaTopicReader {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn read(&self) -> Result<ReceivedMessage, ConsumerError> {
        let message = self.consumer.recv().await?;

        Ok(ReceivedMessage {
            topic: message.topic().to_string(),
            key: message.key().map(<[u8]>::to_vec).unwrap_or_default(),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            partition: message.partition(),
            offset: message.offset(),
        })
    }
}
