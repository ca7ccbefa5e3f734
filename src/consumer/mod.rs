//! The Consumer module runs one concurrent dispatch loop per subscribed
//! topic.
//!
//! Handlers are bound to topics through the [`ConsumerBuilder`] before
//! [`Consumer::start`] is called; the resulting registry is immutable, so
//! the loops share it without locking. A single [`CancellationToken`] fans
//! out to every loop, and `start` blocks until all loops have exited.
//!
//! Per-message read and handler errors are logged and the loop continues;
//! only setup failures (creating or subscribing a reader) are fatal.

pub mod reader;
pub mod registry;
pub mod traits;

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, ReadRetryConfig};
use self::reader::KafkaTopicReader;
use self::registry::{HandlerRegistry, HandlerRegistryBuilder, MessageHandler};
use self::traits::{ReceivedMessage, TopicReader};

/// Represents the set of errors that can occur during the consumer's
/// operation.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// No configuration was provided to the `ConsumerBuilder`.
    #[error("Missing configuration for Consumer")]
    MissingConfig,

    /// An error occurred while creating or reading from a subscription.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// A multi-topic Kafka consumer with per-topic dispatch loops.
pub struct Consumer {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The frozen topic-to-handler mapping, read concurrently by all loops.
    registry: Arc<HandlerRegistry>,
}

impl Consumer {
    /// Creates a new `ConsumerBuilder`.
    pub fn builder() -> ConsumerBuilder {
        ConsumerBuilder::default()
    }

    /// Spawns one dispatch loop per configured topic and blocks until all
    /// loops have exited.
    ///
    /// The setup phase creates and subscribes every reader before any loop
    /// spawns, so a subscription failure is returned without leaving partial
    /// work running. After setup, loops exit only when `token` is cancelled;
    /// a clean shutdown returns `Ok(())`.
    pub async fn start(&self, token: CancellationToken) -> Result<(), ConsumerError> {
        let mut readers = Vec::new();
        for topic in self.config.topics() {
            let reader = KafkaTopicReader::subscribe(&self.config, &topic)?;
            readers.push(reader);
        }

        let mut join_set = JoinSet::new();
        for reader in readers {
            let registry = Arc::clone(&self.registry);
            let retry = self.config.read_retry.clone();
            let loop_token = token.clone();
            join_set.spawn(async move {
                run_topic_loop(reader, registry, retry, loop_token).await;
            });
        }

        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "A dispatch loop panicked. Initiating shutdown.");
                token.cancel();
            }
        }

        tracing::info!("All dispatch loops have shut down.");
        Ok(())
    }
}

/// A builder for creating a `Consumer` instance.
///
/// Handlers must be registered here, before the consumer starts; the
/// registry is frozen by [`ConsumerBuilder::build`].
#[derive(Default)]
pub struct ConsumerBuilder {
    config: Option<AppConfig>,
    registry: HandlerRegistryBuilder,
}

impl ConsumerBuilder {
    /// Sets the application configuration for the `Consumer`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Binds `handler` to `topic`. Re-registration overwrites the prior
    /// binding (last-write-wins).
    pub fn handler(mut self, topic: &str, handler: Arc<dyn MessageHandler>) -> Self {
        self.registry = self.registry.register(topic, handler);
        self
    }

    /// Assembles the `Consumer`, freezing the handler registry.
    pub fn build(self) -> Result<Consumer, ConsumerError> {
        let config = self.config.ok_or(ConsumerError::MissingConfig)?;
        let registry = self.registry.build();

        if registry.is_empty() {
            tracing::warn!("No handlers registered; all received messages will be skipped.");
        }

        Ok(Consumer { config: Arc::new(config), registry: Arc::new(registry) })
    }
}

/// The dispatch loop for a single topic.
///
/// Checks for cancellation before every blocking read. Read errors are
/// logged and retried with bounded exponential backoff; the backoff resets
/// after a successful read. The loop has no natural end of stream and exits
/// only on cancellation.
async fn run_topic_loop<R: TopicReader>(
    reader: R,
    registry: Arc<HandlerRegistry>,
    retry: ReadRetryConfig,
    token: CancellationToken,
) {
    tracing::info!(topic = %reader.topic(), "Starting consumption");

    let initial_backoff = Duration::from_millis(retry.initial_backoff_ms);
    let max_backoff = Duration::from_millis(retry.max_backoff_ms);
    let mut backoff = initial_backoff;

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                tracing::info!(topic = %reader.topic(), "Cancellation signal received, stopping consumption");
                break;
            }

            result = reader.read() => match result {
                Ok(message) => {
                    tracing::debug!(
                        topic = %message.topic,
                        partition = message.partition,
                        offset = message.offset,
                        key = %String::from_utf8_lossy(&message.key),
                        "Received message"
                    );
                    dispatch_message(&registry, &message).await;
                    backoff = initial_backoff;
                }
                Err(e) => {
                    tracing::error!(topic = %reader.topic(), error = %e, "Error reading message, retrying after backoff");
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(max_backoff);
                }
            }
        }
    }

    tracing::info!(topic = %reader.topic(), "Dispatch loop has shut down.");
}

/// Dispatches one message to the handler bound to its topic.
///
/// A missing handler is a warning, not an error: the message is skipped and
/// still counts as consumed. A handler failure is logged and never
/// terminates the loop.
async fn dispatch_message(registry: &HandlerRegistry, message: &ReceivedMessage) {
    let Some(handler) = registry.get(&message.topic) else {
        tracing::warn!(topic = %message.topic, "No handler registered for topic, skipping message");
        return;
    };

    if let Err(e) = handler.handle(&message.topic, &message.key, &message.payload).await {
        tracing::error!(
            topic = %message.topic,
            key = %String::from_utf8_lossy(&message.key),
            error = %e,
            "Error handling message"
        );
    }
}
