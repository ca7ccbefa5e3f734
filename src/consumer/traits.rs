//! This module defines the interface between a topic's dispatch loop and the
//! underlying broker subscription.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::ConsumerError;

/// A message as received from the broker, with the raw key and payload bytes
/// copied out of the client's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// The topic the message was read from.
    pub topic: String,
    /// The partition key, empty when the record had no key.
    pub key: Vec<u8>,
    /// The JSON-encoded payload bytes.
    pub payload: Vec<u8>,
    /// The partition the message was read from.
    pub partition: i32,
    /// The offset of the message within its partition.
    pub offset: i64,
}

/// A single-topic subscription that yields messages in partition order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TopicReader: Send + Sync {
    /// The topic this reader is subscribed to.
    fn topic(&self) -> &str;

    /// Reads the next message, blocking until one arrives.
    async fn read(&self) -> Result<ReceivedMessage, ConsumerError>;
}
