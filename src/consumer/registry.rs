//! The handler registry maps topic names to domain handlers.
//!
//! The registry is populated through [`HandlerRegistryBuilder`] before any
//! dispatch loop starts and is immutable afterwards, so the loops can read
//! it concurrently without locking. That discipline is enforced by
//! construction: the builder is consumed to produce the frozen registry.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors a domain handler can report back to the dispatch loop.
///
/// Handler errors are logged and the loop continues; the message counts as
/// processed from the transport's perspective.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload could not be decoded into the handler's expected shape.
    #[error("Failed to deserialize payload: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The handler's business logic failed.
    #[error("{0}")]
    Failed(String),
}

/// A domain handler bound to a topic.
///
/// Receives the raw key and payload bytes and owns deserialization of the
/// payload into its expected domain shape.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one message from `topic`.
    async fn handle(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<(), HandlerError>;
}

/// An immutable mapping from topic name to handler, shared read-only by all
/// dispatch loops.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    /// Looks up the handler bound to `topic`.
    pub fn get(&self, topic: &str) -> Option<&Arc<dyn MessageHandler>> {
        self.handlers.get(topic)
    }

    /// Returns the topics with a bound handler.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Returns the number of bound handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handler is bound.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder producing a frozen [`HandlerRegistry`].
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistryBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `topic`.
    ///
    /// Re-registering the same topic overwrites the prior binding
    /// (last-write-wins); this is deliberate, not an error.
    pub fn register(mut self, topic: &str, handler: Arc<dyn MessageHandler>) -> Self {
        self.handlers.insert(topic.to_string(), handler);
        self
    }

    /// Freezes the bindings into an immutable registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry { handlers: self.handlers }
    }
}
