#![warn(missing_docs)]
//! Pylon is a topic-routed message production/consumption core on top of
//! Kafka: a producer that publishes typed JSON events with partition-key
//! routing through a per-topic writer pool, and a consumer that runs one
//! dispatch loop per subscribed topic and shuts down cleanly on
//! cancellation.

pub mod cmd;
pub mod config;
pub mod consumer;
pub mod models;
pub mod producer;
pub mod shutdown;
