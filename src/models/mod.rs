//! This module contains the domain event types carried over the broker.

mod message;

pub use message::{LogLevel, SensorReading, SystemLog};
