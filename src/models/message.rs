use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single reading from a sensor, published to the sensor data topic.
///
/// Readings from the same device share a partition key (`device_id`), so the
/// broker routes them to the same partition and the per-device ordering is
/// preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Unique identifier for this reading.
    pub id: String,
    /// The kind of sensor that produced the reading (e.g. "temperature").
    pub sensor_type: String,
    /// The measured value.
    pub value: f64,
    /// The unit of the measured value.
    pub unit: String,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
    /// The device that produced the reading.
    pub device_id: String,
    /// The location the device is installed at.
    pub location_id: String,
}

/// Severity of a [`SystemLog`] record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine operational information.
    Info,
    /// Something unexpected that does not require intervention.
    Warning,
    /// A failure that affected a single operation.
    Error,
    /// Diagnostic detail.
    Debug,
    /// A failure that requires immediate attention.
    Critical,
    /// A level this consumer does not recognize. Records carrying one are
    /// still processed, at the informational level.
    #[serde(other)]
    Unknown,
}

/// A log record emitted by an upstream service, published to the system logs
/// topic keyed by the originating service name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemLog {
    /// Unique identifier for this record.
    pub id: String,
    /// Severity of the record.
    pub level: LogLevel,
    /// Human-readable log message.
    pub message: String,
    /// Name of the service that emitted the record.
    pub service: String,
    /// When the record was emitted.
    pub timestamp: DateTime<Utc>,
}
