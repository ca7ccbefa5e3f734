//! The `consume` command: binds the domain handlers to their topics and
//! runs the consumer until a shutdown signal arrives.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    config::AppConfig,
    consumer::{
        Consumer,
        registry::{HandlerError, MessageHandler},
    },
    models::{LogLevel, SensorReading, SystemLog},
    shutdown,
};

/// Arguments for the `consume` command.
#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Name identifying this consumer instance; attached to every log line.
    #[arg(long, default_value = "default-consumer")]
    pub name: String,
}

/// Runs the consumer under the identity from `args` until cancelled.
pub async fn execute(args: ConsumeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let span = tracing::info_span!("consumer", consumer_name = %args.name);

    async {
        tracing::info!("Starting consumer");

        let config = AppConfig::from_env()?;
        tracing::debug!(brokers = ?config.brokers, group = %config.consumer_group, "Configuration loaded.");

        let sensor_topic = config.sensor_data_topic.clone();
        let logs_topic = config.system_logs_topic.clone();

        let consumer = Consumer::builder()
            .config(config)
            .handler(&sensor_topic, Arc::new(SensorReadingHandler))
            .handler(&logs_topic, Arc::new(SystemLogHandler))
            .build()?;

        let token = CancellationToken::new();
        shutdown::trigger_on_signal(token.clone());

        consumer.start(token).await?;

        tracing::info!("Consumer gracefully shut down.");
        Ok(())
    }
    .instrument(span)
    .await
}

/// Decodes [`SensorReading`] payloads and logs the reading fields.
pub struct SensorReadingHandler;

#[async_trait]
impl MessageHandler for SensorReadingHandler {
    async fn handle(&self, topic: &str, _key: &[u8], value: &[u8]) -> Result<(), HandlerError> {
        let reading: SensorReading = serde_json::from_slice(value)?;

        tracing::info!(
            topic = %topic,
            device_id = %reading.device_id,
            sensor_type = %reading.sensor_type,
            value = reading.value,
            unit = %reading.unit,
            location = %reading.location_id,
            timestamp = %reading.timestamp,
            "Processed sensor reading"
        );

        Ok(())
    }
}

/// Decodes [`SystemLog`] payloads and re-emits them at the record's own
/// severity.
pub struct SystemLogHandler;

#[async_trait]
impl MessageHandler for SystemLogHandler {
    async fn handle(&self, topic: &str, _key: &[u8], value: &[u8]) -> Result<(), HandlerError> {
        let record: SystemLog = serde_json::from_slice(value)?;

        match record.level {
            LogLevel::Info => tracing::info!(
                topic = %topic, log_id = %record.id, service = %record.service, "{}", record.message
            ),
            LogLevel::Warning => tracing::warn!(
                topic = %topic, log_id = %record.id, service = %record.service, "{}", record.message
            ),
            LogLevel::Error => tracing::error!(
                topic = %topic, log_id = %record.id, service = %record.service, "{}", record.message
            ),
            LogLevel::Debug => tracing::debug!(
                topic = %topic, log_id = %record.id, service = %record.service, "{}", record.message
            ),
            LogLevel::Critical => tracing::error!(
                topic = %topic, log_id = %record.id, service = %record.service, alert = true, "{}", record.message
            ),
            LogLevel::Unknown => tracing::info!(
                topic = %topic, log_id = %record.id, service = %record.service, "{}", record.message
            ),
        }

        Ok(())
    }
}
