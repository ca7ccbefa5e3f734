use serde::{Deserialize, Deserializer};

use super::helpers::lenient_u64;

/// Provides the default initial backoff delay in milliseconds.
fn default_initial_backoff_ms() -> u64 {
    100
}

/// Provides the default maximum backoff delay in milliseconds.
fn default_max_backoff_ms() -> u64 {
    5000
}

/// Deserializes the initial backoff delay, falling back to the default when
/// the override cannot be parsed.
fn deserialize_initial_backoff_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_u64(deserializer)? {
        Some(ms) => Ok(ms),
        None => {
            tracing::warn!("Unparsable initial backoff override, using default");
            Ok(default_initial_backoff_ms())
        }
    }
}

/// Deserializes the maximum backoff delay, falling back to the default when
/// the override cannot be parsed.
fn deserialize_max_backoff_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_u64(deserializer)? {
        Some(ms) => Ok(ms),
        None => {
            tracing::warn!("Unparsable maximum backoff override, using default");
            Ok(default_max_backoff_ms())
        }
    }
}

/// Configuration for the backoff policy applied to transient read failures.
#[derive(Debug, Deserialize, Clone)]
pub struct ReadRetryConfig {
    /// The initial backoff delay in milliseconds.
    #[serde(
        default = "default_initial_backoff_ms",
        deserialize_with = "deserialize_initial_backoff_ms"
    )]
    pub initial_backoff_ms: u64,
    /// The maximum backoff delay in milliseconds.
    #[serde(default = "default_max_backoff_ms", deserialize_with = "deserialize_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ReadRetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
