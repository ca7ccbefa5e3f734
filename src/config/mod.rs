//! Configuration module for Pylon.

mod app_config;
mod helpers;
mod read_retry;

pub use app_config::AppConfig;
pub use helpers::{deserialize_broker_list, lenient_u64};
pub use read_retry::ReadRetryConfig;
