// Library interface for pilothealth
// The binary and the integration tests both go through these modules

pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use database::Database;
pub use error::{PilotHealthError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogRotation};
pub use metrics::{DerivedMetrics, MetricsEngine, MetricsInput};
pub use models::*;
pub use services::HealthService;
