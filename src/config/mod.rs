//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AuthConfig, DatabaseConfig, LlmConfig, LogFormat, LoggingConfig, MetricsConfig,
    RedisConfig, ServerConfig, StorageSettings,
};
