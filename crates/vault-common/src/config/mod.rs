//! Configuration structs

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, AppSettings, ChannelsConfig, ConfigError, DatabaseConfig,
    DeliveryConfig, Environment, RateLimitConfig, RetryConfig, ServerConfig, TelegramConfig,
};
