//! Application configuration structs
//!
//! Loads configuration from environment variables (and `.env` when present).
//! The result is immutable and handed to the services that need it.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use vault_core::{ChannelRequirement, ChatId, JoinMode};

/// Number of `FORCE_SUB_CHANNEL_<n>` slots read from the environment
pub const MAX_REQUIRED_CHANNELS: usize = 3;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    /// `None` runs on in-memory stores
    pub database: Option<DatabaseConfig>,
    pub telegram: TelegramConfig,
    pub channels: ChannelsConfig,
    pub delivery: DeliveryConfig,
    pub retry: RetryConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Parse an `APP_ENV` value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Telegram Bot API configuration
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    pub bot_username: String,
    pub request_timeout_secs: u64,
    /// Shared secret the update relay sends in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret: String,
}

/// Archive and required subscription channels
#[derive(Debug, Clone)]
pub struct ChannelsConfig {
    /// Private channel holding the stored files
    pub archive_channel: ChatId,
    /// Required channels in the order they are checked and shown
    pub required: Vec<ChannelRequirement>,
    pub cache_ttl_secs: u64,
}

impl ChannelsConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Delivery behaviour
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Seconds before a delivered copy is deleted, 0 disables auto-delete
    pub auto_delete_secs: u64,
    pub protect_content: bool,
    /// Text sent to the user after their copies were removed
    pub deleted_notice: Option<String>,
    /// Default lifetime of newly issued links
    pub link_expiry_secs: Option<u64>,
    /// Upper bound on how long the deletion scheduler sleeps between checks
    pub scheduler_tick_ms: u64,
}

impl DeliveryConfig {
    #[must_use]
    pub fn auto_delete(&self) -> Option<Duration> {
        (self.auto_delete_secs > 0).then(|| Duration::from_secs(self.auto_delete_secs))
    }

    #[must_use]
    pub fn scheduler_tick(&self) -> Duration {
        Duration::from_millis(self.scheduler_tick_ms.max(1))
    }
}

/// Bounded retry with exponential backoff for platform calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Admin surface configuration
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Bearer key required by admin routes
    pub api_key: String,
    pub owner_id: Option<ChatId>,
    pub admins: Vec<ChatId>,
}

impl AdminConfig {
    /// Owner or listed admin
    #[must_use]
    pub fn is_admin(&self, user_id: ChatId) -> bool {
        self.owner_id == Some(user_id) || self.admins.contains(&user_id)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

// Default value functions
fn default_app_name() -> String {
    "filevault".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_scheduler_tick_ms() -> u64 {
    1_000
}

fn default_requests_per_second() -> u32 {
    50
}

fn default_burst() -> u32 {
    100
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns an error if required keys are missing or malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let database = vars.get("DATABASE_URL").map(|url| -> Result<_, ConfigError> {
            Ok(DatabaseConfig {
                url,
                max_connections: vars
                    .parse("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: vars
                    .parse("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
            })
        });

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars
                    .get("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: vars.get("API_HOST").unwrap_or_else(default_host),
                port: vars.parse("API_PORT")?.unwrap_or_else(default_port),
            },
            database: database.transpose()?,
            telegram: TelegramConfig {
                bot_token: vars.require("BOT_TOKEN")?,
                api_url: vars
                    .get("TELEGRAM_API_URL")
                    .unwrap_or_else(default_api_url)
                    .trim_end_matches('/')
                    .to_string(),
                bot_username: vars
                    .require("BOT_USERNAME")?
                    .trim_start_matches('@')
                    .to_string(),
                request_timeout_secs: vars
                    .parse("TELEGRAM_REQUEST_TIMEOUT")?
                    .unwrap_or_else(default_request_timeout),
                webhook_secret: vars.require("WEBHOOK_SECRET")?,
            },
            channels: ChannelsConfig {
                archive_channel: vars
                    .parse::<ChatId>("CHANNEL_ID")?
                    .filter(|id| !id.is_zero())
                    .ok_or(ConfigError::MissingVar("CHANNEL_ID"))?,
                required: required_channels(&vars)?,
                cache_ttl_secs: vars
                    .parse("SUBSCRIPTION_CACHE_TTL")?
                    .unwrap_or_else(default_cache_ttl),
            },
            delivery: DeliveryConfig {
                auto_delete_secs: vars.parse("AUTO_DELETE_TIME")?.unwrap_or(0),
                protect_content: vars.parse_bool("PROTECT_CONTENT")?.unwrap_or(true),
                deleted_notice: vars.get("AUTO_DEL_SUCCESS_MSG").filter(|s| !s.trim().is_empty()),
                link_expiry_secs: vars.parse("LINK_EXPIRY")?.filter(|secs| *secs > 0),
                scheduler_tick_ms: vars
                    .parse("SCHEDULER_TICK_MS")?
                    .unwrap_or_else(default_scheduler_tick_ms),
            },
            retry: RetryConfig {
                max_attempts: vars
                    .parse("RETRY_MAX_ATTEMPTS")?
                    .unwrap_or_else(default_max_attempts)
                    .max(1),
                base_delay_ms: vars
                    .parse("RETRY_BASE_DELAY_MS")?
                    .unwrap_or_else(default_base_delay_ms),
                max_delay_ms: vars
                    .parse("RETRY_MAX_DELAY_MS")?
                    .unwrap_or_else(default_max_delay_ms),
            },
            admin: AdminConfig {
                api_key: vars.require("ADMIN_API_KEY")?,
                owner_id: vars.parse("OWNER_ID")?,
                admins: vars
                    .get("ADMINS")
                    .map(|s| {
                        s.split([',', ' '])
                            .filter(|part| !part.trim().is_empty())
                            .map(|part| {
                                ChatId::parse(part)
                                    .map_err(|_| ConfigError::InvalidValue("ADMINS", part.to_string()))
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()?
                    .unwrap_or_default(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: vars
                    .parse("RATE_LIMIT_REQUESTS_PER_SECOND")?
                    .unwrap_or_else(default_requests_per_second),
                burst: vars.parse("RATE_LIMIT_BURST")?.unwrap_or_else(default_burst),
            },
        })
    }
}

/// Reads `FORCE_SUB_CHANNEL_<n>` plus its `_MODE` and `_LINK` companions.
/// Unset or zero slots are skipped; order follows the slot number.
fn required_channels<F>(vars: &Vars<'_, F>) -> Result<Vec<ChannelRequirement>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEYS: [(&str, &str, &str); MAX_REQUIRED_CHANNELS] = [
        ("FORCE_SUB_CHANNEL_1", "FORCE_SUB_CHANNEL_1_MODE", "FORCE_SUB_CHANNEL_1_LINK"),
        ("FORCE_SUB_CHANNEL_2", "FORCE_SUB_CHANNEL_2_MODE", "FORCE_SUB_CHANNEL_2_LINK"),
        ("FORCE_SUB_CHANNEL_3", "FORCE_SUB_CHANNEL_3_MODE", "FORCE_SUB_CHANNEL_3_LINK"),
    ];

    let mut required = Vec::with_capacity(MAX_REQUIRED_CHANNELS);
    for (id_key, mode_key, link_key) in KEYS {
        let Some(channel_id) = vars.parse::<ChatId>(id_key)?.filter(|id| !id.is_zero()) else {
            continue;
        };
        let mode = match vars.get(mode_key) {
            Some(raw) => JoinMode::parse(&raw).ok_or(ConfigError::InvalidValue(mode_key, raw))?,
            None => JoinMode::Open,
        };
        let mut requirement = ChannelRequirement::new(channel_id, mode);
        if let Some(link) = vars.get(link_key) {
            requirement = requirement.with_invite_link(link);
        }
        if required
            .iter()
            .any(|r: &ChannelRequirement| r.channel_id == channel_id)
        {
            return Err(ConfigError::InvalidValue(id_key, channel_id.to_string()));
        }
        required.push(requirement);
    }
    Ok(required)
}

/// Typed access over a key lookup
struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|_| ConfigError::InvalidValue(key, raw))
            })
            .transpose()
    }

    fn parse_bool(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|raw| match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue(key, raw)),
            })
            .transpose()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
