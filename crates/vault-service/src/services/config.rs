//! Gate configuration
//!
//! Immutable settings the services read. Built once from [`AppConfig`] at
//! startup and handed to the [`ServiceContext`](super::ServiceContext).

use std::time::Duration;

use vault_common::AppConfig;
use vault_core::{ChannelRequirement, ChatId};

use super::retry::RetryPolicy;

/// Largest number of files a single token may carry
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Private channel holding the archived files
    pub archive_channel: ChatId,
    /// Required channels in the order they are checked and reported
    pub required_channels: Vec<ChannelRequirement>,
    pub cache_ttl: Duration,
    /// Lifetime of delivered copies. `None` keeps them forever.
    pub auto_delete: Option<Duration>,
    pub protect_content: bool,
    /// Sent to a chat after its scheduled copies are removed
    pub deleted_notice: Option<String>,
    /// Default lifetime of newly issued links
    pub link_expiry: Option<Duration>,
    pub bot_username: String,
    pub retry: RetryPolicy,
    pub scheduler_tick: Duration,
    pub max_batch_size: usize,
}

impl GateConfig {
    /// Requirement for `channel_id`, if it is one of the gated channels
    pub fn requirement(&self, channel_id: ChatId) -> Option<&ChannelRequirement> {
        self.required_channels
            .iter()
            .find(|requirement| requirement.channel_id == channel_id)
    }

    pub fn is_required(&self, channel_id: ChatId) -> bool {
        self.requirement(channel_id).is_some()
    }
}

impl From<&AppConfig> for GateConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            archive_channel: config.channels.archive_channel,
            required_channels: config.channels.required.clone(),
            cache_ttl: config.channels.cache_ttl(),
            auto_delete: config.delivery.auto_delete(),
            protect_content: config.delivery.protect_content,
            deleted_notice: config.delivery.deleted_notice.clone(),
            link_expiry: config.delivery.link_expiry_secs.map(Duration::from_secs),
            bot_username: config.telegram.bot_username.clone(),
            retry: RetryPolicy::from(&config.retry),
            scheduler_tick: config.delivery.scheduler_tick(),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            archive_channel: ChatId::new(0),
            required_channels: Vec::new(),
            cache_ttl: Duration::from_secs(300),
            auto_delete: None,
            protect_content: true,
            deleted_notice: None,
            link_expiry: None,
            bot_username: String::new(),
            retry: RetryPolicy::default(),
            scheduler_tick: Duration::from_secs(1),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}
