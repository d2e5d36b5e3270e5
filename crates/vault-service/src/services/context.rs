//! Service context - dependency container for services
//!
//! Holds the repositories, the platform client, in-process caches, and the
//! immutable gate configuration needed by services.

use std::sync::Arc;

use vault_cache::{InMemoryStats, KeyedLocks, SubscriptionCache};
use vault_core::traits::{
    DeliveryRepository, JoinRequestRepository, MessagingPlatform, StatsSink, TokenRepository,
    UserRepository,
};
use vault_core::ChatId;
use vault_db::{
    MemoryDeliveryRepository, MemoryJoinRequestRepository, MemoryTokenRepository,
    MemoryUserRepository, PgPool,
};

use super::config::GateConfig;
use super::error::{ServiceError, ServiceResult};
use super::scheduler::DeletionScheduler;

/// Per-(user, channel) serialization of membership updates
pub type SubscriptionLocks = KeyedLocks<(ChatId, ChatId)>;

/// Service context containing all dependencies
///
/// Cheap to clone; every dependency is shared behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    // Database pool, absent when running on in-memory storage
    pool: Option<PgPool>,

    // Repositories
    token_repo: Arc<dyn TokenRepository>,
    delivery_repo: Arc<dyn DeliveryRepository>,
    user_repo: Arc<dyn UserRepository>,
    join_request_repo: Arc<dyn JoinRequestRepository>,

    // Messaging platform
    platform: Arc<dyn MessagingPlatform>,

    // In-process state
    subscription_cache: Arc<SubscriptionCache>,
    subscription_locks: Arc<SubscriptionLocks>,
    stats: Arc<dyn StatsSink>,

    // Background deletion
    scheduler: Arc<DeletionScheduler>,

    config: Arc<GateConfig>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: Option<PgPool>,
        token_repo: Arc<dyn TokenRepository>,
        delivery_repo: Arc<dyn DeliveryRepository>,
        user_repo: Arc<dyn UserRepository>,
        join_request_repo: Arc<dyn JoinRequestRepository>,
        platform: Arc<dyn MessagingPlatform>,
        stats: Arc<dyn StatsSink>,
        config: GateConfig,
    ) -> Self {
        let subscription_cache = Arc::new(SubscriptionCache::new(config.cache_ttl));
        let scheduler = Arc::new(DeletionScheduler::new(
            platform.clone(),
            delivery_repo.clone(),
            stats.clone(),
            &config,
        ));

        Self {
            pool,
            token_repo,
            delivery_repo,
            user_repo,
            join_request_repo,
            platform,
            subscription_cache,
            subscription_locks: Arc::new(SubscriptionLocks::new()),
            stats,
            scheduler,
            config: Arc::new(config),
        }
    }

    // === Database Pool ===

    /// Get the PostgreSQL connection pool, if one is configured
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    // === Repositories ===

    /// Get the token repository
    pub fn token_repo(&self) -> &dyn TokenRepository {
        self.token_repo.as_ref()
    }

    /// Get the delivery record repository
    pub fn delivery_repo(&self) -> &dyn DeliveryRepository {
        self.delivery_repo.as_ref()
    }

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the join request repository
    pub fn join_request_repo(&self) -> &dyn JoinRequestRepository {
        self.join_request_repo.as_ref()
    }

    // === Platform ===

    /// Get the messaging platform client
    pub fn platform(&self) -> &dyn MessagingPlatform {
        self.platform.as_ref()
    }

    // === In-Process State ===

    /// Get the subscription cache
    pub fn subscription_cache(&self) -> &SubscriptionCache {
        &self.subscription_cache
    }

    /// Get the per-(user, channel) locks
    pub fn subscription_locks(&self) -> &SubscriptionLocks {
        &self.subscription_locks
    }

    /// Get the statistics sink
    pub fn stats(&self) -> &dyn StatsSink {
        self.stats.as_ref()
    }

    // === Scheduler ===

    /// Get a shared handle to the deletion scheduler
    pub fn scheduler(&self) -> &Arc<DeletionScheduler> {
        &self.scheduler
    }

    // === Configuration ===

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &self.pool.as_ref().map(|_| "PgPool"))
            .field("repositories", &"...")
            .field("cached_subscriptions", &self.subscription_cache.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    token_repo: Option<Arc<dyn TokenRepository>>,
    delivery_repo: Option<Arc<dyn DeliveryRepository>>,
    user_repo: Option<Arc<dyn UserRepository>>,
    join_request_repo: Option<Arc<dyn JoinRequestRepository>>,
    platform: Option<Arc<dyn MessagingPlatform>>,
    stats: Option<Arc<dyn StatsSink>>,
    config: Option<GateConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn token_repo(mut self, repo: Arc<dyn TokenRepository>) -> Self {
        self.token_repo = Some(repo);
        self
    }

    pub fn delivery_repo(mut self, repo: Arc<dyn DeliveryRepository>) -> Self {
        self.delivery_repo = Some(repo);
        self
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn join_request_repo(mut self, repo: Arc<dyn JoinRequestRepository>) -> Self {
        self.join_request_repo = Some(repo);
        self
    }

    /// Use fresh in-memory repositories for all storage
    pub fn memory_repositories(self) -> Self {
        self.token_repo(Arc::new(MemoryTokenRepository::new()))
            .delivery_repo(Arc::new(MemoryDeliveryRepository::new()))
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .join_request_repo(Arc::new(MemoryJoinRequestRepository::new()))
    }

    pub fn platform(mut self, platform: Arc<dyn MessagingPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// Statistics default to process-local counters.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.pool,
            self.token_repo
                .ok_or_else(|| ServiceError::validation("token_repo is required"))?,
            self.delivery_repo
                .ok_or_else(|| ServiceError::validation("delivery_repo is required"))?,
            self.user_repo
                .ok_or_else(|| ServiceError::validation("user_repo is required"))?,
            self.join_request_repo
                .ok_or_else(|| ServiceError::validation("join_request_repo is required"))?,
            self.platform
                .ok_or_else(|| ServiceError::validation("platform is required"))?,
            self.stats
                .unwrap_or_else(|| Arc::new(InMemoryStats::new())),
            self.config
                .ok_or_else(|| ServiceError::validation("config is required"))?,
        ))
    }
}
