//! Subscription status cache

mod subscription_cache;

pub use subscription_cache::SubscriptionCache;
