//! # vault-cache
//!
//! In-process state shared by concurrent retrievals.
//!
//! ## Features
//!
//! - **Subscription Cache**: per-(user, channel) membership status with a TTL
//! - **Keyed Locks**: async mutex per key, so updates to one pair never block another
//! - **Counters**: lock-free statistics sink
//!
//! ## Example
//!
//! ```ignore
//! use vault_cache::{KeyedLocks, SubscriptionCache};
//!
//! let cache = SubscriptionCache::new(Duration::from_secs(300));
//! let locks = KeyedLocks::new();
//!
//! let _guard = locks.lock((user_id, channel_id)).await;
//! if cache.get(user_id, channel_id).is_none() {
//!     // live check, then cache.put(record)
//! }
//! ```

pub mod locks;
pub mod stats;
pub mod subscription;

pub use locks::KeyedLocks;
pub use stats::InMemoryStats;
pub use subscription::SubscriptionCache;
