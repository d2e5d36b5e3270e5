//! Subscription cache
//!
//! Remembers the last known membership status for each (user, channel) pair.
//! Entries older than the TTL read as unknown; writes carrying an older
//! `checked_at` than the stored entry are ignored.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use vault_core::{ChatId, SubscriptionRecord, SubscriptionStatus};

/// Cache key: (user, channel)
type Key = (ChatId, ChatId);

#[derive(Debug, Clone, Copy)]
struct CachedStatus {
    status: SubscriptionStatus,
    checked_at: DateTime<Utc>,
}

/// Concurrent TTL cache of subscription statuses
pub struct SubscriptionCache {
    entries: DashMap<Key, CachedStatus>,
    ttl: chrono::Duration,
}

impl SubscriptionCache {
    /// Create a cache whose entries stay fresh for `ttl`
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Fresh status for the pair, or `None` when unknown
    pub fn get(&self, user_id: ChatId, channel_id: ChatId) -> Option<SubscriptionStatus> {
        self.get_at(user_id, channel_id, Utc::now())
    }

    /// Same as [`get`](Self::get) evaluated at `now`
    pub fn get_at(
        &self,
        user_id: ChatId,
        channel_id: ChatId,
        now: DateTime<Utc>,
    ) -> Option<SubscriptionStatus> {
        self.entries
            .get(&(user_id, channel_id))
            .filter(|entry| !self.is_stale(entry.checked_at, now))
            .map(|entry| entry.status)
    }

    /// Store a status. Returns false when a newer record is already present.
    pub fn put(&self, record: SubscriptionRecord) -> bool {
        let key = (record.user_id, record.channel_id);
        let fresh = CachedStatus {
            status: record.status,
            checked_at: record.checked_at,
        };

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().checked_at > record.checked_at {
                    tracing::trace!(
                        user_id = %record.user_id,
                        channel_id = %record.channel_id,
                        "Ignoring out-of-order subscription update"
                    );
                    return false;
                }
                occupied.insert(fresh);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }
        true
    }

    /// Stored record regardless of freshness
    pub fn record(&self, user_id: ChatId, channel_id: ChatId) -> Option<SubscriptionRecord> {
        self.entries.get(&(user_id, channel_id)).map(|entry| {
            SubscriptionRecord::new(user_id, channel_id, entry.status, entry.checked_at)
        })
    }

    /// Forget one pair
    pub fn invalidate(&self, user_id: ChatId, channel_id: ChatId) {
        self.entries.remove(&(user_id, channel_id));
    }

    /// Drop entries that can no longer be served. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !self.is_stale(entry.checked_at, now));
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_stale(&self, checked_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(checked_at) > self.ttl
    }
}
