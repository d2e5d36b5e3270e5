//! Statistics sink - fire-and-forget counters

use serde::Serialize;
use std::collections::HashMap;

/// Countable pipeline events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatEvent {
    RetrievalRequested,
    AccessDenied,
    InvalidLink,
    ExpiredLink,
    FileDelivered,
    DeliveryFailed,
    MessageDeleted,
    DeletionFailed,
    JoinRequestApproved,
}

/// Receives counter increments. Implementations must never block or fail.
pub trait StatsSink: Send + Sync {
    fn record(&self, event: StatEvent) {
        self.record_many(event, 1);
    }

    fn record_many(&self, event: StatEvent, count: u64);

    /// Current counter values. Sinks that forward elsewhere report nothing.
    fn snapshot(&self) -> HashMap<StatEvent, u64> {
        HashMap::new()
    }
}
