//! In-memory statistics sink
//!
//! Counters live in a `DashMap` keyed by event, so concurrent retrievals
//! only contend when they bump the same counter shard.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use vault_core::{StatEvent, StatsSink};

/// Process-local counters
#[derive(Default)]
pub struct InMemoryStats {
    counters: DashMap<StatEvent, AtomicU64>,
}

impl InMemoryStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one counter
    pub fn get(&self, event: StatEvent) -> u64 {
        self.counters
            .get(&event)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }
}

impl StatsSink for InMemoryStats {
    fn record_many(&self, event: StatEvent, count: u64) {
        if count == 0 {
            return;
        }
        self.counters
            .entry(event)
            .or_default()
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Copy of every counter touched so far
    fn snapshot(&self) -> HashMap<StatEvent, u64> {
        self.counters
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }
}
