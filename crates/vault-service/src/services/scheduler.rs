//! Deletion scheduler
//!
//! Delivered copies are removed after the configured lifetime by a single
//! background task. Deadlines live in a min-heap; every record is persisted
//! first so a restart can reload it with [`DeletionScheduler::restore`].
//! Overdue records (for example after downtime) fire on the next pass.
//!
//! Deletion is best effort: each attempt goes through the shared retry
//! helper, and a record is dropped once it succeeds or retries run out.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vault_core::{
    ChatId, DeliveryRecord, DeliveryRepository, MessageId, MessagingPlatform, PlatformError,
    StatEvent, StatsSink,
};

use super::config::GateConfig;
use super::error::ServiceResult;
use super::retry::{retry_with_backoff, RetryPolicy};

/// Heap entry, ordered by deadline first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueuedDeletion {
    delete_at: DateTime<Utc>,
    chat_id: ChatId,
    message_id: MessageId,
}

impl From<&DeliveryRecord> for QueuedDeletion {
    fn from(record: &DeliveryRecord) -> Self {
        Self {
            delete_at: record.delete_at,
            chat_id: record.chat_id,
            message_id: record.message_id,
        }
    }
}

/// Time-ordered queue of pending deletions
pub struct DeletionScheduler {
    queue: Mutex<BinaryHeap<Reverse<QueuedDeletion>>>,
    wake: Notify,
    running: AtomicBool,
    platform: Arc<dyn MessagingPlatform>,
    deliveries: Arc<dyn DeliveryRepository>,
    stats: Arc<dyn StatsSink>,
    retry: RetryPolicy,
    tick: Duration,
    deleted_notice: Option<String>,
}

impl DeletionScheduler {
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        deliveries: Arc<dyn DeliveryRepository>,
        stats: Arc<dyn StatsSink>,
        config: &GateConfig,
    ) -> Self {
        Self {
            queue: Mutex::new(BinaryHeap::new()),
            wake: Notify::new(),
            running: AtomicBool::new(false),
            platform,
            deliveries,
            stats,
            retry: config.retry,
            tick: config.scheduler_tick,
            deleted_notice: config.deleted_notice.clone(),
        }
    }

    /// Persist a record and queue its deletion
    pub async fn schedule(&self, record: DeliveryRecord) -> ServiceResult<()> {
        self.deliveries.insert(&record).await?;
        self.queue.lock().push(Reverse(QueuedDeletion::from(&record)));
        self.wake.notify_one();

        debug!(
            chat_id = %record.chat_id,
            message_id = record.message_id,
            delete_at = %record.delete_at,
            "Deletion scheduled"
        );
        Ok(())
    }

    /// Reload persisted records, typically once at startup
    pub async fn restore(&self) -> ServiceResult<usize> {
        let records = self.deliveries.list_pending().await?;
        let count = records.len();
        {
            let mut queue = self.queue.lock();
            queue.extend(records.iter().map(|record| Reverse(QueuedDeletion::from(record))));
        }
        self.wake.notify_one();

        info!(count, "Restored pending deletions");
        Ok(count)
    }

    /// Number of queued deletions
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Earliest queued deadline
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.queue.lock().peek().map(|Reverse(entry)| entry.delete_at)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the background task. Returns `None` if it is already running.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Deletion scheduler is already running");
            return None;
        }

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            scheduler.run(shutdown).await;
        });

        info!(tick_ms = self.tick.as_millis() as u64, "Deletion scheduler started");
        Some(handle)
    }

    async fn run(&self, shutdown: CancellationToken) {
        loop {
            self.run_due(Utc::now()).await;

            let wait = self.wait_duration(Utc::now());
            tokio::select! {
                () = shutdown.cancelled() => break,
                () = self.wake.notified() => {}
                () = tokio::time::sleep(wait) => {}
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(pending = self.pending(), "Deletion scheduler stopped");
    }

    /// Sleep until the earliest deadline, never longer than one tick
    fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        match self.next_deadline() {
            Some(deadline) => (deadline - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(self.tick),
            None => self.tick,
        }
    }

    /// Fire every deletion due at `now`. Returns how many messages were removed.
    pub async fn run_due(&self, now: DateTime<Utc>) -> usize {
        let due = self.pop_due(now);
        if due.is_empty() {
            return 0;
        }

        let mut by_chat: HashMap<ChatId, Vec<MessageId>> = HashMap::new();
        for entry in due {
            by_chat.entry(entry.chat_id).or_default().push(entry.message_id);
        }

        futures::future::join_all(
            by_chat
                .into_iter()
                .map(|(chat_id, message_ids)| self.delete_batch(chat_id, message_ids)),
        )
        .await
        .into_iter()
        .sum()
    }

    fn pop_due(&self, now: DateTime<Utc>) -> Vec<QueuedDeletion> {
        let mut queue = self.queue.lock();
        let mut due = Vec::new();
        while queue.peek().is_some_and(|Reverse(entry)| entry.delete_at <= now) {
            if let Some(Reverse(entry)) = queue.pop() {
                due.push(entry);
            }
        }
        due
    }

    /// Delete one chat's due messages concurrently, then send a single notice
    async fn delete_batch(&self, chat_id: ChatId, message_ids: Vec<MessageId>) -> usize {
        let deleted = futures::future::join_all(
            message_ids
                .into_iter()
                .map(|message_id| self.delete_one(chat_id, message_id)),
        )
        .await
        .into_iter()
        .filter(|removed| *removed)
        .count();

        if deleted > 0 {
            self.send_notice(chat_id).await;
        }
        deleted
    }

    /// Returns true when this call removed the message
    async fn delete_one(&self, chat_id: ChatId, message_id: MessageId) -> bool {
        let platform = self.platform.as_ref();
        let result = retry_with_backoff(&self.retry, "delete_message", || {
            platform.delete_message(chat_id, message_id)
        })
        .await;

        let removed = match result {
            Ok(()) => {
                self.stats.record(StatEvent::MessageDeleted);
                debug!(chat_id = %chat_id, message_id, "Message deleted");
                true
            }
            Err(PlatformError::MessageNotFound(_)) => {
                debug!(chat_id = %chat_id, message_id, "Message already gone");
                false
            }
            Err(e) => {
                self.stats.record(StatEvent::DeletionFailed);
                warn!(chat_id = %chat_id, message_id, error = %e, "Giving up on deletion");
                false
            }
        };

        if let Err(e) = self.deliveries.remove(chat_id, message_id).await {
            error!(chat_id = %chat_id, message_id, error = %e, "Failed to drop delivery record");
        }
        removed
    }

    async fn send_notice(&self, chat_id: ChatId) {
        let Some(notice) = self.deleted_notice.as_deref() else {
            return;
        };

        let platform = self.platform.as_ref();
        let sent = retry_with_backoff(&self.retry, "send_message", || {
            platform.send_message(chat_id, notice)
        })
        .await;
        if let Err(e) = sent {
            warn!(chat_id = %chat_id, error = %e, "Failed to send deletion notice");
        }
    }
}

impl std::fmt::Debug for DeletionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeletionScheduler")
            .field("pending", &self.pending())
            .field("running", &self.is_running())
            .field("tick", &self.tick)
            .finish()
    }
}
