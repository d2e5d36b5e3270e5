//! Test fixtures
//!
//! Channel and user IDs shared by the scenarios, plus [`FakePlatform`], a
//! messaging platform whose memberships and failures are scripted per test.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use vault_core::{
    ArchiveFileRef, ChatId, MemberStatus, MessageId, MessagingPlatform, PlatformError,
    PlatformResult,
};

/// Archive channel holding the stored files
pub const ARCHIVE: ChatId = ChatId::new(-1_001_000_000_000);
pub const C1: ChatId = ChatId::new(-1_001_000_000_001);
pub const C2: ChatId = ChatId::new(-1_001_000_000_002);
/// Request-gated in [`base_env`]
pub const C3: ChatId = ChatId::new(-1_001_000_000_003);

pub const U1: ChatId = ChatId::new(101);
pub const U2: ChatId = ChatId::new(102);
pub const U3: ChatId = ChatId::new(103);

pub const ADMIN_KEY: &str = "test-admin-key";
pub const UPDATE_SECRET: &str = "test-update-secret";

/// Environment shared by every test: three required channels, the third
/// request-gated, and millisecond backoff so retries stay fast.
pub fn base_env() -> Vec<(&'static str, String)> {
    vec![
        ("BOT_TOKEN", "123:test".to_string()),
        ("BOT_USERNAME", "VaultTestBot".to_string()),
        ("CHANNEL_ID", ARCHIVE.to_string()),
        ("ADMIN_API_KEY", ADMIN_KEY.to_string()),
        ("WEBHOOK_SECRET", UPDATE_SECRET.to_string()),
        ("FORCE_SUB_CHANNEL_1", C1.to_string()),
        ("FORCE_SUB_CHANNEL_1_LINK", "https://t.me/first_channel".to_string()),
        ("FORCE_SUB_CHANNEL_2", C2.to_string()),
        ("FORCE_SUB_CHANNEL_2_LINK", "https://t.me/second_channel".to_string()),
        ("FORCE_SUB_CHANNEL_3", C3.to_string()),
        ("FORCE_SUB_CHANNEL_3_MODE", "request".to_string()),
        ("FORCE_SUB_CHANNEL_3_LINK", "https://t.me/+third_channel".to_string()),
        ("RETRY_MAX_ATTEMPTS", "3".to_string()),
        ("RETRY_BASE_DELAY_MS", "1".to_string()),
        ("RETRY_MAX_DELAY_MS", "5".to_string()),
        ("SCHEDULER_TICK_MS", "20".to_string()),
    ]
}

/// Scripted messaging platform
///
/// Every call is recorded so tests can assert on what reached the platform.
pub struct FakePlatform {
    members: Mutex<HashMap<(ChatId, ChatId), MemberStatus>>,
    membership_error: Mutex<Option<PlatformError>>,
    /// Archive message IDs that always fail to copy
    broken_files: Mutex<HashSet<MessageId>>,
    /// Transient failures left before copies succeed
    flaky_copies: AtomicUsize,
    copy_delay: Mutex<Option<Duration>>,
    copies: Mutex<Vec<(ArchiveFileRef, ChatId, bool)>>,
    deleted: Mutex<Vec<(ChatId, MessageId)>>,
    sent: Mutex<Vec<(ChatId, String)>>,
    membership_checks: AtomicUsize,
    next_message_id: AtomicI64,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            membership_error: Mutex::new(None),
            broken_files: Mutex::new(HashSet::new()),
            flaky_copies: AtomicUsize::new(0),
            copy_delay: Mutex::new(None),
            copies: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            membership_checks: AtomicUsize::new(0),
            next_message_id: AtomicI64::new(5_000),
        }
    }

    // ------------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------------

    pub fn join(&self, channel_id: ChatId, user_id: ChatId) {
        self.members
            .lock()
            .insert((channel_id, user_id), MemberStatus::Member);
    }

    pub fn join_all(&self, user_id: ChatId) {
        for channel in [C1, C2, C3] {
            self.join(channel, user_id);
        }
    }

    pub fn leave(&self, channel_id: ChatId, user_id: ChatId) {
        self.members
            .lock()
            .insert((channel_id, user_id), MemberStatus::Left);
    }

    pub fn fail_membership(&self, error: PlatformError) {
        *self.membership_error.lock() = Some(error);
    }

    pub fn break_file(&self, message_id: MessageId) {
        self.broken_files.lock().insert(message_id);
    }

    pub fn flaky_copies(&self, failures: usize) {
        self.flaky_copies.store(failures, Ordering::SeqCst);
    }

    pub fn slow_copies(&self, delay: Duration) {
        *self.copy_delay.lock() = Some(delay);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn membership_checks(&self) -> usize {
        self.membership_checks.load(Ordering::SeqCst)
    }

    /// Archive message IDs copied successfully, in order
    pub fn copied_files(&self) -> Vec<MessageId> {
        self.copies.lock().iter().map(|(file, _, _)| file.message_id).collect()
    }

    pub fn copies(&self) -> Vec<(ArchiveFileRef, ChatId, bool)> {
        self.copies.lock().clone()
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.deleted.lock().clone()
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessagingPlatform for FakePlatform {
    async fn check_membership(
        &self,
        channel_id: ChatId,
        user_id: ChatId,
    ) -> PlatformResult<MemberStatus> {
        self.membership_checks.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.membership_error.lock().clone() {
            return Err(error);
        }
        Ok(self
            .members
            .lock()
            .get(&(channel_id, user_id))
            .copied()
            .unwrap_or(MemberStatus::Left))
    }

    async fn copy_message(
        &self,
        from: ArchiveFileRef,
        to: ChatId,
        protect_content: bool,
    ) -> PlatformResult<MessageId> {
        let delay = *self.copy_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken_files.lock().contains(&from.message_id) {
            return Err(PlatformError::MessageNotFound(format!(
                "archive message {}",
                from.message_id
            )));
        }
        let flaky = self
            .flaky_copies
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if flaky.is_ok() {
            return Err(PlatformError::Timeout);
        }

        self.copies.lock().push((from, to, protect_content));
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()> {
        self.deleted.lock().push((chat_id, message_id));
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> PlatformResult<MessageId> {
        self.sent.lock().push((chat_id, text.to_string()));
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn ping(&self) -> PlatformResult<()> {
        Ok(())
    }
}
