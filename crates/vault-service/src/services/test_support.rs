//! Scripted platform double for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use vault_core::{
    ArchiveFileRef, ChatId, MemberStatus, MessageId, MessagingPlatform, PlatformError,
    PlatformResult,
};

#[derive(Default)]
pub struct ScriptedPlatform {
    members: Mutex<HashMap<(ChatId, ChatId), MemberStatus>>,
    membership_error: Mutex<Option<PlatformError>>,
    failing_copies: Mutex<HashSet<MessageId>>,
    delete_error: Mutex<Option<PlatformError>>,
    failing_deletes: Mutex<HashMap<MessageId, PlatformError>>,
    deleted: Mutex<Vec<(ChatId, MessageId)>>,
    sent: Mutex<Vec<(ChatId, String)>>,
    membership_checks: AtomicUsize,
    copies: AtomicUsize,
    next_message_id: AtomicI64,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1_000),
            ..Self::default()
        }
    }

    pub fn join(&self, channel_id: ChatId, user_id: ChatId) {
        self.members
            .lock()
            .insert((channel_id, user_id), MemberStatus::Member);
    }

    pub fn fail_membership(&self, error: PlatformError) {
        *self.membership_error.lock() = Some(error);
    }

    pub fn fail_copy(&self, message_id: MessageId) {
        self.failing_copies.lock().insert(message_id);
    }

    pub fn fail_deletes(&self, error: PlatformError) {
        *self.delete_error.lock() = Some(error);
    }

    /// Deleting `message_id` keeps failing with `error`
    pub fn fail_delete_of(&self, message_id: MessageId, error: PlatformError) {
        self.failing_deletes.lock().insert(message_id, error);
    }

    pub fn membership_checks(&self) -> usize {
        self.membership_checks.load(Ordering::SeqCst)
    }

    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        self.deleted.lock().clone()
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MessagingPlatform for ScriptedPlatform {
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
        _to: ChatId,
        _protect_content: bool,
    ) -> PlatformResult<MessageId> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        if self.failing_copies.lock().contains(&from.message_id) {
            return Err(PlatformError::Unavailable("copy failed".into()));
        }
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()> {
        if let Some(error) = self.delete_error.lock().clone() {
            return Err(error);
        }
        if let Some(error) = self.failing_deletes.lock().get(&message_id).cloned() {
            return Err(error);
        }
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
