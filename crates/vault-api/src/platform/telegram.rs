//! Telegram Bot API client
//!
//! Implements [`MessagingPlatform`] over HTTPS. Every method is a JSON POST
//! to `{api_url}/bot{token}/{method}`; replies arrive in the Bot API envelope
//! `{ "ok": bool, "result": .., "error_code": .., "description": .. }`.
//! Retrying is left to the caller, this client classifies failures only.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;

use vault_common::TelegramConfig;
use vault_core::{
    ArchiveFileRef, ChatId, MemberStatus, MessageId, MessagingPlatform, PlatformError,
    PlatformResult,
};

/// Bot API client
pub struct TelegramClient {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl TelegramClient {
    /// Build a client with the configured per-request timeout
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    /// Call one Bot API method and unwrap its envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: serde_json::Value,
    ) -> PlatformResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let reply: Reply<T> = match response.json().await {
            Ok(reply) => reply,
            // Proxies in front of the Bot API answer with HTML on outages
            Err(e) if status >= 500 => {
                return Err(PlatformError::Unavailable(format!("HTTP {status}: {}", e.without_url())))
            }
            Err(e) => return Err(transport_error(e)),
        };

        match reply {
            Reply {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Reply {
                error_code,
                description,
                parameters,
                ..
            } => {
                let description = description.unwrap_or_else(|| "no description".to_string());
                let code = error_code.unwrap_or(status);
                debug!(method, code, %description, "Bot API call failed");
                Err(classify(
                    code,
                    &description,
                    parameters.and_then(|p| p.retry_after),
                ))
            }
        }
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl MessagingPlatform for TelegramClient {
    async fn check_membership(
        &self,
        channel_id: ChatId,
        user_id: ChatId,
    ) -> PlatformResult<MemberStatus> {
        let result = self
            .call::<ChatMember>(
                "getChatMember",
                json!({ "chat_id": channel_id, "user_id": user_id }),
            )
            .await;

        match result {
            Ok(member) => Ok(member.status()),
            // The platform answers 400 for users it has never seen in the chat
            Err(PlatformError::BadRequest(description)) if is_unknown_participant(&description) => {
                Ok(MemberStatus::Left)
            }
            Err(e) => Err(e),
        }
    }

    async fn copy_message(
        &self,
        from: ArchiveFileRef,
        to: ChatId,
        protect_content: bool,
    ) -> PlatformResult<MessageId> {
        let copied: MessageRef = self
            .call(
                "copyMessage",
                json!({
                    "chat_id": to,
                    "from_chat_id": from.channel_id,
                    "message_id": from.message_id,
                    "protect_content": protect_content,
                }),
            )
            .await?;
        Ok(copied.message_id)
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> PlatformResult<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> PlatformResult<MessageId> {
        let sent: MessageRef = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(sent.message_id)
    }

    async fn ping(&self) -> PlatformResult<()> {
        let _: serde_json::Value = self.call("getMe", json!({})).await?;
        Ok(())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Reply<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<u16>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    message_id: MessageId,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
    /// Only sent for restricted members
    is_member: Option<bool>,
}

impl ChatMember {
    fn status(&self) -> MemberStatus {
        match self.status.as_str() {
            "creator" => MemberStatus::Creator,
            "administrator" => MemberStatus::Administrator,
            "member" => MemberStatus::Member,
            "restricted" if self.is_member == Some(false) => MemberStatus::Left,
            "restricted" => MemberStatus::Restricted,
            "kicked" => MemberStatus::Kicked,
            _ => MemberStatus::Left,
        }
    }
}

// ============================================================================
// Error classification
// ============================================================================

/// Map a failed Bot API reply to a platform error
fn classify(code: u16, description: &str, retry_after: Option<u64>) -> PlatformError {
    let lower = description.to_lowercase();
    match code {
        429 => PlatformError::RateLimited { retry_after },
        500.. => PlatformError::Unavailable(description.to_string()),
        403 => PlatformError::Forbidden(description.to_string()),
        400 if lower.contains("message to") && lower.contains("not found") => {
            PlatformError::MessageNotFound(description.to_string())
        }
        _ => PlatformError::BadRequest(description.to_string()),
    }
}

fn is_unknown_participant(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("user not found") || lower.contains("participant_id_invalid")
}

/// Network-level failure; the URL is dropped because it embeds the bot token
fn transport_error(err: reqwest::Error) -> PlatformError {
    if err.is_timeout() {
        PlatformError::Timeout
    } else {
        PlatformError::Unavailable(err.without_url().to_string())
    }
}
