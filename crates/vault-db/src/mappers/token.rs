//! Access token entity <-> model mapper

use vault_core::{AccessToken, ArchiveFileRef, ChatId, TokenUsage};

use crate::models::{AccessTokenModel, TokenFileModel, TokenUsageModel};

/// Assemble an AccessToken from its row and its file rows (any order)
pub fn access_token_from_rows(model: AccessTokenModel, mut files: Vec<TokenFileModel>) -> AccessToken {
    files.sort_by_key(|f| f.position);

    AccessToken {
        token: model.token,
        files: files
            .into_iter()
            .map(|f| ArchiveFileRef::new(ChatId::new(f.channel_id), f.message_id))
            .collect(),
        created_by: model.created_by.map(ChatId::new),
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

impl From<TokenUsageModel> for TokenUsage {
    fn from(model: TokenUsageModel) -> Self {
        Self {
            access_count: model.access_count,
            last_accessed_at: model.last_accessed_at,
        }
    }
}

/// One access_token_files row, position preserving the token's file order
pub struct TokenFileInsert<'a> {
    pub token: &'a str,
    pub position: i32,
    pub channel_id: i64,
    pub message_id: i64,
}

impl<'a> TokenFileInsert<'a> {
    pub fn rows(token: &'a AccessToken) -> Vec<Self> {
        token
            .files
            .iter()
            .enumerate()
            .map(|(position, file)| Self {
                token: &token.token,
                position: position as i32,
                channel_id: file.channel_id.into_inner(),
                message_id: file.message_id,
            })
            .collect()
    }
}
