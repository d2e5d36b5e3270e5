//! Bot user entity <-> model mapper

use vault_core::{BotUser, ChatId};

use crate::models::BotUserModel;

/// Convert BotUserModel to BotUser entity
impl From<BotUserModel> for BotUser {
    fn from(model: BotUserModel) -> Self {
        BotUser {
            id: ChatId::new(model.id),
            first_seen: model.first_seen,
            last_active: model.last_active,
            files_received: model.files_received,
        }
    }
}
