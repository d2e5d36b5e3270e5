//! Join request entity <-> model mapper

use chrono::{DateTime, Utc};
use vault_core::{ChatId, JoinRequest, JoinResolution};

use crate::models::JoinRequestModel;

/// Convert JoinRequestModel to JoinRequest entity
impl From<JoinRequestModel> for JoinRequest {
    fn from(model: JoinRequestModel) -> Self {
        JoinRequest {
            user_id: ChatId::new(model.user_id),
            channel_id: ChatId::new(model.channel_id),
            requested_at: model.requested_at,
            resolved_at: model.resolved_at,
            // Guarded by a CHECK constraint
            resolution: JoinResolution::parse(&model.resolution).unwrap_or(JoinResolution::Pending),
        }
    }
}

/// Convert JoinRequest to values for database insertion
pub struct JoinRequestInsert {
    pub user_id: i64,
    pub channel_id: i64,
    pub requested_at: DateTime<Utc>,
    pub resolution: &'static str,
}

impl JoinRequestInsert {
    pub fn new(request: &JoinRequest) -> Self {
        Self {
            user_id: request.user_id.into_inner(),
            channel_id: request.channel_id.into_inner(),
            requested_at: request.requested_at,
            resolution: request.resolution.as_str(),
        }
    }
}
