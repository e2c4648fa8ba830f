use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Channel {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: String,
    pub name: String,
    pub config: serde_json::Value,
    #[serde(skip_serializing)]
    pub credentials_enc: Option<Vec<u8>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Channel as returned by the API: credentials are never echoed back, only
/// the names of the fields that are set.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelView {
    #[serde(flatten)]
    pub channel: Channel,
    pub has_credentials: bool,
    pub credential_fields: Vec<String>,
}

impl ChannelView {
    pub fn new(channel: Channel, credential_fields: Vec<String>) -> Self {
        Self {
            has_credentials: channel.credentials_enc.is_some(),
            channel,
            credential_fields,
        }
    }
}
