use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub tenant_id: Uuid,
    pub title: String,
    pub welcome_message: String,
    pub primary_color: String,
    pub position: String,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}
