use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Message;

pub async fn list_by_conversation(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    role: &str,
    content: &str,
    metadata: &serde_json::Value,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        "INSERT INTO messages (conversation_id, role, content, metadata)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .bind(metadata)
    .fetch_one(executor)
    .await
}

/// Messages across all of a tenant's conversations since the start of the
/// current calendar month (UTC).
pub async fn count_this_month(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages m
         JOIN conversations c ON m.conversation_id = c.id
         WHERE c.tenant_id = $1
           AND m.created_at >= date_trunc('month', now() AT TIME ZONE 'utc') AT TIME ZONE 'utc'",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
}
