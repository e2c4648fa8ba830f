use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Conversation;

#[derive(Debug, Default)]
pub struct ConversationFilter {
    pub status: Option<String>,
    pub channel_id: Option<Uuid>,
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    filter: &ConversationFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations
         WHERE tenant_id = $1
           AND ($2::text IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR channel_id = $3)
         ORDER BY COALESCE(last_message_at, created_at) DESC
         LIMIT $4 OFFSET $5",
    )
    .bind(tenant_id)
    .bind(filter.status.as_deref())
    .bind(filter.channel_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    tenant_id: Uuid,
    filter: &ConversationFilter,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM conversations
         WHERE tenant_id = $1
           AND ($2::text IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR channel_id = $3)",
    )
    .bind(tenant_id)
    .bind(filter.status.as_deref())
    .bind(filter.channel_id)
    .fetch_one(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    channel_id: Option<Uuid>,
    external_user_id: &str,
    metadata: &serde_json::Value,
) -> Result<Conversation, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "INSERT INTO conversations (tenant_id, channel_id, external_user_id, metadata)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(tenant_id)
    .bind(channel_id)
    .bind(external_user_id)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE id = $1 AND tenant_id = $2",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    status: Option<&str>,
    metadata: Option<&serde_json::Value>,
) -> Result<Conversation, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "UPDATE conversations SET
            status = COALESCE($3, status),
            metadata = COALESCE($4, metadata),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(status)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

/// Bump `last_message_at`; an agent reply hands an open conversation over.
pub async fn touch<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    handoff: bool,
) -> Result<Conversation, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "UPDATE conversations SET
            last_message_at = now(),
            status = CASE WHEN $2 AND status = 'open' THEN 'handoff' ELSE status END,
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(handoff)
    .fetch_one(executor)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
