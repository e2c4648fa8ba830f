use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Channel;

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    kind: Option<&str>,
) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "SELECT * FROM channels
         WHERE tenant_id = $1 AND ($2::text IS NULL OR kind = $2)
         ORDER BY created_at DESC",
    )
    .bind(tenant_id)
    .bind(kind)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channels WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_one(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    kind: &str,
    name: &str,
    config: &serde_json::Value,
    credentials_enc: Option<&[u8]>,
    is_active: bool,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "INSERT INTO channels (tenant_id, kind, name, config, credentials_enc, is_active)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(tenant_id)
    .bind(kind)
    .bind(name)
    .bind(config)
    .bind(credentials_enc)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    config: Option<&serde_json::Value>,
    credentials_enc: Option<&[u8]>,
    is_active: Option<bool>,
) -> Result<Channel, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "UPDATE channels SET
            name = COALESCE($3, name),
            config = COALESCE($4, config),
            credentials_enc = COALESCE($5, credentials_enc),
            is_active = COALESCE($6, is_active),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(config)
    .bind(credentials_enc)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM channels WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
