use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Webhook;

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Webhook>, sqlx::Error> {
    sqlx::query_as::<_, Webhook>(
        "SELECT * FROM webhooks WHERE tenant_id = $1 ORDER BY created_at DESC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Active webhooks subscribed to `event`, directly or through `*`.
pub async fn list_subscribed(
    pool: &PgPool,
    tenant_id: Uuid,
    event: &str,
) -> Result<Vec<Webhook>, sqlx::Error> {
    sqlx::query_as::<_, Webhook>(
        "SELECT * FROM webhooks
         WHERE tenant_id = $1 AND is_active AND ($2 = ANY(events) OR '*' = ANY(events))",
    )
    .bind(tenant_id)
    .bind(event)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    url: &str,
    events: &[String],
    secret: &str,
) -> Result<Webhook, sqlx::Error> {
    sqlx::query_as::<_, Webhook>(
        "INSERT INTO webhooks (tenant_id, url, events, secret)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(tenant_id)
    .bind(url)
    .bind(events)
    .bind(secret)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Webhook>, sqlx::Error> {
    sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    url: Option<&str>,
    events: Option<&[String]>,
    is_active: Option<bool>,
) -> Result<Webhook, sqlx::Error> {
    sqlx::query_as::<_, Webhook>(
        "UPDATE webhooks SET
            url = COALESCE($3, url),
            events = COALESCE($4, events),
            is_active = COALESCE($5, is_active),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(url)
    .bind(events)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM webhooks WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
