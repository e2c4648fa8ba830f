use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WebhookDelivery;

pub async fn create(
    pool: &PgPool,
    webhook_id: Uuid,
    event: &str,
    status: &str,
    response_status: Option<i32>,
    error: Option<&str>,
) -> Result<WebhookDelivery, sqlx::Error> {
    sqlx::query_as::<_, WebhookDelivery>(
        "INSERT INTO webhook_deliveries (webhook_id, event, status, response_status, error)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(webhook_id)
    .bind(event)
    .bind(status)
    .bind(response_status)
    .bind(error)
    .fetch_one(pool)
    .await
}

pub async fn list_by_webhook(
    pool: &PgPool,
    webhook_id: Uuid,
    limit: i64,
) -> Result<Vec<WebhookDelivery>, sqlx::Error> {
    sqlx::query_as::<_, WebhookDelivery>(
        "SELECT * FROM webhook_deliveries WHERE webhook_id = $1
         ORDER BY created_at DESC LIMIT $2",
    )
    .bind(webhook_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
