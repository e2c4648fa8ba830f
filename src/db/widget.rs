use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WidgetConfig;

/// Insert the default widget row for a new tenant.
pub async fn create_default<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    tenant_id: Uuid,
) -> Result<WidgetConfig, sqlx::Error> {
    sqlx::query_as::<_, WidgetConfig>(
        "INSERT INTO widget_configs (tenant_id) VALUES ($1)
         ON CONFLICT (tenant_id) DO UPDATE SET tenant_id = EXCLUDED.tenant_id
         RETURNING *",
    )
    .bind(tenant_id)
    .fetch_one(executor)
    .await
}

pub async fn find(pool: &PgPool, tenant_id: Uuid) -> Result<Option<WidgetConfig>, sqlx::Error> {
    sqlx::query_as::<_, WidgetConfig>("SELECT * FROM widget_configs WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default)]
pub struct WidgetChanges<'a> {
    pub title: Option<&'a str>,
    pub welcome_message: Option<&'a str>,
    pub primary_color: Option<&'a str>,
    pub position: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

pub async fn upsert(
    pool: &PgPool,
    tenant_id: Uuid,
    changes: &WidgetChanges<'_>,
) -> Result<WidgetConfig, sqlx::Error> {
    create_default(pool, tenant_id).await?;
    sqlx::query_as::<_, WidgetConfig>(
        "UPDATE widget_configs SET
            title = COALESCE($2, title),
            welcome_message = COALESCE($3, welcome_message),
            primary_color = COALESCE($4, primary_color),
            position = COALESCE($5, position),
            avatar_url = COALESCE($6, avatar_url),
            updated_at = now()
         WHERE tenant_id = $1 RETURNING *",
    )
    .bind(tenant_id)
    .bind(changes.title)
    .bind(changes.welcome_message)
    .bind(changes.primary_color)
    .bind(changes.position)
    .bind(changes.avatar_url)
    .fetch_one(pool)
    .await
}
