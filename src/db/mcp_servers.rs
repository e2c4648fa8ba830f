use sqlx::PgPool;
use uuid::Uuid;

use crate::models::McpServer;

pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<McpServer>, sqlx::Error> {
    sqlx::query_as::<_, McpServer>(
        "SELECT * FROM mcp_servers WHERE tenant_id = $1 ORDER BY name ASC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    name: &str,
    url: &str,
    transport: &str,
    headers: &serde_json::Value,
    is_enabled: bool,
) -> Result<McpServer, sqlx::Error> {
    sqlx::query_as::<_, McpServer>(
        "INSERT INTO mcp_servers (tenant_id, name, url, transport, headers, is_enabled)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(tenant_id)
    .bind(name)
    .bind(url)
    .bind(transport)
    .bind(headers)
    .bind(is_enabled)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<McpServer>, sqlx::Error> {
    sqlx::query_as::<_, McpServer>("SELECT * FROM mcp_servers WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    name: Option<&str>,
    url: Option<&str>,
    transport: Option<&str>,
    headers: Option<&serde_json::Value>,
    is_enabled: Option<bool>,
) -> Result<McpServer, sqlx::Error> {
    sqlx::query_as::<_, McpServer>(
        "UPDATE mcp_servers SET
            name = COALESCE($3, name),
            url = COALESCE($4, url),
            transport = COALESCE($5, transport),
            headers = COALESCE($6, headers),
            is_enabled = COALESCE($7, is_enabled),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(url)
    .bind(transport)
    .bind(headers)
    .bind(is_enabled)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM mcp_servers WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
