use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Document;

pub struct NewDocument<'a> {
    pub title: &'a str,
    pub source_type: &'a str,
    pub source_url: Option<&'a str>,
    pub content: Option<&'a str>,
    pub metadata: &'a serde_json::Value,
}

#[derive(Default)]
pub struct DocumentChanges<'a> {
    pub title: Option<&'a str>,
    pub status: Option<&'a str>,
    pub chunk_count: Option<i32>,
    pub error: Option<&'a str>,
    pub metadata: Option<&'a serde_json::Value>,
}

pub async fn list(
    pool: &PgPool,
    tenant_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "SELECT * FROM documents
         WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC",
    )
    .bind(tenant_id)
    .bind(status)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_one(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    doc: &NewDocument<'_>,
) -> Result<Document, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "INSERT INTO documents (tenant_id, title, source_type, source_url, content, metadata)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(tenant_id)
    .bind(doc.title)
    .bind(doc.source_type)
    .bind(doc.source_url)
    .bind(doc.content)
    .bind(doc.metadata)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    changes: &DocumentChanges<'_>,
) -> Result<Document, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "UPDATE documents SET
            title = COALESCE($3, title),
            status = COALESCE($4, status),
            chunk_count = COALESCE($5, chunk_count),
            error = COALESCE($6, error),
            metadata = COALESCE($7, metadata),
            updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(changes.title)
    .bind(changes.status)
    .bind(changes.chunk_count)
    .bind(changes.error)
    .bind(changes.metadata)
    .fetch_one(pool)
    .await
}

/// Put a document back in the ingestion queue state.
pub async fn reset_for_reprocess(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Document, sqlx::Error> {
    sqlx::query_as::<_, Document>(
        "UPDATE documents SET status = 'pending', error = NULL, chunk_count = 0, updated_at = now()
         WHERE id = $1 AND tenant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, tenant_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
