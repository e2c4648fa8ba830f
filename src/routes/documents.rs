use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::db;
use crate::db::documents::{DocumentChanges, NewDocument};
use crate::dispatch;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::Document;
use crate::response::{ApiResponse, ApiResult, Deleted};
use crate::routes::billing::ensure_within_limit;
use crate::state::SharedState;
use crate::validation::{one_of, require_non_empty, require_object, validate_http_url};

pub const SOURCE_TYPES: &[&str] = &["text", "url", "file"];
pub const DOCUMENT_STATUSES: &[&str] = &["pending", "processing", "ready", "failed"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDocument {
    pub title: String,
    pub source_type: String,
    pub content: Option<String>,
    pub source_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub status: Option<String>,
    pub chunk_count: Option<i32>,
    pub error: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

fn validate_source(req: &CreateDocument) -> Result<(), AppError> {
    one_of("source_type", &req.source_type, SOURCE_TYPES)?;
    match req.source_type.as_str() {
        "text" => match req.content.as_deref() {
            Some(content) => require_non_empty("content", content),
            None => Err(AppError::BadRequest("content is required".to_string())),
        },
        "url" => match req.source_url.as_deref() {
            Some(url) => validate_http_url("source_url", url),
            None => Err(AppError::BadRequest("source_url is required".to_string())),
        },
        _ => Ok(()),
    }
}

fn emit(state: &SharedState, event: &'static str, doc: &Document) {
    match serde_json::to_value(doc) {
        Ok(data) => state.dispatcher.emit(&state.pool, doc.tenant_id, event, data),
        Err(e) => tracing::error!(document_id = %doc.id, "Failed to serialize event: {e}"),
    }
}

pub async fn list(
    scope: TenantScope,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Document>> {
    if let Some(ref status) = query.status {
        one_of("status", status, DOCUMENT_STATUSES)?;
    }
    let docs = db::documents::list(&state.pool, scope.tenant_id, query.status.as_deref()).await?;
    Ok(ApiResponse::ok(docs))
}

pub async fn create(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<CreateDocument>,
) -> ApiResult<Document> {
    require_non_empty("title", &req.title)?;
    validate_source(&req)?;
    let metadata = req.metadata.clone().unwrap_or_else(|| serde_json::json!({}));
    require_object("metadata", &metadata)?;

    let used = db::documents::count(&state.pool, scope.tenant_id).await?;
    ensure_within_limit(&state, scope.tenant_id, "documents", used, |p| p.max_documents).await?;

    let doc = db::documents::create(
        &state.pool,
        scope.tenant_id,
        &NewDocument {
            title: req.title.trim(),
            source_type: &req.source_type,
            source_url: req.source_url.as_deref(),
            content: req.content.as_deref(),
            metadata: &metadata,
        },
    )
    .await?;

    audit::record(&state.pool, &scope, "document.created", "document", Some(doc.id)).await;
    emit(&state, dispatch::DOCUMENT_CREATED, &doc);

    Ok(ApiResponse::created(doc))
}

pub async fn get(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    let doc = db::documents::find_by_id(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    Ok(ApiResponse::ok(doc))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocument>,
) -> ApiResult<Document> {
    if let Some(ref title) = req.title {
        require_non_empty("title", title)?;
    }
    if let Some(ref status) = req.status {
        one_of("status", status, DOCUMENT_STATUSES)?;
    }
    if req.chunk_count.is_some_and(|n| n < 0) {
        return Err(AppError::BadRequest(
            "chunk_count must not be negative".to_string(),
        ));
    }
    if let Some(ref metadata) = req.metadata {
        require_object("metadata", metadata)?;
    }

    let changes = DocumentChanges {
        title: req.title.as_deref().map(str::trim),
        status: req.status.as_deref(),
        chunk_count: req.chunk_count,
        error: req.error.as_deref(),
        metadata: req.metadata.as_ref(),
    };
    let doc = db::documents::update(&state.pool, id, scope.tenant_id, &changes)
        .await
        .map_err(|e| AppError::not_found_on_missing_row(e, "Document not found"))?;

    audit::record(&state.pool, &scope, "document.updated", "document", Some(doc.id)).await;
    emit(&state, dispatch::DOCUMENT_UPDATED, &doc);

    Ok(ApiResponse::ok(doc))
}

/// Queue the document for ingestion again.
pub async fn reprocess(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    let doc = db::documents::reset_for_reprocess(&state.pool, id, scope.tenant_id)
        .await
        .map_err(|e| AppError::not_found_on_missing_row(e, "Document not found"))?;

    audit::record(&state.pool, &scope, "document.reprocessed", "document", Some(doc.id)).await;
    emit(&state, dispatch::DOCUMENT_UPDATED, &doc);

    Ok(ApiResponse::ok(doc))
}

pub async fn delete(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !db::documents::delete(&state.pool, id, scope.tenant_id).await? {
        return Err(AppError::NotFound("Document not found".to_string()));
    }

    audit::record(&state.pool, &scope, "document.deleted", "document", Some(id)).await;

    Ok(ApiResponse::ok(Deleted::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source_type: &str, content: Option<&str>, url: Option<&str>) -> CreateDocument {
        CreateDocument {
            title: "FAQ".to_string(),
            source_type: source_type.to_string(),
            content: content.map(str::to_string),
            source_url: url.map(str::to_string),
            metadata: None,
        }
    }

    #[test]
    fn text_documents_need_content() {
        assert!(validate_source(&doc("text", Some("hello"), None)).is_ok());
        assert!(validate_source(&doc("text", None, None)).is_err());
        assert!(validate_source(&doc("text", Some("   "), None)).is_err());
    }

    #[test]
    fn url_documents_need_http_url() {
        assert!(validate_source(&doc("url", None, Some("https://acme.test/faq"))).is_ok());
        assert!(validate_source(&doc("url", None, Some("file:///etc/passwd"))).is_err());
        assert!(validate_source(&doc("url", None, None)).is_err());
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        assert!(validate_source(&doc("pdf", None, None)).is_err());
        assert!(validate_source(&doc("file", None, None)).is_ok());
    }
}
