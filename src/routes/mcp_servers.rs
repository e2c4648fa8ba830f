use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::McpServer;
use crate::response::{ApiResponse, ApiResult, Deleted};
use crate::state::SharedState;
use crate::validation::{one_of, require_non_empty, validate_http_url};

pub const TRANSPORTS: &[&str] = &["sse", "http"];

const DUPLICATE_NAME: &str = "An MCP server with this name already exists";

#[derive(Deserialize)]
pub struct CreateMcpServer {
    pub name: String,
    pub url: String,
    pub transport: Option<String>,
    pub headers: Option<serde_json::Value>,
    pub is_enabled: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateMcpServer {
    pub name: Option<String>,
    pub url: Option<String>,
    pub transport: Option<String>,
    pub headers: Option<serde_json::Value>,
    pub is_enabled: Option<bool>,
}

/// Headers are forwarded verbatim to the server, so only string values make
/// sense.
fn validate_headers(headers: &serde_json::Value) -> Result<(), AppError> {
    let map = headers
        .as_object()
        .ok_or_else(|| AppError::BadRequest("headers must be a JSON object".to_string()))?;
    if let Some((name, _)) = map.iter().find(|(_, v)| !v.is_string()) {
        return Err(AppError::BadRequest(format!(
            "header '{name}' must be a string"
        )));
    }
    Ok(())
}

pub async fn list(scope: TenantScope, State(state): State<SharedState>) -> ApiResult<Vec<McpServer>> {
    let servers = db::mcp_servers::list(&state.pool, scope.tenant_id).await?;
    Ok(ApiResponse::ok(servers))
}

pub async fn create(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<CreateMcpServer>,
) -> ApiResult<McpServer> {
    scope.require_manager()?;
    require_non_empty("name", &req.name)?;
    validate_http_url("url", &req.url)?;
    let transport = req.transport.as_deref().unwrap_or("http");
    one_of("transport", transport, TRANSPORTS)?;
    let headers = req.headers.unwrap_or_else(|| serde_json::json!({}));
    validate_headers(&headers)?;

    let server = db::mcp_servers::create(
        &state.pool,
        scope.tenant_id,
        req.name.trim(),
        req.url.trim(),
        transport,
        &headers,
        req.is_enabled.unwrap_or(true),
    )
    .await
    .map_err(|e| AppError::conflict_on_unique(e, DUPLICATE_NAME))?;

    audit::record(&state.pool, &scope, "mcp_server.created", "mcp_server", Some(server.id)).await;

    Ok(ApiResponse::created(server))
}

pub async fn get(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<McpServer> {
    let server = db::mcp_servers::find_by_id(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("MCP server not found".to_string()))?;
    Ok(ApiResponse::ok(server))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMcpServer>,
) -> ApiResult<McpServer> {
    scope.require_manager()?;
    if let Some(ref name) = req.name {
        require_non_empty("name", name)?;
    }
    if let Some(ref url) = req.url {
        validate_http_url("url", url)?;
    }
    if let Some(ref transport) = req.transport {
        one_of("transport", transport, TRANSPORTS)?;
    }
    if let Some(ref headers) = req.headers {
        validate_headers(headers)?;
    }

    let server = db::mcp_servers::update(
        &state.pool,
        id,
        scope.tenant_id,
        req.name.as_deref().map(str::trim),
        req.url.as_deref().map(str::trim),
        req.transport.as_deref(),
        req.headers.as_ref(),
        req.is_enabled,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("MCP server not found".to_string()),
        e => AppError::conflict_on_unique(e, DUPLICATE_NAME),
    })?;

    audit::record(&state.pool, &scope, "mcp_server.updated", "mcp_server", Some(server.id)).await;

    Ok(ApiResponse::ok(server))
}

pub async fn delete(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    scope.require_manager()?;
    if !db::mcp_servers::delete(&state.pool, id, scope.tenant_id).await? {
        return Err(AppError::NotFound("MCP server not found".to_string()));
    }

    audit::record(&state.pool, &scope, "mcp_server.deleted", "mcp_server", Some(id)).await;

    Ok(ApiResponse::ok(Deleted::new(id)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn headers_must_be_string_map() {
        assert!(validate_headers(&json!({})).is_ok());
        assert!(validate_headers(&json!({ "Authorization": "Bearer x" })).is_ok());
        assert!(validate_headers(&json!({ "X-Retries": 3 })).is_err());
        assert!(validate_headers(&json!(["Authorization"])).is_err());
    }
}
