use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::crypto;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Channel, ChannelView};
use crate::response::{ApiResponse, ApiResult, Deleted};
use crate::routes::billing::ensure_within_limit;
use crate::state::SharedState;
use crate::validation::{one_of, require_non_empty, require_object};

pub const CHANNEL_KINDS: &[&str] = &["whatsapp", "messenger", "webchat"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateChannel {
    pub kind: String,
    pub name: String,
    pub config: Option<serde_json::Value>,
    pub credentials: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateChannel {
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
    pub credentials: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

fn seal_credentials(
    state: &SharedState,
    credentials: Option<&serde_json::Value>,
) -> Result<Option<Vec<u8>>, AppError> {
    credentials
        .map(|creds| {
            require_object("credentials", creds)?;
            crypto::seal_json(creds, &state.config.encryption_key).map_err(AppError::Internal)
        })
        .transpose()
}

fn to_view(state: &SharedState, channel: Channel) -> ChannelView {
    let fields = match channel.credentials_enc.as_deref() {
        Some(sealed) => match crypto::open_json(sealed, &state.config.encryption_key) {
            Ok(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(channel_id = %channel.id, "Failed to open channel credentials: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    ChannelView::new(channel, fields)
}

pub async fn list(
    scope: TenantScope,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ChannelView>> {
    if let Some(ref kind) = query.kind {
        one_of("kind", kind, CHANNEL_KINDS)?;
    }
    let channels = db::channels::list(&state.pool, scope.tenant_id, query.kind.as_deref()).await?;
    Ok(ApiResponse::ok(channels.into_iter().map(|c| to_view(&state, c)).collect()))
}

pub async fn create(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<CreateChannel>,
) -> ApiResult<ChannelView> {
    scope.require_manager()?;
    one_of("kind", &req.kind, CHANNEL_KINDS)?;
    require_non_empty("name", &req.name)?;

    let config = req.config.unwrap_or_else(|| serde_json::json!({}));
    require_object("config", &config)?;
    let credentials_enc = seal_credentials(&state, req.credentials.as_ref())?;

    let used = db::channels::count(&state.pool, scope.tenant_id).await?;
    ensure_within_limit(&state, scope.tenant_id, "channels", used, |p| p.max_channels).await?;

    let channel = db::channels::create(
        &state.pool,
        scope.tenant_id,
        &req.kind,
        req.name.trim(),
        &config,
        credentials_enc.as_deref(),
        req.is_active.unwrap_or(true),
    )
    .await?;

    audit::record(&state.pool, &scope, "channel.created", "channel", Some(channel.id)).await;

    Ok(ApiResponse::created(to_view(&state, channel)))
}

pub async fn get(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ChannelView> {
    let channel = db::channels::find_by_id(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;
    Ok(ApiResponse::ok(to_view(&state, channel)))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChannel>,
) -> ApiResult<ChannelView> {
    scope.require_manager()?;
    if let Some(ref name) = req.name {
        require_non_empty("name", name)?;
    }
    if let Some(ref config) = req.config {
        require_object("config", config)?;
    }
    let credentials_enc = seal_credentials(&state, req.credentials.as_ref())?;

    let channel = db::channels::update(
        &state.pool,
        id,
        scope.tenant_id,
        req.name.as_deref().map(str::trim),
        req.config.as_ref(),
        credentials_enc.as_deref(),
        req.is_active,
    )
    .await
    .map_err(|e| AppError::not_found_on_missing_row(e, "Channel not found"))?;

    audit::record(&state.pool, &scope, "channel.updated", "channel", Some(channel.id)).await;

    Ok(ApiResponse::ok(to_view(&state, channel)))
}

pub async fn delete(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    scope.require_manager()?;
    if !db::channels::delete(&state.pool, id, scope.tenant_id).await? {
        return Err(AppError::NotFound("Channel not found".to_string()));
    }

    audit::record(&state.pool, &scope, "channel.deleted", "channel", Some(id)).await;

    Ok(ApiResponse::ok(Deleted::new(id)))
}
