use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::TenantScope;
use crate::db;
use crate::db::widget::WidgetChanges;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::WidgetConfig;
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;
use crate::validation::{one_of, require_non_empty, validate_hex_color, validate_http_url};

pub const POSITIONS: &[&str] = &["bottom-right", "bottom-left"];

#[derive(Deserialize)]
pub struct UpdateWidget {
    pub title: Option<String>,
    pub welcome_message: Option<String>,
    pub primary_color: Option<String>,
    pub position: Option<String>,
    pub avatar_url: Option<String>,
}

/// What the embed script needs; nothing tenant-internal.
#[derive(Serialize)]
pub struct PublicWidget {
    pub tenant: String,
    pub title: String,
    pub welcome_message: String,
    pub primary_color: String,
    pub position: String,
    pub avatar_url: Option<String>,
}

pub async fn get(scope: TenantScope, State(state): State<SharedState>) -> ApiResult<WidgetConfig> {
    let widget = match db::widget::find(&state.pool, scope.tenant_id).await? {
        Some(widget) => widget,
        None => db::widget::create_default(&state.pool, scope.tenant_id).await?,
    };
    Ok(ApiResponse::ok(widget))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<UpdateWidget>,
) -> ApiResult<WidgetConfig> {
    scope.require_manager()?;
    if let Some(ref title) = req.title {
        require_non_empty("title", title)?;
    }
    if let Some(ref welcome) = req.welcome_message {
        require_non_empty("welcome_message", welcome)?;
    }
    if let Some(ref color) = req.primary_color {
        validate_hex_color(color)?;
    }
    if let Some(ref position) = req.position {
        one_of("position", position, POSITIONS)?;
    }
    if let Some(ref avatar) = req.avatar_url {
        validate_http_url("avatar_url", avatar)?;
    }

    let changes = WidgetChanges {
        title: req.title.as_deref().map(str::trim),
        welcome_message: req.welcome_message.as_deref(),
        primary_color: req.primary_color.as_deref(),
        position: req.position.as_deref(),
        avatar_url: req.avatar_url.as_deref(),
    };
    let widget = db::widget::upsert(&state.pool, scope.tenant_id, &changes).await?;

    audit::record(&state.pool, &scope, "widget.updated", "widget", Some(scope.tenant_id)).await;

    Ok(ApiResponse::ok(widget))
}

/// Unauthenticated lookup used by the embed script.
pub async fn public(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> ApiResult<PublicWidget> {
    let tenant = db::tenants::find_by_slug(&state.pool, &slug)
        .await?
        .filter(|t| t.is_active())
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    let widget = db::widget::find(&state.pool, tenant.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Widget not found".to_string()))?;

    Ok(ApiResponse::ok(PublicWidget {
        tenant: tenant.slug,
        title: widget.title,
        welcome_message: widget.welcome_message,
        primary_color: widget.primary_color,
        position: widget.position,
        avatar_url: widget.avatar_url,
    }))
}
