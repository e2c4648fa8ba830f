use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{tokens, TenantScope};
use crate::db;
use crate::dispatch::{self, SUBSCRIBABLE_EVENTS};
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Webhook, WebhookDelivery};
use crate::response::{ApiResponse, ApiResult, Deleted};
use crate::state::SharedState;
use crate::validation::validate_http_url;

const DELIVERY_HISTORY: i64 = 50;

#[derive(Deserialize)]
pub struct CreateWebhook {
    pub url: String,
    pub events: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateWebhook {
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Creation response; the only place the signing secret is revealed.
#[derive(Serialize)]
pub struct CreatedWebhook {
    #[serde(flatten)]
    pub webhook: Webhook,
    pub secret: String,
}

fn validate_events(events: &[String]) -> Result<(), AppError> {
    if events.is_empty() {
        return Err(AppError::BadRequest(
            "events must contain at least one event".to_string(),
        ));
    }
    if let Some(unknown) = events
        .iter()
        .find(|e| e.as_str() != "*" && !SUBSCRIBABLE_EVENTS.contains(&e.as_str()))
    {
        return Err(AppError::BadRequest(format!(
            "Unknown event '{unknown}'. Allowed: *, {}",
            SUBSCRIBABLE_EVENTS.join(", ")
        )));
    }
    Ok(())
}

fn dedup(events: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(events.len());
    for e in events {
        if !out.contains(&e) {
            out.push(e);
        }
    }
    out
}

async fn find(state: &SharedState, scope: &TenantScope, id: Uuid) -> Result<Webhook, AppError> {
    db::webhooks::find_by_id(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Webhook not found".to_string()))
}

pub async fn list(scope: TenantScope, State(state): State<SharedState>) -> ApiResult<Vec<Webhook>> {
    let hooks = db::webhooks::list(&state.pool, scope.tenant_id).await?;
    Ok(ApiResponse::ok(hooks))
}

pub async fn create(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<CreateWebhook>,
) -> ApiResult<CreatedWebhook> {
    scope.require_manager()?;
    validate_http_url("url", &req.url)?;
    validate_events(&req.events)?;

    let secret = tokens::generate();
    let webhook = db::webhooks::create(
        &state.pool,
        scope.tenant_id,
        req.url.trim(),
        &dedup(req.events),
        &secret,
    )
    .await?;

    audit::record(&state.pool, &scope, "webhook.created", "webhook", Some(webhook.id)).await;

    Ok(ApiResponse::created(CreatedWebhook { webhook, secret }))
}

pub async fn get(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Webhook> {
    Ok(ApiResponse::ok(find(&state, &scope, id).await?))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateWebhook>,
) -> ApiResult<Webhook> {
    scope.require_manager()?;
    if let Some(ref url) = req.url {
        validate_http_url("url", url)?;
    }
    if let Some(ref events) = req.events {
        validate_events(events)?;
    }
    let events = req.events.map(dedup);

    let webhook = db::webhooks::update(
        &state.pool,
        id,
        scope.tenant_id,
        req.url.as_deref().map(str::trim),
        events.as_deref(),
        req.is_active,
    )
    .await
    .map_err(|e| AppError::not_found_on_missing_row(e, "Webhook not found"))?;

    audit::record(&state.pool, &scope, "webhook.updated", "webhook", Some(webhook.id)).await;

    Ok(ApiResponse::ok(webhook))
}

pub async fn delete(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    scope.require_manager()?;
    if !db::webhooks::delete(&state.pool, id, scope.tenant_id).await? {
        return Err(AppError::NotFound("Webhook not found".to_string()));
    }

    audit::record(&state.pool, &scope, "webhook.deleted", "webhook", Some(id)).await;

    Ok(ApiResponse::ok(Deleted::new(id)))
}

/// Deliver a `webhook.test` event right away, regardless of the webhook's
/// subscriptions or active flag, and return the recorded delivery.
pub async fn test(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WebhookDelivery> {
    scope.require_manager()?;
    let webhook = find(&state, &scope, id).await?;

    let data = serde_json::json!({
        "webhook_id": webhook.id,
        "message": "This is a test event",
    });
    let delivery = state
        .dispatcher
        .deliver(&state.pool, &webhook, dispatch::WEBHOOK_TEST, &data)
        .await?;

    Ok(ApiResponse::ok(delivery))
}

pub async fn deliveries(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<WebhookDelivery>> {
    let webhook = find(&state, &scope, id).await?;
    let deliveries =
        db::webhook_deliveries::list_by_webhook(&state.pool, webhook.id, DELIVERY_HISTORY).await?;
    Ok(ApiResponse::ok(deliveries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_known_events_and_wildcard() {
        assert!(validate_events(&events(&["message.created", "document.updated"])).is_ok());
        assert!(validate_events(&events(&["*"])).is_ok());
    }

    #[test]
    fn rejects_empty_and_unknown_events() {
        assert!(validate_events(&[]).is_err());
        assert!(validate_events(&events(&["webhook.test"])).is_err());
        assert!(validate_events(&events(&["message.deleted"])).is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        assert_eq!(
            dedup(events(&["a", "b", "a", "c", "b"])),
            events(&["a", "b", "c"])
        );
    }
}
