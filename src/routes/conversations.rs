use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::db;
use crate::db::conversations::ConversationFilter;
use crate::dispatch;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Conversation, Message};
use crate::response::{ApiResponse, ApiResult, Deleted, Page};
use crate::routes::billing::ensure_within_limit;
use crate::state::SharedState;
use crate::validation::{one_of, page, require_non_empty, require_object};

pub const CONVERSATION_STATUSES: &[&str] = &["open", "handoff", "closed"];
pub const MESSAGE_ROLES: &[&str] = &["user", "assistant", "agent", "system"];

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub channel_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateConversation {
    pub channel_id: Option<Uuid>,
    pub external_user_id: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdateConversation {
    pub status: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct PostMessage {
    pub role: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

fn emit<T: Serialize>(state: &SharedState, tenant_id: Uuid, event: &'static str, record: &T) {
    match serde_json::to_value(record) {
        Ok(data) => state.dispatcher.emit(&state.pool, tenant_id, event, data),
        Err(e) => tracing::error!(event, "Failed to serialize event: {e}"),
    }
}

async fn find(state: &SharedState, scope: &TenantScope, id: Uuid) -> Result<Conversation, AppError> {
    db::conversations::find_by_id(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))
}

pub async fn list(
    scope: TenantScope,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Conversation>> {
    if let Some(ref status) = query.status {
        one_of("status", status, CONVERSATION_STATUSES)?;
    }
    let (limit, offset) = page(query.limit, query.offset, 50, 100);
    let filter = ConversationFilter {
        status: query.status,
        channel_id: query.channel_id,
    };

    let items = db::conversations::list(&state.pool, scope.tenant_id, &filter, limit, offset).await?;
    let total = db::conversations::count(&state.pool, scope.tenant_id, &filter).await?;

    Ok(ApiResponse::ok(Page {
        items,
        total,
        limit,
        offset,
    }))
}

pub async fn create(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<CreateConversation>,
) -> ApiResult<Conversation> {
    require_non_empty("external_user_id", &req.external_user_id)?;
    let metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));
    require_object("metadata", &metadata)?;

    if let Some(channel_id) = req.channel_id {
        db::channels::find_by_id(&state.pool, channel_id, scope.tenant_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("channel_id does not exist".to_string()))?;
    }

    let conversation = db::conversations::create(
        &state.pool,
        scope.tenant_id,
        req.channel_id,
        req.external_user_id.trim(),
        &metadata,
    )
    .await?;

    audit::record(&state.pool, &scope, "conversation.created", "conversation", Some(conversation.id)).await;
    emit(&state, scope.tenant_id, dispatch::CONVERSATION_CREATED, &conversation);

    Ok(ApiResponse::created(conversation))
}

pub async fn get(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ConversationDetail> {
    let conversation = find(&state, &scope, id).await?;
    let messages = db::messages::list_by_conversation(&state.pool, conversation.id).await?;
    Ok(ApiResponse::ok(ConversationDetail {
        conversation,
        messages,
    }))
}

pub async fn update(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateConversation>,
) -> ApiResult<Conversation> {
    if let Some(ref status) = req.status {
        one_of("status", status, CONVERSATION_STATUSES)?;
    }
    if let Some(ref metadata) = req.metadata {
        require_object("metadata", metadata)?;
    }

    let conversation = db::conversations::update(
        &state.pool,
        id,
        scope.tenant_id,
        req.status.as_deref(),
        req.metadata.as_ref(),
    )
    .await
    .map_err(|e| AppError::not_found_on_missing_row(e, "Conversation not found"))?;

    audit::record(&state.pool, &scope, "conversation.updated", "conversation", Some(conversation.id)).await;
    emit(&state, scope.tenant_id, dispatch::CONVERSATION_UPDATED, &conversation);

    Ok(ApiResponse::ok(conversation))
}

pub async fn delete(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !db::conversations::delete(&state.pool, id, scope.tenant_id).await? {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }

    audit::record(&state.pool, &scope, "conversation.deleted", "conversation", Some(id)).await;

    Ok(ApiResponse::ok(Deleted::new(id)))
}

pub async fn list_messages(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Message>> {
    let conversation = find(&state, &scope, id).await?;
    let messages = db::messages::list_by_conversation(&state.pool, conversation.id).await?;
    Ok(ApiResponse::ok(messages))
}

/// Append a message. An agent reply hands an open conversation over to a
/// human; the message counts toward the tenant's monthly quota.
pub async fn post_message(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessage>,
) -> ApiResult<Message> {
    one_of("role", &req.role, MESSAGE_ROLES)?;
    require_non_empty("content", &req.content)?;
    let metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));
    require_object("metadata", &metadata)?;

    let conversation = find(&state, &scope, id).await?;
    if conversation.status == "closed" {
        return Err(AppError::Conflict("Conversation is closed".to_string()));
    }

    let used = db::messages::count_this_month(&state.pool, scope.tenant_id).await?;
    ensure_within_limit(&state, scope.tenant_id, "monthly messages", used, |p| {
        p.max_monthly_messages
    })
    .await?;

    let mut tx = state.pool.begin().await?;
    let message =
        db::messages::create(&mut *tx, conversation.id, &req.role, &req.content, &metadata).await?;
    let touched = db::conversations::touch(&mut *tx, conversation.id, req.role == "agent").await?;
    tx.commit().await?;

    audit::record(&state.pool, &scope, "message.created", "message", Some(message.id)).await;
    emit(&state, scope.tenant_id, dispatch::MESSAGE_CREATED, &message);
    if touched.status != conversation.status {
        tracing::info!(conversation_id = %touched.id, status = %touched.status, "Conversation handed off");
        audit::record(&state.pool, &scope, "conversation.handoff", "conversation", Some(touched.id)).await;
        emit(&state, scope.tenant_id, dispatch::CONVERSATION_UPDATED, &touched);
    }

    Ok(ApiResponse::created(message))
}
