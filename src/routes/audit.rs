use axum::extract::{Query, State};
use serde::Deserialize;

use crate::auth::TenantScope;
use crate::db;
use crate::models::AuditEvent;
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;
use crate::validation::page;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub resource_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    scope: TenantScope,
    State(state): State<SharedState>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Vec<AuditEvent>> {
    scope.require_manager()?;
    let (limit, offset) = page(query.limit, query.offset, 50, 200);
    let events = db::audit::list(
        &state.pool,
        scope.tenant_id,
        query.resource_type.as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(ApiResponse::ok(events))
}
