use axum::extract::{Query, State};
use serde::Deserialize;

use crate::auth::TenantScope;
use crate::db;
use crate::db::analytics::{DailyActivity, Overview};
use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;

const DEFAULT_DAYS: i32 = 30;
const MAX_DAYS: i32 = 90;

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub days: Option<i32>,
}

pub async fn overview(scope: TenantScope, State(state): State<SharedState>) -> ApiResult<Overview> {
    let overview = db::analytics::overview(&state.pool, scope.tenant_id).await?;
    Ok(ApiResponse::ok(overview))
}

pub async fn conversations(
    scope: TenantScope,
    State(state): State<SharedState>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Vec<DailyActivity>> {
    let days = query.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days must be between 1 and {MAX_DAYS}"
        )));
    }
    let activity = db::analytics::daily_activity(&state.pool, scope.tenant_id, days).await?;
    Ok(ApiResponse::ok(activity))
}
