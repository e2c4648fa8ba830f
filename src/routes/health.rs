use axum::extract::State;
use serde::Serialize;

use crate::error::AppError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn live() -> ApiResponse<Health> {
    ApiResponse::ok(Health { status: "ok" })
}

pub async fn ready(State(state): State<SharedState>) -> ApiResult<Health> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::warn!("Readiness check failed: {e}");
            AppError::ServiceUnavailable("Database unavailable".to_string())
        })?;
    Ok(ApiResponse::ok(Health { status: "ok" }))
}
