pub mod auth;
pub mod config;
pub mod cors;
pub mod crypto;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod response;
pub mod routes;
pub mod state;
pub mod validation;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cors::OriginPolicy;
use crate::dispatch::WebhookDispatcher;
use crate::error::AppError;
use crate::rate_limit::LoginRateLimiter;
use crate::state::{AppState, SharedState};

/// Assemble the API router. CORS sits outermost so that preflights and
/// rejections from untrusted origins never reach a handler.
pub fn build_app(pool: PgPool, config: Config) -> Result<(Router, SharedState), String> {
    let dispatcher = WebhookDispatcher::new(config.webhook_timeout_secs)?;
    let policy = OriginPolicy::new(config.allowed_origins.clone());
    let max_body_size = config.max_body_size;

    tracing::info!(origins = ?policy.origins(), "CORS allowlist loaded");

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        dispatcher,
        login_limiter: LoginRateLimiter::default(),
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::health_routes())
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            policy.clone(),
            cors::reject_untrusted_origin,
        ))
        .layer(policy.layer())
        .layer(TraceLayer::new_for_http());

    Ok((app, state))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
