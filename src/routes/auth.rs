use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{self, Claims};
use crate::auth::{password, tokens, AuthUser};
use crate::db;
use crate::db::audit::NewAuditEvent;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Tenant, User};
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;

const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Serialize)]
pub struct Me {
    pub user: User,
    pub tenant: Tenant,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(jwt::ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/api/auth")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/api/auth")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

/// Mint an access token and a fresh refresh token for `user`.
async fn issue_session(
    state: &SharedState,
    user: User,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    let claims = Claims::new(user.id, user.tenant_id, user.role.clone());
    let access_token =
        jwt::encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh_token = tokens::generate();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &tokens::hash(&refresh_token),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    let jar = auth_cookies(&access_token, &refresh_token);
    Ok((
        jar,
        ApiResponse::ok(AuthResponse {
            access_token,
            refresh_token,
            expires_in: jwt::ACCESS_TOKEN_MINUTES * 60,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    if state.login_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, &req.email).await? else {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&req.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let tenant = db::tenants::find_by_id(&state.pool, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;
    if !tenant.is_active() {
        return Err(AppError::Forbidden("Tenant is suspended".to_string()));
    }

    state.login_limiter.clear(&req.email);

    audit::log_event(
        &state.pool,
        NewAuditEvent {
            tenant_id: user.tenant_id,
            user_id: Some(user.id),
            action: "user.login",
            resource_type: "user",
            resource_id: Some(user.id),
            details: None,
        },
    )
    .await;

    issue_session(&state, user).await
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &tokens::hash(&refresh_value))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    if stored.used || !db::refresh_tokens::mark_used(&state.pool, stored.id).await? {
        tracing::warn!(
            user_id = %stored.user_id,
            "Refresh token reuse detected, revoking all sessions"
        );
        db::refresh_tokens::delete_all_for_user(&state.pool, stored.user_id).await?;
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let tenant = db::tenants::find_by_id(&state.pool, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;
    if !tenant.is_active() {
        return Err(AppError::Forbidden("Tenant is suspended".to_string()));
    }

    issue_session(&state, user).await
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::delete_by_hash(&state.pool, &tokens::hash(cookie.value())).await?;
    }

    Ok((
        clear_auth_cookies(),
        ApiResponse::ok(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub async fn me(auth: AuthUser, State(state): State<SharedState>) -> ApiResult<Me> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    let tenant = db::tenants::find_by_id(&state.pool, user.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;
    Ok(ApiResponse::ok(Me { user, tenant }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, ApiResponse<AuthResponse>), AppError> {
    password::validate(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;
    db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;

    audit::log_event(
        &state.pool,
        NewAuditEvent {
            tenant_id: user.tenant_id,
            user_id: Some(user.id),
            action: "user.password_changed",
            resource_type: "user",
            resource_id: Some(user.id),
            details: None,
        },
    )
    .await;

    issue_session(&state, user).await
}
