use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::{jwt, tokens};
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// A dashboard user authenticated by a JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_manager(&self) -> bool {
        self.role == "owner" || self.role == "admin"
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get("access_token")
                .map(|c| c.value().to_string())
        });

        let token =
            token.ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = jwt::decode_token(&token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            tenant_id: claims.tid,
            role: claims.role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
    Ok(value.strip_prefix("Bearer ").map(|t| t.trim().to_string()))
}

/// Whoever is calling: the platform operator (admin key) or a tenant user.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin,
    User(AuthUser),
}

impl Principal {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self {
            Principal::Admin => Ok(()),
            Principal::User(_) => Err(AppError::Forbidden("Admin access required".to_string())),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::Admin => None,
            Principal::User(user) => Some(user.user_id),
        }
    }
}

impl FromRequestParts<SharedState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(key) = parts.headers.get(ADMIN_KEY_HEADER) {
            let key = key
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid admin key".to_string()))?;
            if !tokens::constant_time_eq(key, &state.config.admin_api_key) {
                tracing::warn!("Rejected request with invalid admin key");
                return Err(AppError::Unauthorized("Invalid admin key".to_string()));
            }
            return Ok(Principal::Admin);
        }

        AuthUser::from_request_parts(parts, state)
            .await
            .map(Principal::User)
    }
}

/// The tenant a request operates on. Users are pinned to their own tenant;
/// the admin key picks one with `X-Tenant-Id`.
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub tenant_id: Uuid,
    pub principal: Principal,
}

impl TenantScope {
    pub fn user_id(&self) -> Option<Uuid> {
        self.principal.user_id()
    }

    /// Owners, tenant admins and the platform admin may change tenant
    /// configuration.
    pub fn require_manager(&self) -> Result<(), AppError> {
        match &self.principal {
            Principal::Admin => Ok(()),
            Principal::User(user) if user.is_manager() => Ok(()),
            Principal::User(_) => Err(AppError::Forbidden(
                "Owner or admin role required".to_string(),
            )),
        }
    }
}

impl FromRequestParts<SharedState> for TenantScope {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;

        let tenant_id = match &principal {
            Principal::Admin => parts
                .headers
                .get(TENANT_ID_HEADER)
                .ok_or_else(|| {
                    AppError::BadRequest("X-Tenant-Id header is required".to_string())
                })?
                .to_str()
                .ok()
                .and_then(|v| Uuid::parse_str(v.trim()).ok())
                .ok_or_else(|| AppError::BadRequest("Invalid X-Tenant-Id header".to_string()))?,
            Principal::User(user) => user.tenant_id,
        };

        let tenant = db::tenants::find_by_id(&state.pool, tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;

        if matches!(principal, Principal::User(_)) && !tenant.is_active() {
            return Err(AppError::Forbidden("Tenant is suspended".to_string()));
        }

        Ok(TenantScope {
            tenant_id,
            principal,
        })
    }
}
