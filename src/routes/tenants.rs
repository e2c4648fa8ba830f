use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{password, Principal};
use crate::db;
use crate::db::audit::NewAuditEvent;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Tenant, User};
use crate::response::{ApiResponse, ApiResult, Deleted};
use crate::state::SharedState;
use crate::validation::{one_of, require_non_empty, require_object, slugify, validate_slug};

pub const TENANT_STATUSES: &[&str] = &["active", "suspended"];
pub const USER_ROLES: &[&str] = &["owner", "admin", "member"];

#[derive(Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub owner: Option<CreateUser>,
}

#[derive(Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedTenant {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub owner: Option<User>,
}

fn validate_user(req: &CreateUser) -> Result<&str, AppError> {
    require_non_empty("email", &req.email)?;
    require_non_empty("name", &req.name)?;
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".to_string()));
    }
    password::validate(&req.password)?;
    let role = req.role.as_deref().unwrap_or("member");
    one_of("role", role, USER_ROLES)?;
    Ok(role)
}

pub async fn list(principal: Principal, State(state): State<SharedState>) -> ApiResult<Vec<Tenant>> {
    principal.require_admin()?;
    let tenants = db::tenants::list(&state.pool).await?;
    Ok(ApiResponse::ok(tenants))
}

/// Create a tenant with its free-plan subscription, default widget and,
/// optionally, its first owner.
pub async fn create(
    principal: Principal,
    State(state): State<SharedState>,
    Json(req): Json<CreateTenant>,
) -> ApiResult<CreatedTenant> {
    principal.require_admin()?;
    require_non_empty("name", &req.name)?;

    let slug = req.slug.clone().unwrap_or_else(|| slugify(&req.name));
    validate_slug(&slug)?;

    let settings = req.settings.unwrap_or_else(|| serde_json::json!({}));
    require_object("settings", &settings)?;

    let owner_hash = match &req.owner {
        Some(owner) => {
            validate_user(owner)?;
            Some(password::hash(&owner.password).map_err(AppError::Internal)?)
        }
        None => None,
    };

    let mut tx = state.pool.begin().await?;

    let tenant = db::tenants::create(&mut *tx, req.name.trim(), &slug, &settings)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "A tenant with this slug already exists"))?;

    let free = db::billing::find_plan_by_code(&mut *tx, "free")
        .await?
        .ok_or_else(|| AppError::Internal("Free plan is missing".to_string()))?;
    let now = Utc::now();
    db::billing::upsert_subscription(
        &mut *tx,
        tenant.id,
        free.id,
        now,
        now + Duration::days(free.period_days()),
    )
    .await?;

    db::widget::create_default(&mut *tx, tenant.id).await?;

    let owner = match (&req.owner, owner_hash) {
        (Some(owner), Some(hash)) => Some(
            db::users::create(
                &mut *tx,
                tenant.id,
                owner.email.trim(),
                &hash,
                owner.name.trim(),
                "owner",
            )
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "A user with this email already exists"))?,
        ),
        _ => None,
    };

    tx.commit().await?;

    tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
    audit::log_event(
        &state.pool,
        NewAuditEvent {
            tenant_id: tenant.id,
            user_id: None,
            action: "tenant.created",
            resource_type: "tenant",
            resource_id: Some(tenant.id),
            details: None,
        },
    )
    .await;

    Ok(ApiResponse::created(CreatedTenant { tenant, owner }))
}

pub async fn get(
    principal: Principal,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Tenant> {
    principal.require_admin()?;
    let tenant = db::tenants::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;
    Ok(ApiResponse::ok(tenant))
}

pub async fn update(
    principal: Principal,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTenant>,
) -> ApiResult<Tenant> {
    principal.require_admin()?;

    if let Some(ref name) = req.name {
        require_non_empty("name", name)?;
    }
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    if let Some(ref status) = req.status {
        one_of("status", status, TENANT_STATUSES)?;
    }
    if let Some(ref settings) = req.settings {
        require_object("settings", settings)?;
    }

    let tenant = db::tenants::update(
        &state.pool,
        id,
        req.name.as_deref().map(str::trim),
        req.slug.as_deref(),
        req.status.as_deref(),
        req.settings.as_ref(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("Tenant not found".to_string()),
        e => AppError::conflict_on_unique(e, "A tenant with this slug already exists"),
    })?;

    audit::log_event(
        &state.pool,
        NewAuditEvent {
            tenant_id: tenant.id,
            user_id: None,
            action: "tenant.updated",
            resource_type: "tenant",
            resource_id: Some(tenant.id),
            details: req.status.as_ref().map(|s| serde_json::json!({ "status": s })),
        },
    )
    .await;

    Ok(ApiResponse::ok(tenant))
}

pub async fn delete(
    principal: Principal,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    principal.require_admin()?;

    if !db::tenants::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Tenant not found".to_string()));
    }

    tracing::info!(tenant_id = %id, "Tenant deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}

pub async fn list_users(
    principal: Principal,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<User>> {
    let tenant = db::tenants::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;
    authorize_tenant_users(&principal, &tenant)?;
    let users = db::users::list_by_tenant(&state.pool, id).await?;
    Ok(ApiResponse::ok(users))
}

pub async fn create_user(
    principal: Principal,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateUser>,
) -> ApiResult<User> {
    let tenant = db::tenants::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tenant not found".to_string()))?;
    authorize_tenant_users(&principal, &tenant)?;

    let role = validate_user(&req)?;
    let creator_is_owner = match &principal {
        Principal::Admin => true,
        Principal::User(user) => user.role == "owner",
    };
    if role == "owner" && !creator_is_owner {
        return Err(AppError::Forbidden(
            "Only an owner can create owner users".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let user = db::users::create(
        &state.pool,
        id,
        req.email.trim(),
        &pw_hash,
        req.name.trim(),
        role,
    )
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "A user with this email already exists"))?;

    audit::log_event(
        &state.pool,
        NewAuditEvent {
            tenant_id: id,
            user_id: principal.user_id(),
            action: "user.created",
            resource_type: "user",
            resource_id: Some(user.id),
            details: None,
        },
    )
    .await;

    Ok(ApiResponse::created(user))
}

/// The platform admin manages any tenant's users; owners and tenant admins
/// manage their own while the tenant is active.
fn authorize_tenant_users(principal: &Principal, tenant: &Tenant) -> Result<(), AppError> {
    let user = match principal {
        Principal::Admin => return Ok(()),
        Principal::User(user) if user.tenant_id == tenant.id => user,
        Principal::User(_) => return Err(AppError::NotFound("Tenant not found".to_string())),
    };
    if !tenant.is_active() {
        return Err(AppError::Forbidden("Tenant is suspended".to_string()));
    }
    if !user.is_manager() {
        return Err(AppError::Forbidden(
            "Owner or admin role required".to_string(),
        ));
    }
    Ok(())
}
