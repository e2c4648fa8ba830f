use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Principal, TenantScope};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{Invoice, Plan, Subscription};
use crate::response::{ApiResponse, ApiResult};
use crate::state::SharedState;
use crate::validation::require_non_empty;

#[derive(Deserialize)]
pub struct ChangePlan {
    pub plan_code: String,
}

#[derive(Serialize)]
pub struct SubscriptionView {
    pub subscription: Option<Subscription>,
    pub plan: Plan,
}

#[derive(Serialize)]
pub struct PlanChange {
    pub subscription: Subscription,
    pub plan: Plan,
    pub invoice: Option<Invoice>,
}

#[derive(Serialize)]
pub struct Meter {
    pub used: i64,
    pub limit: i32,
}

#[derive(Serialize)]
pub struct Usage {
    pub plan: String,
    pub channels: Meter,
    pub documents: Meter,
    pub monthly_messages: Meter,
}

/// Refuse to create another `resource` once the tenant's plan limit is hit.
pub async fn ensure_within_limit(
    state: &SharedState,
    tenant_id: Uuid,
    resource: &str,
    used: i64,
    limit: impl Fn(&Plan) -> i32,
) -> Result<(), AppError> {
    let plan = db::billing::plan_for_tenant(&state.pool, tenant_id).await?;
    let max = limit(&plan);
    if used >= i64::from(max) {
        tracing::info!(%tenant_id, resource, used, max, plan = %plan.code, "Plan limit reached");
        return Err(AppError::Forbidden(format!(
            "Plan limit reached: the {} plan allows {max} {resource}",
            plan.name
        )));
    }
    Ok(())
}

pub async fn list_plans(_principal: Principal, State(state): State<SharedState>) -> ApiResult<Vec<Plan>> {
    let plans = db::billing::list_plans(&state.pool).await?;
    Ok(ApiResponse::ok(plans))
}

pub async fn get_subscription(
    scope: TenantScope,
    State(state): State<SharedState>,
) -> ApiResult<SubscriptionView> {
    let subscription = db::billing::find_subscription(&state.pool, scope.tenant_id).await?;
    let plan = db::billing::plan_for_tenant(&state.pool, scope.tenant_id).await?;
    Ok(ApiResponse::ok(SubscriptionView { subscription, plan }))
}

/// Move the tenant to another plan. The billing period restarts and paid
/// plans get an open invoice for it.
pub async fn change_subscription(
    scope: TenantScope,
    State(state): State<SharedState>,
    Json(req): Json<ChangePlan>,
) -> ApiResult<PlanChange> {
    scope.require_manager()?;
    require_non_empty("plan_code", &req.plan_code)?;

    let mut tx = state.pool.begin().await?;

    let plan = db::billing::find_plan_by_code(&mut *tx, req.plan_code.trim())
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Unknown plan: {}", req.plan_code)))?;

    let now = Utc::now();
    let subscription = db::billing::upsert_subscription(
        &mut *tx,
        scope.tenant_id,
        plan.id,
        now,
        now + Duration::days(plan.period_days()),
    )
    .await?;

    let invoice = if plan.price_cents > 0 {
        Some(db::billing::create_invoice(&mut *tx, &subscription, &plan).await?)
    } else {
        None
    };

    tx.commit().await?;

    tracing::info!(tenant_id = %scope.tenant_id, plan = %plan.code, "Subscription changed");
    audit::record(&state.pool, &scope, "subscription.changed", "subscription", Some(subscription.id)).await;

    Ok(ApiResponse::ok(PlanChange {
        subscription,
        plan,
        invoice,
    }))
}

pub async fn cancel_subscription(
    scope: TenantScope,
    State(state): State<SharedState>,
) -> ApiResult<Subscription> {
    scope.require_manager()?;
    let subscription = db::billing::cancel_subscription(&state.pool, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    audit::record(&state.pool, &scope, "subscription.canceled", "subscription", Some(subscription.id)).await;

    Ok(ApiResponse::ok(subscription))
}

pub async fn list_invoices(
    scope: TenantScope,
    State(state): State<SharedState>,
) -> ApiResult<Vec<Invoice>> {
    let invoices = db::billing::list_invoices(&state.pool, scope.tenant_id).await?;
    Ok(ApiResponse::ok(invoices))
}

pub async fn pay_invoice(
    scope: TenantScope,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Invoice> {
    scope.require_manager()?;

    let invoice = db::billing::find_invoice(&state.pool, id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;

    let paid = db::billing::mark_invoice_paid(&state.pool, invoice.id, scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Invoice is {}", invoice.status)))?;

    audit::record(&state.pool, &scope, "invoice.paid", "invoice", Some(paid.id)).await;

    Ok(ApiResponse::ok(paid))
}

pub async fn usage(scope: TenantScope, State(state): State<SharedState>) -> ApiResult<Usage> {
    let plan = db::billing::plan_for_tenant(&state.pool, scope.tenant_id).await?;
    let channels = db::channels::count(&state.pool, scope.tenant_id).await?;
    let documents = db::documents::count(&state.pool, scope.tenant_id).await?;
    let messages = db::messages::count_this_month(&state.pool, scope.tenant_id).await?;

    Ok(ApiResponse::ok(Usage {
        channels: Meter {
            used: channels,
            limit: plan.max_channels,
        },
        documents: Meter {
            used: documents,
            limit: plan.max_documents,
        },
        monthly_messages: Meter {
            used: messages,
            limit: plan.max_monthly_messages,
        },
        plan: plan.code,
    }))
}
