use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Invoice, Plan, Subscription};

pub async fn list_plans(pool: &PgPool) -> Result<Vec<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans ORDER BY price_cents ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_plan_by_code<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    code: &str,
) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE code = $1")
        .bind(code)
        .fetch_optional(executor)
        .await
}

/// The plan a tenant is currently on. Tenants without a subscription row are
/// treated as being on the free plan.
pub async fn plan_for_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Plan, sqlx::Error> {
    sqlx::query_as::<_, Plan>(
        "SELECT p.* FROM plans p
         WHERE p.id = COALESCE(
            (SELECT plan_id FROM subscriptions WHERE tenant_id = $1),
            (SELECT id FROM plans WHERE code = 'free')
         )",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
}

pub async fn find_subscription(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

/// Start (or restart) the tenant's subscription on `plan_id`.
pub async fn upsert_subscription<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    tenant_id: Uuid,
    plan_id: Uuid,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscriptions (tenant_id, plan_id, current_period_start, current_period_end)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (tenant_id) DO UPDATE SET
            plan_id = EXCLUDED.plan_id,
            status = 'active',
            current_period_start = EXCLUDED.current_period_start,
            current_period_end = EXCLUDED.current_period_end,
            cancel_at_period_end = false,
            updated_at = now()
         RETURNING *",
    )
    .bind(tenant_id)
    .bind(plan_id)
    .bind(period_start)
    .bind(period_end)
    .fetch_one(executor)
    .await
}

pub async fn cancel_subscription(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions SET cancel_at_period_end = true, updated_at = now()
         WHERE tenant_id = $1 RETURNING *",
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_invoice<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    subscription: &Subscription,
    plan: &Plan,
) -> Result<Invoice, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "INSERT INTO invoices (tenant_id, subscription_id, amount_cents, currency, period_start, period_end)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(subscription.tenant_id)
    .bind(subscription.id)
    .bind(plan.price_cents)
    .bind(&plan.currency)
    .bind(subscription.current_period_start)
    .bind(subscription.current_period_end)
    .fetch_one(executor)
    .await
}

pub async fn list_invoices(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE tenant_id = $1 ORDER BY issued_at DESC",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn find_invoice(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 AND tenant_id = $2")
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

/// Returns `None` when the invoice is not open anymore.
pub async fn mark_invoice_paid(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET status = 'paid', paid_at = now()
         WHERE id = $1 AND tenant_id = $2 AND status = 'open' RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}
