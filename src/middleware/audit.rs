use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::TenantScope;
use crate::db::audit::NewAuditEvent;

/// Record a mutation. Called explicitly by handlers; a failed insert is
/// logged and never fails the request.
pub async fn record(
    pool: &PgPool,
    scope: &TenantScope,
    action: &str,
    resource_type: &str,
    resource_id: Option<Uuid>,
) {
    log_event(
        pool,
        NewAuditEvent {
            tenant_id: scope.tenant_id,
            user_id: scope.user_id(),
            action,
            resource_type,
            resource_id,
            details: None,
        },
    )
    .await;
}

pub async fn log_event(pool: &PgPool, event: NewAuditEvent<'_>) {
    if let Err(e) = crate::db::audit::insert(pool, &event).await {
        tracing::error!(action = event.action, "Failed to log audit event: {e}");
    }
}
