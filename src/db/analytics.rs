use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Overview {
    pub conversations: i64,
    pub open_conversations: i64,
    pub messages_last_30_days: i64,
    pub documents: i64,
    pub channels: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyActivity {
    pub day: NaiveDate,
    pub conversations: i64,
    pub messages: i64,
}

pub async fn overview(pool: &PgPool, tenant_id: Uuid) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT
            (SELECT COUNT(*) FROM conversations WHERE tenant_id = $1) AS conversations,
            (SELECT COUNT(*) FROM conversations WHERE tenant_id = $1 AND status <> 'closed')
                AS open_conversations,
            (SELECT COUNT(*) FROM messages m JOIN conversations c ON m.conversation_id = c.id
                WHERE c.tenant_id = $1 AND m.created_at >= now() - interval '30 days')
                AS messages_last_30_days,
            (SELECT COUNT(*) FROM documents WHERE tenant_id = $1) AS documents,
            (SELECT COUNT(*) FROM channels WHERE tenant_id = $1) AS channels",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await
}

/// One row per UTC day for the last `days` days, including days with no
/// activity.
pub async fn daily_activity(
    pool: &PgPool,
    tenant_id: Uuid,
    days: i32,
) -> Result<Vec<DailyActivity>, sqlx::Error> {
    sqlx::query_as::<_, DailyActivity>(
        "WITH series AS (
            SELECT generate_series(
                (now() AT TIME ZONE 'utc')::date - ($2 - 1),
                (now() AT TIME ZONE 'utc')::date,
                interval '1 day'
            )::date AS day
         )
         SELECT
            s.day,
            (SELECT COUNT(*) FROM conversations c
                WHERE c.tenant_id = $1 AND (c.created_at AT TIME ZONE 'utc')::date = s.day)
                AS conversations,
            (SELECT COUNT(*) FROM messages m JOIN conversations c ON m.conversation_id = c.id
                WHERE c.tenant_id = $1 AND (m.created_at AT TIME ZONE 'utc')::date = s.day)
                AS messages
         FROM series s
         ORDER BY s.day ASC",
    )
    .bind(tenant_id)
    .bind(days)
    .fetch_all(pool)
    .await
}
