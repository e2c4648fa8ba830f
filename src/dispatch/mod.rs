pub mod signature;

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{Webhook, WebhookDelivery};

pub const CONVERSATION_CREATED: &str = "conversation.created";
pub const CONVERSATION_UPDATED: &str = "conversation.updated";
pub const MESSAGE_CREATED: &str = "message.created";
pub const DOCUMENT_CREATED: &str = "document.created";
pub const DOCUMENT_UPDATED: &str = "document.updated";
pub const WEBHOOK_TEST: &str = "webhook.test";

/// Events a webhook may subscribe to. `*` subscribes to all of them.
pub const SUBSCRIBABLE_EVENTS: &[&str] = &[
    CONVERSATION_CREATED,
    CONVERSATION_UPDATED,
    MESSAGE_CREATED,
    DOCUMENT_CREATED,
    DOCUMENT_UPDATED,
];

const MAX_ERROR_LEN: usize = 512;

#[derive(Debug, Serialize)]
pub struct EventPayload<'a> {
    pub id: Uuid,
    pub event: &'a str,
    pub tenant_id: Uuid,
    pub created_at: chrono::DateTime<Utc>,
    pub data: &'a serde_json::Value,
}

/// Sends signed event notifications to tenant webhooks. Each delivery is a
/// single attempt whose outcome is stored in `webhook_deliveries`.
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(timeout_secs: u64) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("chatplane-webhooks/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build webhook client: {e}"))?;
        Ok(Self { client })
    }

    /// Fan `event` out to every subscribed webhook of the tenant in the
    /// background. The caller does not wait for deliveries.
    pub fn emit(&self, pool: &PgPool, tenant_id: Uuid, event: &'static str, data: serde_json::Value) {
        let dispatcher = self.clone();
        let pool = pool.clone();

        tokio::spawn(async move {
            let hooks = match db::webhooks::list_subscribed(&pool, tenant_id, event).await {
                Ok(hooks) => hooks,
                Err(e) => {
                    tracing::error!(%tenant_id, event, "Failed to load webhooks: {e}");
                    return;
                }
            };

            for hook in hooks {
                if let Err(e) = dispatcher.deliver(&pool, &hook, event, &data).await {
                    tracing::error!(webhook_id = %hook.id, event, "Failed to record delivery: {e}");
                }
            }
        });
    }

    /// POST one event to one webhook and record the outcome.
    pub async fn deliver(
        &self,
        pool: &PgPool,
        hook: &Webhook,
        event: &str,
        data: &serde_json::Value,
    ) -> Result<WebhookDelivery, sqlx::Error> {
        let payload = EventPayload {
            id: Uuid::now_v7(),
            event,
            tenant_id: hook.tenant_id,
            created_at: Utc::now(),
            data,
        };

        let (status, response_status, error) = match serde_json::to_vec(&payload) {
            Ok(body) => self.send(hook, event, body).await,
            Err(e) => ("failed", None, Some(format!("Failed to serialize payload: {e}"))),
        };

        if let Some(ref e) = error {
            tracing::warn!(webhook_id = %hook.id, event, "Webhook delivery failed: {e}");
        } else {
            tracing::debug!(webhook_id = %hook.id, event, "Webhook delivered");
        }

        db::webhook_deliveries::create(pool, hook.id, event, status, response_status, error.as_deref())
            .await
    }

    async fn send(
        &self,
        hook: &Webhook,
        event: &str,
        body: Vec<u8>,
    ) -> (&'static str, Option<i32>, Option<String>) {
        let Some(signature) = signature::sign(&hook.secret, &body) else {
            return ("failed", None, Some("Failed to sign payload".to_string()));
        };

        let result = self
            .client
            .post(&hook.url)
            .header("content-type", "application/json")
            .header(signature::EVENT_HEADER, event)
            .header(signature::SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                ("success", Some(i32::from(resp.status().as_u16())), None)
            }
            Ok(resp) => {
                let code = resp.status().as_u16();
                let text = resp.text().await.unwrap_or_default();
                (
                    "failed",
                    Some(i32::from(code)),
                    Some(truncate(&format!("HTTP {code}: {text}"))),
                )
            }
            Err(e) => ("failed", None, Some(truncate(&format!("Request failed: {e}")))),
        }
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_ERROR_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_errors() {
        let long = "x".repeat(2000);
        assert_eq!(truncate(&long).len(), MAX_ERROR_LEN);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_event_is_not_subscribable() {
        assert!(!SUBSCRIBABLE_EVENTS.contains(&WEBHOOK_TEST));
    }
}
