pub mod analytics;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod channels;
pub mod conversations;
pub mod documents;
pub mod health;
pub mod mcp_servers;
pub mod tenants;
pub mod webhooks;
pub mod widget;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/change-password", post(auth::change_password))
        // Tenants
        .route("/api/tenants", get(tenants::list).post(tenants::create))
        .route(
            "/api/tenants/{id}",
            get(tenants::get)
                .patch(tenants::update)
                .delete(tenants::delete),
        )
        .route(
            "/api/tenants/{id}/users",
            get(tenants::list_users).post(tenants::create_user),
        )
        // Channels
        .route("/api/channels", get(channels::list).post(channels::create))
        .route(
            "/api/channels/{id}",
            get(channels::get)
                .patch(channels::update)
                .delete(channels::delete),
        )
        // Documents
        .route("/api/documents", get(documents::list).post(documents::create))
        .route(
            "/api/documents/{id}",
            get(documents::get)
                .patch(documents::update)
                .delete(documents::delete),
        )
        .route("/api/documents/{id}/reprocess", post(documents::reprocess))
        // Conversations
        .route(
            "/api/conversations",
            get(conversations::list).post(conversations::create),
        )
        .route(
            "/api/conversations/{id}",
            get(conversations::get)
                .patch(conversations::update)
                .delete(conversations::delete),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(conversations::list_messages).post(conversations::post_message),
        )
        // Webhooks
        .route("/api/webhooks", get(webhooks::list).post(webhooks::create))
        .route(
            "/api/webhooks/{id}",
            get(webhooks::get)
                .patch(webhooks::update)
                .delete(webhooks::delete),
        )
        .route("/api/webhooks/{id}/test", post(webhooks::test))
        .route("/api/webhooks/{id}/deliveries", get(webhooks::deliveries))
        // MCP servers
        .route(
            "/api/mcp-servers",
            get(mcp_servers::list).post(mcp_servers::create),
        )
        .route(
            "/api/mcp-servers/{id}",
            get(mcp_servers::get)
                .patch(mcp_servers::update)
                .delete(mcp_servers::delete),
        )
        // Billing
        .route("/api/billing/plans", get(billing::list_plans))
        .route(
            "/api/billing/subscription",
            get(billing::get_subscription).post(billing::change_subscription),
        )
        .route(
            "/api/billing/subscription/cancel",
            post(billing::cancel_subscription),
        )
        .route("/api/billing/invoices", get(billing::list_invoices))
        .route("/api/billing/invoices/{id}/pay", post(billing::pay_invoice))
        .route("/api/billing/usage", get(billing::usage))
        // Analytics
        .route("/api/analytics/overview", get(analytics::overview))
        .route("/api/analytics/conversations", get(analytics::conversations))
        // Widget
        .route("/api/widget", get(widget::get).put(widget::update))
        .route("/api/public/widget/{slug}", get(widget::public))
        // Audit
        .route("/api/audit-events", get(audit::list))
}

pub fn health_routes() -> Router<SharedState> {
    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
}
