pub mod analytics;
pub mod audit;
pub mod billing;
pub mod channels;
pub mod conversations;
pub mod documents;
pub mod mcp_servers;
pub mod messages;
pub mod refresh_tokens;
pub mod tenants;
pub mod users;
pub mod webhook_deliveries;
pub mod webhooks;
pub mod widget;
