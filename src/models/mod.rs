mod audit_event;
mod billing;
mod channel;
mod conversation;
mod document;
mod mcp_server;
mod refresh_token;
mod tenant;
mod user;
mod webhook;
mod widget;

pub use audit_event::AuditEvent;
pub use billing::{Invoice, Plan, Subscription};
pub use channel::{Channel, ChannelView};
pub use conversation::{Conversation, Message};
pub use document::Document;
pub use mcp_server::McpServer;
pub use refresh_token::RefreshToken;
pub use tenant::Tenant;
pub use user::User;
pub use webhook::{Webhook, WebhookDelivery};
pub use widget::WidgetConfig;
