use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::dispatch::WebhookDispatcher;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub dispatcher: WebhookDispatcher,
    pub login_limiter: LoginRateLimiter,
}
