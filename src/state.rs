use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::rate_limit::LoginRateLimiter;
use crate::realtime::EventHub;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub events: Arc<dyn EventHub>,
    pub login_limiter: LoginRateLimiter,
}
