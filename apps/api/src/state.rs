use std::sync::Arc;

use crate::applications::repository::ApplicationRepository;
use crate::auth::identity::IdentityResolver;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub applications: ApplicationRepository,
    /// Resolves bearer tokens to the calling user. Redis-backed in production.
    pub identity: Arc<dyn IdentityResolver>,
    pub config: Config,
}
