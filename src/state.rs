use std::sync::Arc;

use gatehouse_auth::TokenCodec;
use gatehouse_config::{CorsConfig, JwtConfig, RateLimitConfig};
use gatehouse_db::{RoleRepository, UserRepository};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::middleware::rate_limit::SlidingWindowLimiter;

/// Shared per-process state. Built once at startup; every field is cheap to
/// clone.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub tokens: Arc<TokenCodec>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub cors_config: CorsConfig,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires a store that serves both users and roles.
    pub fn new<S>(
        store: Arc<S>,
        jwt_config: &JwtConfig,
        rate_limit_config: &RateLimitConfig,
        cors_config: CorsConfig,
    ) -> Self
    where
        S: UserRepository + RoleRepository + 'static,
    {
        Self {
            users: store.clone(),
            roles: store,
            tokens: Arc::new(TokenCodec::new(jwt_config)),
            rate_limiter: Arc::new(SlidingWindowLimiter::new(rate_limit_config)),
            cors_config,
            metrics: None,
        }
    }

    /// Same as [`AppState::new`] with every config read from the environment.
    pub fn from_env<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + RoleRepository + 'static,
    {
        Self::new(
            store,
            &JwtConfig::from_env(),
            &RateLimitConfig::from_env(),
            CorsConfig::from_env(),
        )
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cors_config", &self.cors_config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
