//! # Gatehouse Config
//!
//! Configuration types for the Gatehouse admin API.
//!
//! All configuration is read once from environment variables at process
//! start and is immutable afterwards. Each struct has a `from_env()`
//! constructor falling back to documented defaults:
//!
//! - [`jwt`]: token signing secret, lifetimes and issuer
//! - [`rate_limit`]: sliding-window request limit per client address
//! - [`cors`]: allowed origins
//! - [`server`]: bind address and database settings
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_config::{JwtConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::{DatabaseConfig, ServerConfig};

/// Reads and parses an environment variable, falling back to `default` when
/// unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
