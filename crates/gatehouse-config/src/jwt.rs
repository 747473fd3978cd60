use std::env;

/// Token signing configuration.
///
/// Lifetimes are in seconds. The secret is only ever read after startup.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production-please-32b".to_string(),
            access_token_expiry: 3600,    // 1 hour
            refresh_token_expiry: 604800, // 7 days
            issuer: "gatehouse".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: crate::env_or("JWT_ACCESS_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: crate::env_or(
                "JWT_REFRESH_EXPIRY",
                defaults.refresh_token_expiry,
            ),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

// The secret stays out of logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish()
    }
}
