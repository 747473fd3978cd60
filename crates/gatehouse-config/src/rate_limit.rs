//! Rate limiting configuration.
//!
//! The API admits at most `limit` requests per client address within any
//! trailing window of `window` length (sliding window, not token bucket).
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_REQUESTS`: Requests allowed per window (default: 180)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length in seconds (default: 60)
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_config::RateLimitConfig;
//!
//! let config = RateLimitConfig::from_env();
//! assert_eq!(config.sweep_interval(), config.window / 2);
//! ```

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per client within one window.
    pub limit: usize,

    /// Length of the trailing window.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 180,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window }
    }

    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if variables are unset or unparsable.
    /// A zero-length window is not accepted and falls back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let window_secs: u64 = crate::env_or("RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs());
        Self {
            limit: crate::env_or("RATE_LIMIT_REQUESTS", defaults.limit),
            window: if window_secs == 0 {
                defaults.window
            } else {
                Duration::from_secs(window_secs)
            },
        }
    }

    /// How often stale client entries are swept: every half window.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        (self.window / 2).max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.limit, 180);
        assert_eq!(config.window, Duration::from_secs(60));
    }

    #[test]
    fn test_sweep_interval_is_half_window() {
        let config = RateLimitConfig::new(3, Duration::from_secs(1));
        assert_eq!(config.sweep_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_sweep_interval_never_zero() {
        let config = RateLimitConfig::new(3, Duration::from_nanos(1));
        assert!(config.sweep_interval() > Duration::ZERO);
    }
}
