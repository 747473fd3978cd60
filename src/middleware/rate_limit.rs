//! Sliding-window rate limiting per client address.
//!
//! Each client keeps the timestamps of its admitted requests within the
//! trailing window. A request is admitted while fewer than `limit` remain;
//! rejected requests are not recorded. A background task sweeps idle
//! clients every half window so memory stays bounded.
//!
//! State is per process and lost on restart. Several instances behind a
//! load balancer each enforce their own limit.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse_config::RateLimitConfig;
use gatehouse_core::AppError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tower_governor::key_extractor::{KeyExtractor, PeerIpKeyExtractor};
use tracing::{debug, warn};

use crate::metrics::track_rate_limited;

pub const RATE_LIMIT_MESSAGE: &str = "Too many HTTP requests, please try again later";

pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    sweep_interval: Duration,
    clients: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            limit: config.limit,
            window: config.window,
            sweep_interval: config.sweep_interval(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits or rejects one request from `key` arriving at `now`.
    pub fn admit(&self, key: &str, now: Instant) -> bool {
        let mut clients = self.clients();
        let stamps = clients.entry(key.to_string()).or_default();

        evict_stale(stamps, now, self.window);
        if stamps.len() >= self.limit {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// Evicts stale timestamps and drops clients left with none.
    ///
    /// Returns how many clients were dropped.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut clients = self.clients();
        let before = clients.len();
        clients.retain(|_, stamps| {
            evict_stale(stamps, now, self.window);
            !stamps.is_empty()
        });
        before - clients.len()
    }

    /// Number of clients currently holding window state.
    pub fn tracked_clients(&self) -> usize {
        self.clients().len()
    }

    /// Spawns the periodic sweep on the current runtime.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let dropped = limiter.sweep(Instant::now());
                if dropped > 0 {
                    debug!(dropped, remaining = limiter.tracked_clients(), "Swept idle rate-limit clients");
                }
            }
        })
    }
}

fn evict_stale(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = stamps.front() {
        if now.saturating_duration_since(oldest) > window {
            stamps.pop_front();
        } else {
            break;
        }
    }
}

/// Client address used as the limiter key.
///
/// Only the peer socket address from `ConnectInfo` counts. Forwarding
/// headers are client-controlled and ignored. Requests with no peer
/// address share the `unknown` bucket.
pub fn client_key(req: &Request) -> String {
    PeerIpKeyExtractor
        .extract(req)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<SlidingWindowLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&req);
    if !limiter.admit(&key, Instant::now()) {
        track_rate_limited();
        warn!(client = %key, path = %req.uri().path(), "Rate limit exceeded");
        return Err(AppError::too_many_requests(RATE_LIMIT_MESSAGE));
    }
    Ok(next.run(req).await)
}
