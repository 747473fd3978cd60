use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::middleware::auth::Identity;

/// Coarse label for a rejected request, logged next to the status.
pub fn rejection_class(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::UNAUTHORIZED => Some("unauthenticated"),
        StatusCode::FORBIDDEN => Some("denied"),
        StatusCode::TOO_MANY_REQUESTS => Some("rate_limited"),
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => Some("invalid_input"),
        StatusCode::NOT_FOUND => Some("not_found"),
        s if s.is_server_error() => Some("server_error"),
        _ => None,
    }
}

/// Logs one line per request inside a span carrying the request id.
///
/// The caller's user id is read back from the response, where
/// [`require_auth`](crate::middleware::auth::require_auth) leaves it, so
/// policy denials are attributed to the account that was refused.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("request", %request_id, %method, %path);

    let response = next.run(req).instrument(span.clone()).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let user_id = response.extensions().get::<Identity>().map(|i| i.user_id);

    let _entered = span.enter();
    match rejection_class(response.status()) {
        Some(class) if response.status().is_server_error() => {
            error!(status, ?user_id, class, latency_ms, "Request failed");
        }
        Some(class) => {
            warn!(status, ?user_id, class, latency_ms, "Request rejected");
        }
        None => {
            info!(status, ?user_id, latency_ms, "Request served");
        }
    }

    response
}

/// Installs the global subscriber: compact console output plus daily-rotated
/// error and JSON files under `log_dir`.
pub fn init_tracing(log_dir: &str) -> anyhow::Result<()> {
    use std::fs;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    fs::create_dir_all(log_dir)?;

    // Console layer with filtering
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,gatehouse_db=info,tower_http=warn",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    // File layer for errors
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "gatehouse.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // JSON file layer for structured logs
    let json_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "gatehouse.json");

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .try_init()?;

    info!(log_dir, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_class() {
        assert_eq!(rejection_class(StatusCode::UNAUTHORIZED), Some("unauthenticated"));
        assert_eq!(rejection_class(StatusCode::FORBIDDEN), Some("denied"));
        assert_eq!(rejection_class(StatusCode::TOO_MANY_REQUESTS), Some("rate_limited"));
        assert_eq!(rejection_class(StatusCode::UNPROCESSABLE_ENTITY), Some("invalid_input"));
        assert_eq!(rejection_class(StatusCode::BAD_GATEWAY), Some("server_error"));
        assert_eq!(rejection_class(StatusCode::OK), None);
        assert_eq!(rejection_class(StatusCode::CREATED), None);
    }
}
