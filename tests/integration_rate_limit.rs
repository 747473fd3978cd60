mod common;

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use common::{spawn_app, spawn_app_with_rate_limit, strict_rate_limit};

/// Request arriving from `client`, as the server's connect-info layer
/// would tag it.
fn from_peer(uri: &str, client: &str) -> Request<Body> {
    let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    tag_peer(&mut request, client);
    request
}

fn tag_peer(request: &mut Request<Body>, client: &str) {
    let ip: IpAddr = client.parse().unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 40000)));
}

#[tokio::test]
async fn test_rejects_after_limit_with_envelope() {
    let app = spawn_app_with_rate_limit(strict_rate_limit(3)).await;

    for _ in 0..3 {
        let (status, _) = app
            .send(from_peer("/api/v1/auth/user", "192.168.1.100"))
            .await;
        // unauthenticated, but admitted
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app
        .send(from_peer("/api/v1/auth/user", "192.168.1.100"))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 429);
    assert_eq!(
        body["message"],
        "Too many HTTP requests, please try again later"
    );
}

#[tokio::test]
async fn test_limits_are_per_client() {
    let app = spawn_app_with_rate_limit(strict_rate_limit(1)).await;

    let (status, _) = app.send(from_peer("/api/v1/roles", "10.0.0.1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.send(from_peer("/api/v1/roles", "10.0.0.1")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = app.send(from_peer("/api/v1/roles", "10.0.0.2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_runs_before_authentication() {
    let app = spawn_app_with_rate_limit(strict_rate_limit(1)).await;

    app.send(from_peer("/api/v1/users", "172.16.0.5")).await;

    // an invalid token would be 401, but the limiter answers first
    let mut request = Request::builder()
        .uri("/api/v1/users")
        .header("authorization", "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    tag_peer(&mut request, "172.16.0.5");
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_routes_outside_api_are_not_limited() {
    let app = spawn_app_with_rate_limit(strict_rate_limit(1)).await;

    for _ in 0..5 {
        let (status, _) = app.send(from_peer("/health", "10.9.9.9")).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_default_limit_admits_normal_traffic() {
    let app = spawn_app().await;
    for _ in 0..20 {
        let (status, _) = app.send(from_peer("/api/v1/auth/user", "10.1.1.1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(app.state.rate_limiter.tracked_clients(), 1);
}

#[tokio::test]
async fn test_forwarding_headers_do_not_reset_limit() {
    let app = spawn_app_with_rate_limit(strict_rate_limit(1)).await;

    let mut limited = 0;
    for i in 0..50 {
        let mut request = Request::builder()
            .uri("/api/v1/auth/user")
            .header("x-forwarded-for", format!("198.51.100.{i}"))
            .header("x-real-ip", format!("198.51.100.{i}"))
            .header("forwarded", format!("for=198.51.100.{i}"))
            .body(Body::empty())
            .unwrap();
        tag_peer(&mut request, "10.20.30.40");

        let (status, _) = app.send(request).await;
        if status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }

    assert_eq!(limited, 49);
    assert_eq!(app.state.rate_limiter.tracked_clients(), 1);
}
