mod common;

use axum::http::StatusCode;
use common::{delete, get, json_request, spawn_app};
use gatehouse_models::users::UserStatus;
use serde_json::json;

#[tokio::test]
async fn test_role_gated_endpoint_after_promotion() {
    let app = spawn_app().await;
    app.seed_user("root", Some("admin"), UserStatus::Active).await;
    let bob = app.seed_user("bob", Some("user"), UserStatus::Active).await;
    let victim = app.seed_user("victim", Some("guest"), UserStatus::Active).await;

    let bob_token = app.access_token("bob").await;
    let uri = format!("/api/v1/admin/users/{}", victim.id);

    let (status, body) = app.send(delete(&uri, &bob_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
    assert_eq!(body["message"], "access control require role: admin");

    let admin_token = app.access_token("root").await;
    let admin_role = app.role_id("admin").await;
    let (status, promoted) = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/users/{}", bob.id),
            Some(&admin_token),
            json!({ "role_id": admin_role }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"]["code"], "admin");

    // same token, role resolved live
    let (status, _) = app.send(delete(&uri, &bob_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(get(&format!("/api/v1/users/{}", victim.id), Some(&admin_token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_users_requires_permission() {
    let app = spawn_app().await;
    app.seed_user("bob", Some("user"), UserStatus::Active).await;
    let token = app.access_token("bob").await;

    let (status, body) = app.send(get("/api/v1/users", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "access control require permission: user:list");
}

#[tokio::test]
async fn test_list_users_paginates_and_searches() {
    let app = spawn_app().await;
    app.seed_user("root", Some("admin"), UserStatus::Active).await;
    for name in ["carol", "carlos", "dave"] {
        app.seed_user(name, Some("user"), UserStatus::Active).await;
    }
    let token = app.access_token("root").await;

    let (status, body) = app
        .send(get("/api/v1/users?page=1&page_size=2", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 4);
    assert_eq!(body["meta"]["has_more"], true);

    let (status, body) = app
        .send(get("/api/v1/users?search=CAR", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn test_user_without_role_is_forbidden() {
    let app = spawn_app().await;
    let orphan = app.seed_user("orphan", None, UserStatus::Active).await;
    let token = app.access_token("orphan").await;

    let (status, body) = app
        .send(get(&format!("/api/v1/users/{}", orphan.id), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "user has no role assigned");
}

#[tokio::test]
async fn test_deleted_user_token_is_unauthorized() {
    let app = spawn_app().await;
    app.seed_user("root", Some("admin"), UserStatus::Active).await;
    let ghost = app.seed_user("ghost", Some("admin"), UserStatus::Active).await;
    let ghost_token = app.access_token("ghost").await;
    let admin_token = app.access_token("root").await;

    let (status, _) = app
        .send(delete(&format!("/api/v1/users/{}", ghost.id), &admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(get("/api/v1/users", Some(&ghost_token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "user not found");
}

#[tokio::test]
async fn test_create_user_defaults_to_user_role() {
    let app = spawn_app().await;
    app.seed_user("root", Some("admin"), UserStatus::Active).await;
    let token = app.access_token("root").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/users",
            Some(&token),
            json!({
                "username": "created",
                "password": "secret1",
                "email": "created@example.com",
                "nickname": "Created"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"]["code"], "user");

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/v1/users",
            Some(&token),
            json!({
                "username": "dangling",
                "password": "secret1",
                "email": "dangling@example.com",
                "nickname": "Dangling",
                "role_id": 9999
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_create_user_allowed_by_permission_without_admin_role() {
    let app = spawn_app().await;
    let clerk = app.seed_user("clerk", Some("user"), UserStatus::Active).await;
    let token = app.access_token("clerk").await;

    let request = || {
        json_request(
            "POST",
            "/api/v1/users",
            Some(&token),
            json!({
                "username": "hire",
                "password": "secret1",
                "email": "hire@example.com",
                "nickname": "Hire"
            }),
        )
    };

    let (status, body) = app.send(request()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "access control require role: admin or permission: user:create"
    );

    use gatehouse_db::RoleRepository;
    let role_id = clerk.role.unwrap().id;
    app.store.add_role_permission(role_id, "user:create").await.unwrap();

    let (status, _) = app.send(request()).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_update_requires_admin_role_and_permission() {
    let app = spawn_app().await;
    let editor = app.seed_user("editor", Some("user"), UserStatus::Active).await;
    let token = app.access_token("editor").await;

    use gatehouse_db::RoleRepository;
    app.store
        .add_role_permission(editor.role.unwrap().id, "user:update")
        .await
        .unwrap();

    // permission alone is not enough
    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/api/v1/users/{}", editor.id),
            Some(&token),
            json!({ "nickname": "Renamed" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "access control require role: admin");
}

#[tokio::test]
async fn test_delete_requires_all_permissions() {
    let app = spawn_app().await;
    let janitor = app.seed_user("janitor", Some("user"), UserStatus::Active).await;
    let target = app.seed_user("target", Some("guest"), UserStatus::Active).await;
    let token = app.access_token("janitor").await;
    let role_id = janitor.role.unwrap().id;
    let uri = format!("/api/v1/users/{}", target.id);

    use gatehouse_db::RoleRepository;
    app.store.add_role_permission(role_id, "user:delete").await.unwrap();

    let (status, body) = app.send(delete(&uri, &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "access control require permission: user:manage");

    app.store.add_role_permission(role_id, "user:manage").await.unwrap();
    let (status, _) = app.send(delete(&uri, &token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_get_user_any_of_permissions() {
    let app = spawn_app().await;
    let reader = app.seed_user("reader", Some("guest"), UserStatus::Active).await;
    let token = app.access_token("reader").await;
    let uri = format!("/api/v1/users/{}", reader.id);

    let (status, body) = app.send(get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "permission control requires one of the following authorizations: user:list, user:read"
    );

    use gatehouse_db::RoleRepository;
    app.store
        .add_role_permission(reader.role.unwrap().id, "user:read")
        .await
        .unwrap();

    let (status, body) = app.send(get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "reader");
}

#[tokio::test]
async fn test_denied_response_carries_caller_identity() {
    use gatehouse::middleware::auth::Identity;
    use tower::ServiceExt;

    let app = spawn_app().await;
    let bob = app.seed_user("bob", Some("user"), UserStatus::Active).await;
    let token = app.access_token("bob").await;

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let identity = response.extensions().get::<Identity>().unwrap();
    assert_eq!(identity.user_id, bob.id);
    assert_eq!(identity.username, "bob");
}
