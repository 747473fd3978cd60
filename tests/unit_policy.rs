use async_trait::async_trait;
use gatehouse::middleware::auth::Identity;
use gatehouse::middleware::policy::{Decision, DenyReason, Policy};
use gatehouse_core::hash_password;
use gatehouse_db::{MemoryStore, RoleRepository, StoreError, UserRepository};
use gatehouse_models::roles::NewRole;
use gatehouse_models::users::{NewUser, User, UserChanges, UserStatus};

/// Delegates to a [`MemoryStore`] but fails permission checks for one
/// permission string.
struct FlakyStore {
    inner: MemoryStore,
    failing: &'static str,
}

#[async_trait]
impl UserRepository for FlakyStore {
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.create_user(user).await
    }

    async fn update_user(&self, id: u64, changes: UserChanges) -> Result<User, StoreError> {
        self.inner.update_user(id, changes).await
    }

    async fn delete_user(&self, id: u64) -> Result<bool, StoreError> {
        self.inner.delete_user(id).await
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        self.inner.list_users(search, limit, offset).await
    }

    async fn has_permission(&self, user_id: u64, permission: &str) -> Result<bool, StoreError> {
        if permission == self.failing {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.has_permission(user_id, permission).await
    }
}

async fn user_with_permissions(store: &MemoryStore, permissions: &[&str]) -> Identity {
    let role = store
        .create_role(NewRole {
            name: "Tester".to_string(),
            code: "tester".to_string(),
            description: None,
            permissions: permissions.iter().copied().collect(),
        })
        .await
        .unwrap();
    let user = store
        .create_user(NewUser {
            username: "tess".to_string(),
            password_hash: hash_password("password123").unwrap(),
            email: "tess@example.com".to_string(),
            nickname: "Tess".to_string(),
            role_id: Some(role.id),
            status: UserStatus::Active,
        })
        .await
        .unwrap();

    Identity {
        user_id: user.id,
        username: user.username,
    }
}

#[tokio::test]
async fn test_all_of_denies_when_second_permission_missing() {
    let store = MemoryStore::new();
    let identity = user_with_permissions(&store, &["p1"]).await;

    let decision = Policy::all_of(["p1", "p2"])
        .evaluate(&store, Some(&identity))
        .await;
    assert_eq!(
        decision,
        Decision::Deny(DenyReason::MissingPermission("p2".to_string()))
    );
}

#[tokio::test]
async fn test_all_of_denies_when_lookup_errors() {
    let inner = MemoryStore::new();
    let identity = user_with_permissions(&inner, &["p1", "p2"]).await;
    let store = FlakyStore {
        inner,
        failing: "p2",
    };

    let decision = Policy::all_of(["p1", "p2"])
        .evaluate(&store, Some(&identity))
        .await;
    assert!(matches!(decision, Decision::Deny(DenyReason::Internal(_))));
}

#[tokio::test]
async fn test_any_of_skips_failed_check() {
    let inner = MemoryStore::new();
    let identity = user_with_permissions(&inner, &["p2"]).await;
    let store = FlakyStore {
        inner,
        failing: "p1",
    };

    let decision = Policy::any_of(["p1", "p2"])
        .evaluate(&store, Some(&identity))
        .await;
    assert_eq!(decision, Decision::Allow);
}

#[tokio::test]
async fn test_any_of_denies_when_nothing_matches() {
    let inner = MemoryStore::new();
    let identity = user_with_permissions(&inner, &["p3"]).await;
    let store = FlakyStore {
        inner,
        failing: "p1",
    };

    let decision = Policy::any_of(["p1", "p2"])
        .evaluate(&store, Some(&identity))
        .await;
    assert_eq!(
        decision,
        Decision::Deny(DenyReason::MissingAnyPermission(vec![
            "p1".to_string(),
            "p2".to_string()
        ]))
    );
}

#[tokio::test]
async fn test_wildcard_role_passes_unseen_permissions() {
    let store = MemoryStore::new();
    let identity = user_with_permissions(&store, &["*"]).await;

    for policy in [
        Policy::permission("never:seen"),
        Policy::permission(""),
        Policy::all_of(["a:b", "c:d"]),
    ] {
        assert_eq!(policy.evaluate(&store, Some(&identity)).await, Decision::Allow);
    }
}

#[tokio::test]
async fn test_missing_identity_is_unauthenticated() {
    let store = MemoryStore::new();
    let decision = Policy::role("admin").evaluate(&store, None).await;
    assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let store = MemoryStore::new();
    let identity = Identity {
        user_id: 42,
        username: "ghost".to_string(),
    };
    let decision = Policy::permission("user:list")
        .evaluate(&store, Some(&identity))
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::UserNotFound));
}

#[tokio::test]
async fn test_user_whose_role_was_deleted_has_no_role() {
    let store = MemoryStore::new();
    let identity = user_with_permissions(&store, &["*"]).await;
    let role_id = store.find_role_by_code("tester").await.unwrap().unwrap().id;
    assert!(store.delete_role(role_id));

    let decision = Policy::permission("user:list")
        .evaluate(&store, Some(&identity))
        .await;
    assert_eq!(decision, Decision::Deny(DenyReason::NoRole));
}

#[tokio::test]
async fn test_role_or_permission() {
    let store = MemoryStore::new();
    let identity = user_with_permissions(&store, &["user:create"]).await;

    assert_eq!(
        Policy::role_or_permission("admin", "user:create")
            .evaluate(&store, Some(&identity))
            .await,
        Decision::Allow
    );
    assert_eq!(
        Policy::role_or_permission("admin", "user:delete")
            .evaluate(&store, Some(&identity))
            .await,
        Decision::Deny(DenyReason::MissingRoleOrPermission {
            role: "admin".to_string(),
            permission: "user:delete".to_string(),
        })
    );
    assert_eq!(
        Policy::role_or_permission("tester", "user:delete")
            .evaluate(&store, Some(&identity))
            .await,
        Decision::Allow
    );
}

#[test]
fn test_deny_reason_statuses() {
    use axum::http::StatusCode;

    assert_eq!(DenyReason::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(DenyReason::UserNotFound.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(DenyReason::NoRole.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        DenyReason::MissingRole("admin".to_string()).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        DenyReason::Internal("boom".to_string()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        DenyReason::Internal("boom".to_string()).to_string(),
        "permission check fail"
    );
}

#[test]
fn test_deny_reason_into_app_error_envelope() {
    use axum::http::StatusCode;

    let err = DenyReason::MissingRole("admin".to_string()).into_app_error();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
    assert_eq!(err.message(), "access control require role: admin");

    let err = DenyReason::UserNotFound.into_app_error();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.message(), "user not found");

    let err = DenyReason::Internal("connection reset".to_string()).into_app_error();
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.message(), "permission check fail");
}
