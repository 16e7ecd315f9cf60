mod common;

use std::sync::Arc;

use async_trait::async_trait;
use asset_server::store::{StoreError, StoreResult, UserStore};
use common::{TestApp, default_users, user};
use http::{Method, StatusCode};
use shared::models::{UserId, UserIdentity, UserPatch, UserRecord};

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new(default_users());
    let (status, body) = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let app = TestApp::new(default_users());
    let (status, body) = app.send(Method::GET, "/api/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new(default_users());
    let (status, body) = app.get("/api/auth/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn test_read_only_user_cannot_manage_roles() {
    let app = TestApp::new(default_users());
    let token = app.token(&default_users()[3]);

    let (status, body) = app.get("/api/roles", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);
    assert_eq!(body["message"], "no permission to view admin");
    assert_eq!(body["details"]["resource"], "admin");

    // authenticated-only routes stay open
    let (status, _) = app.get("/api/permissions", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_bypasses_every_gate() {
    let app = TestApp::new(default_users());
    let token = app.token(&default_users()[0]);

    let (status, body) = app.get("/api/roles", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, _) = app.get("/api/users", &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_stale_admin_token_is_reconciled() {
    let app = TestApp::new(default_users());
    // user 4 is read-only in the store but the token claims admin
    let token = app.token_as(4, UserIdentity::admin());

    let (status, body) = app.get("/api/roles", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    let (status, me) = app.get("/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["isAdmin"], false);
    assert_eq!(me["roleId"], 4);
    assert_eq!(me["roleName"], "Read Only");
}

#[tokio::test]
async fn test_promotion_applies_without_new_token() {
    let app = TestApp::new(default_users());
    let token = app.token(&default_users()[3]);
    assert_eq!(app.get("/api/roles", &token).await.0, StatusCode::FORBIDDEN);

    app.state
        .users
        .update_user(
            4,
            UserPatch {
                identity: Some(UserIdentity::admin()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(app.get("/api/roles", &token).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_user_token_is_unauthenticated() {
    let app = TestApp::new(default_users());
    let token = app.token_as(42, UserIdentity::admin());
    let (status, _) = app.get("/api/auth/me", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_reports_effective_matrix() {
    let app = TestApp::new(default_users());

    let (_, me) = app.get("/api/auth/me", &app.token(&default_users()[0])).await;
    assert_eq!(me["permissions"]["bitlockerKeys"]["delete"], true);

    let (_, me) = app.get("/api/auth/me", &app.token(&default_users()[4])).await;
    assert_eq!(me["roleId"], serde_json::Value::Null);
    assert_eq!(me["permissions"]["assets"]["view"], true);
    assert_eq!(me["permissions"]["users"]["view"], false);
}

#[derive(Debug)]
struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl UserStore for FailingStore {
    async fn get_user(&self, _id: UserId) -> StoreResult<Option<UserRecord>> {
        Err(unavailable())
    }
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        Err(unavailable())
    }
    async fn create_user(&self, _username: String, _identity: UserIdentity) -> StoreResult<UserRecord> {
        Err(unavailable())
    }
    async fn update_user(&self, _id: UserId, _patch: UserPatch) -> StoreResult<Option<UserRecord>> {
        Err(unavailable())
    }
    async fn delete_user(&self, _id: UserId) -> StoreResult<bool> {
        Err(unavailable())
    }
}

#[tokio::test]
async fn test_store_failure_denies_with_internal_error() {
    let app = TestApp::with_store(Arc::new(FailingStore));
    let token = app.token(&user(1, "admin", true, None));

    let (status, body) = app.get("/api/roles", &token).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 9001);
}
