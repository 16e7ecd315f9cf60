#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use asset_server::auth::JwtConfig;
use asset_server::core::BackgroundTasks;
use asset_server::store::{MemoryUserStore, UserStore};
use asset_server::{Config, RoleCatalog, ServerState, build_app};
use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use shared::models::{RoleId, UserId, UserIdentity, UserRecord};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub tasks: BackgroundTasks,
}

pub fn user(id: UserId, username: &str, is_admin: bool, role_id: Option<RoleId>) -> UserRecord {
    UserRecord {
        id,
        username: username.to_string(),
        is_admin,
        role_id,
    }
}

/// admin (1), asset manager (2), user manager (3), read-only (4), unassigned (5)
pub fn default_users() -> Vec<UserRecord> {
    vec![
        user(1, "admin", true, None),
        user(2, "assets", false, Some(2)),
        user(3, "people", false, Some(3)),
        user(4, "viewer", false, Some(4)),
        user(5, "newcomer", false, None),
    ]
}

impl TestApp {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self::with_store(Arc::new(MemoryUserStore::with_users(users)))
    }

    pub fn with_store(store: Arc<dyn UserStore>) -> Self {
        let config = Config::with_jwt(JwtConfig::with_secret(SECRET));
        let (state, tasks) =
            ServerState::new(config, store, Arc::new(RoleCatalog::with_seed_roles()));
        Self {
            app: build_app(&state),
            state,
            tasks,
        }
    }

    /// Token carrying the given session-time identity
    pub fn token_as(&self, id: UserId, identity: UserIdentity) -> String {
        self.state
            .jwt_service
            .generate_token(id, &format!("user{id}"), identity)
            .expect("token")
    }

    pub fn token(&self, user: &UserRecord) -> String {
        self.token_as(user.id, user.identity())
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// Wait until `check` holds, for state updated by background workers
    pub async fn eventually(&self, mut check: impl FnMut(&ServerState) -> bool) -> bool {
        for _ in 0..100 {
            if check(&self.state) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}
