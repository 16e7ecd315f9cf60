//! Permission vocabulary
//!
//! GET /api/permissions - 资源列表、动作列表和默认矩阵 (需要登录)

use axum::{Json, Router, routing::get};
use serde::Serialize;
use shared::models::{Action, PermissionMatrix, Resource};

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    resources: Vec<Resource>,
    actions: Vec<Action>,
    defaults: PermissionMatrix,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/permissions", get(list))
}

async fn list() -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        resources: Resource::ALL.to_vec(),
        actions: Action::ALL.to_vec(),
        defaults: PermissionMatrix::defaults(),
    })
}
