//! Current identity handler

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::models::{PermissionMatrix, RoleId, UserId};

use crate::auth::Principal;
use crate::core::ServerState;
use crate::utils::AppResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub role_id: Option<RoleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub permissions: PermissionMatrix,
}

/// GET /api/auth/me - Reconciled identity and effective matrix
pub async fn me(
    State(state): State<ServerState>,
    mut principal: Principal,
) -> AppResult<Json<MeResponse>> {
    let permissions = state.authorizer.effective_permissions(&mut principal).await?;
    let role_name = principal
        .role_id
        .and_then(|id| state.catalog.get_role_by_id(id))
        .map(|r| r.name);

    Ok(Json(MeResponse {
        id: principal.id,
        username: principal.username,
        is_admin: principal.is_admin,
        role_id: principal.role_id,
        role_name,
        permissions,
    }))
}
