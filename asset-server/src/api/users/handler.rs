//! User identity handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use shared::models::{IdentityPatch, UserCreate, UserId, UserRecord};

use crate::auth::Principal;
use crate::core::ServerState;
use crate::store::UserStore;
use crate::utils::AppResult;

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<UserRecord>>> {
    Ok(Json(state.users.list_users().await?))
}

/// POST /api/users - Create a user
///
/// Granting admin, or a role with any `admin` grant, is itself an
/// admin-only operation.
pub async fn create(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<UserCreate>,
) -> AppResult<Json<UserRecord>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        new_username = %payload.username,
        "Creating user"
    );

    let user = state.identity.create_user(payload, &principal).await?;
    Ok(Json(user))
}

/// PUT /api/users/{id}/access - Change admin flag and/or role
pub async fn update_access(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<UserId>,
    Json(patch): Json<IdentityPatch>,
) -> AppResult<Json<UserRecord>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        target_user = id,
        "Changing user access"
    );

    let user = state.identity.update_access(id, patch, &principal).await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<UserId>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        target_user = id,
        "Deleting user"
    );

    let removed = state.identity.delete_user(id, &principal).await?;
    Ok(Json(removed))
}
