//! Role API Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use shared::models::{Role, RoleCreate, RoleId, RoleUpdate};

use crate::activity::{ActivityAction, ActivityEntry, ItemType};
use crate::auth::Principal;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ErrorCode};

fn role_not_found(id: RoleId) -> AppError {
    AppError::with_message(ErrorCode::RoleNotFound, format!("Role {} not found", id))
}

/// GET /api/roles - Get all roles with fresh user counts
pub async fn list(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<Vec<Role>>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        "Fetching roles"
    );

    // stale counts are better than no listing
    if let Err(e) = state.membership.recompute_user_counts().await {
        tracing::warn!(error = %e, "Failed to refresh role user counts");
    }

    Ok(Json(state.catalog.get_roles()))
}

/// GET /api/roles/{id} - Get role by ID
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<RoleId>,
) -> AppResult<Json<Role>> {
    let role = state
        .catalog
        .get_role_by_id(id)
        .ok_or_else(|| role_not_found(id))?;

    Ok(Json(role))
}

/// POST /api/roles - Create a new role
pub async fn create(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        role_name = %payload.name,
        "Creating role"
    );

    let role = state.catalog.create_role(payload)?;

    state.activity.log(ActivityEntry::new(
        ActivityAction::RoleCreated,
        ItemType::Role,
        role.id,
        Some(principal.id),
        role.name.clone(),
    ));

    Ok(Json(role))
}

/// PUT /api/roles/{id} - Update a role
pub async fn update(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<RoleId>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        role_id = id,
        "Updating role"
    );

    let matrix_replaced = payload.permissions.is_some();
    let role = state
        .catalog
        .update_role(id, payload)?
        .ok_or_else(|| role_not_found(id))?;

    state.activity.log(ActivityEntry::new(
        ActivityAction::RoleUpdated,
        ItemType::Role,
        id,
        Some(principal.id),
        if matrix_replaced {
            format!("{} (permissions replaced)", role.name)
        } else {
            role.name.clone()
        },
    ));

    Ok(Json(role))
}

/// DELETE /api/roles/{id} - Delete a role
///
/// Users still assigned to the role fall back to the default matrix.
pub async fn delete(
    State(state): State<ServerState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<RoleId>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        user_id = principal.id,
        username = %principal.username,
        role_id = id,
        "Deleting role"
    );

    let removed = state.catalog.delete_role(id);

    if let Some(name) = &removed {
        state.activity.log(ActivityEntry::new(
            ActivityAction::RoleDeleted,
            ItemType::Role,
            id,
            Some(principal.id),
            name.clone(),
        ));
    }

    Ok(Json(removed.is_some()))
}
