//! Role API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/roles | GET | admin.view |
//! | /api/roles/{id} | GET | admin.view |
//! | /api/roles | POST | admin.add |
//! | /api/roles/{id} | PUT | admin.edit |
//! | /api/roles/{id} | DELETE | admin.delete |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use shared::models::{Action, Resource};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let gate = |action| {
        middleware::from_fn_with_state(state.clone(), require_permission(Resource::Admin, action))
    };

    let read_routes = Router::new()
        .route("/api/roles", get(handler::list))
        .route("/api/roles/{id}", get(handler::get_by_id))
        .route_layer(gate(Action::View));

    let create_routes = Router::new()
        .route("/api/roles", post(handler::create))
        .route_layer(gate(Action::Add));

    let update_routes = Router::new()
        .route("/api/roles/{id}", put(handler::update))
        .route_layer(gate(Action::Edit));

    let delete_routes = Router::new()
        .route("/api/roles/{id}", delete(handler::delete))
        .route_layer(gate(Action::Delete));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}
