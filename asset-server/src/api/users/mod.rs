//! User identity API
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/users | GET | users.view |
//! | /api/users | POST | users.add (授予管理员还需管理员身份) |
//! | /api/users/{id}/access | PUT | 管理员 |
//! | /api/users/{id} | DELETE | users.delete |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use shared::models::{Action, Resource};

use crate::auth::{require_admin, require_permission};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    let gate = |action| {
        middleware::from_fn_with_state(state.clone(), require_permission(Resource::Users, action))
    };

    let list_routes = Router::new()
        .route("/api/users", get(handler::list))
        .route_layer(gate(Action::View));

    let create_routes = Router::new()
        .route("/api/users", post(handler::create))
        .route_layer(gate(Action::Add));

    let delete_routes = Router::new()
        .route("/api/users/{id}", delete(handler::delete))
        .route_layer(gate(Action::Delete));

    let access_routes = Router::new()
        .route("/api/users/{id}/access", put(handler::update_access))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    list_routes
        .merge(create_routes)
        .merge(delete_routes)
        .merge(access_routes)
}
