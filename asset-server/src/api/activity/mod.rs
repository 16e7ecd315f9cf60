//! Activity journal
//!
//! GET /api/activity?limit=N - 最近的角色/身份变更记录 (管理员)

use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::get,
};
use serde::Deserialize;

use crate::activity::ActivityEntry;
use crate::auth::require_admin;
use crate::core::ServerState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    limit: Option<usize>,
}

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .route("/api/activity", get(recent))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

async fn recent(
    State(state): State<ServerState>,
    Query(query): Query<ActivityQuery>,
) -> Json<Vec<ActivityEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Json(state.activity_log.recent(limit))
}
