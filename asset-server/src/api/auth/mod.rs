//! Authentication Routes
//!
//! - /api/auth/me: 需要登录 (由全局 require_auth 处理)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/auth/me", get(handler::me))
}
