//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 当前身份
//! - [`permissions`] - 权限词表
//! - [`role`] - 角色管理接口
//! - [`users`] - 用户身份接口
//! - [`activity`] - 活动日志

pub mod activity;
pub mod auth;
pub mod health;
pub mod permissions;
pub mod role;
pub mod users;

use axum::Router;

use crate::core::ServerState;

/// Build a router with all routes registered (no global middleware, no state)
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        // Public route
        .merge(health::router())
        // Authenticated
        .merge(auth::router())
        .merge(permissions::router())
        // Permission-gated
        .merge(role::router(state))
        .merge(users::router(state))
        .merge(activity::router(state))
}
