//! Asset Server - IT 资产管理后端的授权核心
//!
//! # 架构概述
//!
//! - **角色权限** (`rbac`): 角色表、权限决策、身份互斥、角色用户数
//! - **认证** (`auth`): JWT 令牌与请求主体
//! - **用户存储** (`store`): 授权核心读取身份的外部协作者
//! - **活动日志** (`activity`): 角色与身份变更记录
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! asset-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、中间件
//! ├── rbac/          # 角色权限核心
//! ├── store/         # 用户存储
//! ├── activity/      # 活动日志
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、校验
//! ```

pub mod activity;
pub mod api;
pub mod auth;
pub mod core;
pub mod rbac;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use auth::{JwtService, Principal};
pub use crate::core::{Config, Server, ServerState, build_app};
pub use rbac::{Authorizer, RoleCatalog};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 `.env` 并初始化日志
///
/// 日志级别与目录读取 `LOG_LEVEL` / `LOG_DIR`，完整配置在之后由
/// [`Config::from_env`] 加载。
pub fn setup_environment() {
    if let Err(e) = dotenv::dotenv() {
        // .env is optional
        eprintln!("No .env file loaded: {}", e);
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ___                   __
   /   |  _____________  / /_
  / /| | / ___/ ___/ _ \/ __/
 / ___ |(__  |__  )  __/ /_
/_/  |_/____/____/\___/\__/
    "#
    );
}
