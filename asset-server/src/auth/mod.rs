//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`Principal`] - 当前请求主体
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] / [`require_admin`] - 授权中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod principal;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{PrincipalExt, require_admin, require_auth, require_permission};
pub use principal::Principal;
