//! 角色权限核心 (RBAC)
//!
//! - [`RoleCatalog`] - 角色表与权限矩阵
//! - [`Authorizer`] - 请求级权限决策 (管理员直接放行)
//! - [`IdentityReconciler`] - 用存储中的身份覆盖令牌快照
//! - [`resolve_identity`] / [`IdentityService`] - `isAdmin` 与 `roleId` 互斥
//! - [`MembershipAggregator`] - 角色用户数统计

pub mod catalog;
pub mod identity;
pub mod membership;
pub mod reconciler;
pub mod resolver;
pub mod seed;

pub use catalog::RoleCatalog;
pub use identity::{IdentityService, PROTECTED_USER_ID, resolve_identity};
pub use membership::{
    IdentityEvent, MembershipAggregator, MembershipNotifier, MembershipWorker, tally_user_counts,
};
pub use reconciler::IdentityReconciler;
pub use resolver::{Authorizer, AuthzError, Decision, DenyReason, Grant, decide};
