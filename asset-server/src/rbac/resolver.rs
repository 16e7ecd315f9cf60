//! Authorization Resolver
//!
//! 决策顺序：
//!
//! 1. 无主体 → 未认证
//! 2. 用存储中的身份覆盖令牌快照
//! 3. 管理员 → 允许 (不查看任何角色矩阵)
//! 4. 取角色矩阵；无角色或角色已删除 → 默认矩阵
//! 5. 矩阵中没有该资源 → 拒绝
//! 6. 该动作为 false → 拒绝
//! 7. 允许，并把生效矩阵挂到主体上

use std::fmt;
use std::sync::Arc;

use shared::models::{Action, PermissionMatrix, Resource, RoleId};
use thiserror::Error;

use crate::auth::Principal;
use crate::rbac::{IdentityReconciler, RoleCatalog};
use crate::store::UserStore;
use crate::utils::AppError;

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The matrix has no entry for the resource
    ResourceMissing(Resource),
    /// The entry exists but the action flag is false
    ActionDenied(Resource, Action),
}

impl DenyReason {
    pub fn resource(&self) -> Resource {
        match self {
            DenyReason::ResourceMissing(r) | DenyReason::ActionDenied(r, _) => *r,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::ResourceMissing(r) => write!(f, "no permission to access {r}"),
            DenyReason::ActionDenied(r, a) => write!(f, "no permission to {a} {r}"),
        }
    }
}

/// How an allowed request was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AdminOverride,
    Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny(DenyReason),
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("admin privileges required")]
    AdminRequired,

    #[error("{0}")]
    Denied(DenyReason),

    #[error("Authorization check failed: {0}")]
    Internal(String),
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => AppError::not_authenticated(),
            AuthzError::AdminRequired => AppError::admin_required(),
            AuthzError::Denied(reason) => {
                let mut e = AppError::permission_denied(reason.to_string())
                    .with_detail("resource", reason.resource().as_str());
                if let DenyReason::ActionDenied(_, action) = reason {
                    e = e.with_detail("action", action.as_str());
                }
                e
            }
            AuthzError::Internal(msg) => AppError::internal(msg),
        }
    }
}

/// Pure decision over an already reconciled identity and its matrix
pub fn decide(
    is_admin: bool,
    matrix: &PermissionMatrix,
    resource: Resource,
    action: Action,
) -> Decision {
    if is_admin {
        return Decision::Allow(Grant::AdminOverride);
    }
    match matrix.allows(resource, action) {
        None => Decision::Deny(DenyReason::ResourceMissing(resource)),
        Some(false) => Decision::Deny(DenyReason::ActionDenied(resource, action)),
        Some(true) => Decision::Allow(Grant::Role),
    }
}

/// Request-time permission checks
#[derive(Debug, Clone)]
pub struct Authorizer {
    reconciler: IdentityReconciler,
    catalog: Arc<RoleCatalog>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn UserStore>, catalog: Arc<RoleCatalog>) -> Self {
        Self {
            reconciler: IdentityReconciler::new(store),
            catalog,
        }
    }

    /// Matrix for a non-admin identity
    ///
    /// No role, or a role that has been deleted, yields the default matrix.
    pub fn resolve_matrix(&self, role_id: Option<RoleId>) -> PermissionMatrix {
        role_id
            .and_then(|id| self.catalog.permissions_for(id))
            .unwrap_or_else(PermissionMatrix::defaults)
    }

    pub async fn check_permission(
        &self,
        principal: Option<&mut Principal>,
        resource: Resource,
        action: Action,
    ) -> Result<Grant, AuthzError> {
        let principal = principal.ok_or(AuthzError::Unauthenticated)?;
        self.reconciler.reconcile(principal).await?;

        if principal.is_admin {
            principal.permissions = Some(PermissionMatrix::full_access());
            return Ok(Grant::AdminOverride);
        }

        let matrix = self.resolve_matrix(principal.role_id);
        match decide(false, &matrix, resource, action) {
            Decision::Allow(grant) => {
                principal.permissions = Some(matrix);
                Ok(grant)
            }
            Decision::Deny(reason) => Err(AuthzError::Denied(reason)),
        }
    }

    /// Gate for operations reserved to administrators
    pub async fn require_admin(&self, principal: Option<&mut Principal>) -> Result<(), AuthzError> {
        let principal = principal.ok_or(AuthzError::Unauthenticated)?;
        self.reconciler.reconcile(principal).await?;

        if principal.is_admin {
            principal.permissions = Some(PermissionMatrix::full_access());
            Ok(())
        } else {
            Err(AuthzError::AdminRequired)
        }
    }

    /// Reconciled identity and its effective matrix, without a gate
    pub async fn effective_permissions(
        &self,
        principal: &mut Principal,
    ) -> Result<PermissionMatrix, AuthzError> {
        self.reconciler.reconcile(principal).await?;
        let matrix = if principal.is_admin {
            PermissionMatrix::full_access()
        } else {
            self.resolve_matrix(principal.role_id)
        };
        principal.permissions = Some(matrix.clone());
        Ok(matrix)
    }
}
