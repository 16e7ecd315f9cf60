//! Identity Reconciler
//!
//! 令牌里的 `is_admin` / `role_id` 是登录时的快照。每次授权决策前，
//! 用用户存储中的当前值覆盖它们，撤销管理员或更换角色立即生效。

use std::sync::Arc;

use crate::auth::Principal;
use crate::rbac::AuthzError;
use crate::store::UserStore;

#[derive(Debug, Clone)]
pub struct IdentityReconciler {
    store: Arc<dyn UserStore>,
}

impl IdentityReconciler {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Overwrite the principal's identity with the stored one
    ///
    /// A user that no longer exists is unauthenticated. A failed store read
    /// is an internal error; the caller denies.
    pub async fn reconcile(&self, principal: &mut Principal) -> Result<(), AuthzError> {
        let user = self
            .store
            .get_user(principal.id)
            .await
            .map_err(|e| AuthzError::Internal(e.to_string()))?
            .ok_or(AuthzError::Unauthenticated)?;

        let identity = user.identity();
        if principal.identity() != identity {
            tracing::debug!(
                user_id = principal.id,
                token_admin = principal.is_admin,
                token_role = ?principal.role_id,
                stored_admin = identity.is_admin,
                stored_role = ?identity.role_id,
                "Identity changed since token was issued"
            );
        }

        principal.is_admin = identity.is_admin;
        principal.role_id = identity.role_id;
        principal.permissions = None;
        Ok(())
    }
}
