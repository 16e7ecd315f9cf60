//! User identity transitions
//!
//! `isAdmin` 与 `roleId` 互斥。所有会修改这两个字段的入口都经过
//! [`resolve_identity`]，存储中不会再写入不一致的组合。

use std::sync::Arc;

use shared::models::{
    Action, IdentityPatch, PermissionMatrix, Resource, RoleId, UserCreate, UserId, UserIdentity,
    UserPatch, UserRecord,
};

use crate::activity::{ActivityAction, ActivityEntry, ActivityService, ItemType};
use crate::auth::Principal;
use crate::rbac::membership::{IdentityEvent, MembershipNotifier};
use crate::rbac::RoleCatalog;
use crate::rbac::seed::ADMINISTRATOR_ROLE_ID;
use crate::store::UserStore;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

/// First administrator account; never deleted
pub const PROTECTED_USER_ID: UserId = 1;

/// Resolve the identity to store from a mutation request
///
/// `role_id`: `None` means omitted, `Some(None)` an explicit null.
///
/// | isAdmin | roleId   | result                  |
/// |---------|----------|-------------------------|
/// | true    | any      | admin, no role          |
/// | false   | given    | not admin, given role   |
/// | false   | omitted  | not admin, existing role|
/// | omitted | given    | not admin, given role   |
/// | omitted | omitted  | existing, normalized    |
pub fn resolve_identity(
    is_admin: Option<bool>,
    role_id: Option<Option<RoleId>>,
    existing: &UserIdentity,
) -> UserIdentity {
    match (is_admin, role_id) {
        (Some(true), _) => UserIdentity::admin(),
        (Some(false), Some(role_id)) | (None, Some(role_id)) => UserIdentity {
            is_admin: false,
            role_id,
        },
        (Some(false), None) => UserIdentity {
            is_admin: false,
            role_id: existing.role_id,
        },
        (None, None) if existing.is_admin => UserIdentity::admin(),
        (None, None) => *existing,
    }
}

fn grants_admin_access(matrix: &PermissionMatrix) -> bool {
    Action::ALL
        .into_iter()
        .any(|action| matrix.allows(Resource::Admin, action) == Some(true))
}

fn describe(identity: &UserIdentity) -> String {
    match (identity.is_admin, identity.role_id) {
        (true, _) => "admin".to_string(),
        (false, Some(id)) => format!("role {id}"),
        (false, None) => "unassigned".to_string(),
    }
}

/// Identity-mutating user operations
#[derive(Debug, Clone)]
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    catalog: Arc<RoleCatalog>,
    notifier: MembershipNotifier,
    activity: Arc<ActivityService>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn UserStore>,
        catalog: Arc<RoleCatalog>,
        notifier: MembershipNotifier,
        activity: Arc<ActivityService>,
    ) -> Self {
        Self {
            store,
            catalog,
            notifier,
            activity,
        }
    }

    /// A newly assigned role must exist; unchanged references are left alone
    fn ensure_assignable(&self, resolved: &UserIdentity, previous: Option<RoleId>) -> AppResult<()> {
        match resolved.role_id {
            Some(id) if Some(id) != previous && !self.catalog.contains(id) => Err(
                AppError::with_message(
                    ErrorCode::RoleAssignmentInvalid,
                    format!("Role {id} does not exist"),
                )
                .with_detail("roleId", id),
            ),
            _ => Ok(()),
        }
    }

    /// Admin status, the Administrator role and any role with an `admin`
    /// grant are handed out by administrators only
    ///
    /// `actor` must already be reconciled against the store.
    fn ensure_grantable(&self, resolved: &UserIdentity, actor: &Principal) -> AppResult<()> {
        if actor.is_admin {
            return Ok(());
        }
        let elevated = resolved.is_admin
            || resolved.role_id.is_some_and(|id| {
                id == ADMINISTRATOR_ROLE_ID
                    || self
                        .catalog
                        .permissions_for(id)
                        .is_some_and(|m| grants_admin_access(&m))
            });
        if elevated {
            tracing::warn!(
                actor_id = actor.id,
                role_id = ?resolved.role_id,
                is_admin = resolved.is_admin,
                "Non-admin tried to grant administrative access"
            );
            return Err(AppError::admin_required());
        }
        Ok(())
    }

    pub async fn create_user(&self, data: UserCreate, actor: &Principal) -> AppResult<UserRecord> {
        validate_required_text(&data.username, "username", MAX_SHORT_TEXT_LEN)?;

        let identity = resolve_identity(
            data.is_admin,
            data.role_id.map(Some),
            &UserIdentity::unassigned(),
        );
        self.ensure_assignable(&identity, None)?;
        self.ensure_grantable(&identity, actor)?;

        let user = self
            .store
            .create_user(data.username.trim().to_string(), identity)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User created");
        self.notifier.notify(IdentityEvent::Created(user.id));
        self.activity.log(ActivityEntry::new(
            ActivityAction::UserCreated,
            ItemType::User,
            user.id,
            Some(actor.id),
            format!("{} ({})", user.username, describe(&identity)),
        ));
        Ok(user)
    }

    /// Change a user's admin flag and/or role
    pub async fn update_access(
        &self,
        user_id: UserId,
        patch: IdentityPatch,
        actor: &Principal,
    ) -> AppResult<UserRecord> {
        let existing = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        let previous = existing.identity();

        let identity = resolve_identity(patch.is_admin, patch.role_id, &previous);
        self.ensure_assignable(&identity, previous.role_id)?;
        self.ensure_grantable(&identity, actor)?;

        let user = self
            .store
            .update_user(
                user_id,
                UserPatch {
                    identity: Some(identity),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

        if previous != identity {
            tracing::info!(
                user_id,
                from = %describe(&previous),
                to = %describe(&identity),
                "User access changed"
            );
        }
        self.notifier.notify(IdentityEvent::Updated(user_id));
        self.activity.log(ActivityEntry::new(
            ActivityAction::UserAccessChanged,
            ItemType::User,
            user_id,
            Some(actor.id),
            format!("{} -> {}", describe(&previous), describe(&identity)),
        ));
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: UserId, actor: &Principal) -> AppResult<bool> {
        if user_id == PROTECTED_USER_ID {
            return Err(AppError::new(ErrorCode::CannotDeleteAdmin));
        }

        let removed = self.store.delete_user(user_id).await?;
        if removed {
            tracing::info!(user_id, "User deleted");
            self.notifier.notify(IdentityEvent::Deleted(user_id));
            self.activity.log(ActivityEntry::new(
                ActivityAction::UserDeleted,
                ItemType::User,
                user_id,
                Some(actor.id),
                "",
            ));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::seed::{READ_ONLY_ROLE_ID, USER_MANAGER_ROLE_ID};
    use crate::store::MemoryUserStore;
    use shared::models::{PartialPermissions, ResourcePermissions, RoleCreate};

    const ADMIN: UserIdentity = UserIdentity::admin();
    const ROLE_4: UserIdentity = UserIdentity::with_role(4);
    const NONE: UserIdentity = UserIdentity::unassigned();
    const STALE: UserIdentity = UserIdentity {
        is_admin: true,
        role_id: Some(4),
    };

    #[test]
    fn test_granting_admin_clears_role() {
        assert_eq!(resolve_identity(Some(true), None, &ROLE_4), ADMIN);
        assert_eq!(resolve_identity(Some(true), Some(Some(2)), &ROLE_4), ADMIN);
    }

    #[test]
    fn test_revoking_admin() {
        assert_eq!(resolve_identity(Some(false), Some(Some(2)), &ADMIN), UserIdentity::with_role(2));
        assert_eq!(resolve_identity(Some(false), None, &ADMIN), NONE);
        assert_eq!(resolve_identity(Some(false), None, &ROLE_4), ROLE_4);
    }

    #[test]
    fn test_role_without_admin_flag_demotes() {
        assert_eq!(resolve_identity(None, Some(Some(2)), &ADMIN), UserIdentity::with_role(2));
        assert_eq!(resolve_identity(None, Some(None), &ROLE_4), NONE);
        assert_eq!(resolve_identity(None, Some(None), &ADMIN), NONE);
    }

    #[test]
    fn test_no_input_normalizes_existing() {
        assert_eq!(resolve_identity(None, None, &ROLE_4), ROLE_4);
        assert_eq!(resolve_identity(None, None, &NONE), NONE);
        assert_eq!(resolve_identity(None, None, &STALE), ADMIN);
    }

    #[test]
    fn test_result_is_always_consistent() {
        let admin_inputs = [None, Some(true), Some(false)];
        let role_inputs = [None, Some(None), Some(Some(3))];
        for existing in [ADMIN, ROLE_4, NONE, STALE] {
            for is_admin in admin_inputs {
                for role_id in role_inputs {
                    let resolved = resolve_identity(is_admin, role_id, &existing);
                    assert!(
                        resolved.is_consistent(),
                        "{is_admin:?} {role_id:?} {existing:?} -> {resolved:?}"
                    );
                }
            }
        }
    }

    fn service(users: Vec<UserRecord>) -> (IdentityService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::with_users(users));
        let (notifier, _rx) = MembershipNotifier::channel(8);
        let (activity, _activity_rx) = ActivityService::new(8);
        let service = IdentityService::new(
            store.clone(),
            Arc::new(RoleCatalog::with_seed_roles()),
            notifier,
            activity,
        );
        (service, store)
    }

    fn actor() -> Principal {
        Principal {
            id: PROTECTED_USER_ID,
            username: "admin".to_string(),
            is_admin: true,
            role_id: None,
            permissions: None,
        }
    }

    fn record(id: UserId, identity: UserIdentity) -> UserRecord {
        UserRecord {
            id,
            username: format!("user{id}"),
            is_admin: identity.is_admin,
            role_id: identity.role_id,
        }
    }

    #[tokio::test]
    async fn test_update_access_corrects_inconsistent_row() {
        let (service, store) = service(vec![record(1, ADMIN), record(2, STALE)]);
        let user = service
            .update_access(2, IdentityPatch::default(), &actor())
            .await
            .unwrap();
        assert!(user.is_admin);
        assert_eq!(user.role_id, None);
        assert_eq!(store.get_user(2).await.unwrap().unwrap().identity(), ADMIN);
    }

    #[tokio::test]
    async fn test_update_access_rejects_unknown_role() {
        let (service, _) = service(vec![record(2, ROLE_4)]);
        let err = service
            .update_access(
                2,
                IdentityPatch {
                    is_admin: None,
                    role_id: Some(Some(42)),
                },
                &actor(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleAssignmentInvalid);
    }

    #[tokio::test]
    async fn test_update_access_keeps_dangling_role_reference() {
        // role 9 was deleted after assignment; revoking nothing keeps it
        let (service, _) = service(vec![record(2, UserIdentity::with_role(9))]);
        let user = service
            .update_access(
                2,
                IdentityPatch {
                    is_admin: Some(false),
                    role_id: None,
                },
                &actor(),
            )
            .await
            .unwrap();
        assert_eq!(user.role_id, Some(9));
    }

    #[tokio::test]
    async fn test_update_access_missing_user() {
        let (service, _) = service(vec![]);
        let err = service
            .update_access(7, IdentityPatch::default(), &actor())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn test_create_user_resolves_identity() {
        let (service, _) = service(vec![record(1, ADMIN)]);
        let user = service
            .create_user(
                UserCreate {
                    username: "dave".to_string(),
                    is_admin: Some(true),
                    role_id: Some(READ_ONLY_ROLE_ID),
                },
                &actor(),
            )
            .await
            .unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(user.identity(), ADMIN);
    }

    fn user_manager() -> Principal {
        Principal {
            id: 3,
            username: "people".to_string(),
            is_admin: false,
            role_id: Some(USER_MANAGER_ROLE_ID),
            permissions: None,
        }
    }

    fn create_request(is_admin: Option<bool>, role_id: Option<RoleId>) -> UserCreate {
        UserCreate {
            username: "mallory".to_string(),
            is_admin,
            role_id,
        }
    }

    #[tokio::test]
    async fn test_non_admin_cannot_grant_administrative_access() {
        let (service, store) = service(vec![record(1, ADMIN)]);
        let mut partial = PartialPermissions::new();
        partial.insert(Resource::Admin, ResourcePermissions::VIEW);
        let auditor = service
            .catalog
            .create_role(RoleCreate {
                name: "Auditor".to_string(),
                description: String::new(),
                permissions: partial,
            })
            .unwrap();

        for request in [
            create_request(Some(true), None),
            create_request(None, Some(ADMINISTRATOR_ROLE_ID)),
            create_request(None, Some(auditor.id)),
        ] {
            let err = service
                .create_user(request, &user_manager())
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::AdminRequired);
        }
        assert_eq!(store.list_users().await.unwrap().len(), 1);

        // ordinary roles stay open to the user manager
        let user = service
            .create_user(create_request(None, Some(READ_ONLY_ROLE_ID)), &user_manager())
            .await
            .unwrap();
        assert_eq!(user.role_id, Some(READ_ONLY_ROLE_ID));

        // and an admin may hand out the Administrator role
        let user = service
            .create_user(create_request(None, Some(ADMINISTRATOR_ROLE_ID)), &actor())
            .await
            .unwrap();
        assert_eq!(user.role_id, Some(ADMINISTRATOR_ROLE_ID));
    }

    #[tokio::test]
    async fn test_non_admin_access_change_cannot_elevate() {
        let (service, _) = service(vec![record(1, ADMIN), record(4, ROLE_4)]);
        let err = service
            .update_access(
                4,
                IdentityPatch {
                    is_admin: None,
                    role_id: Some(Some(ADMINISTRATOR_ROLE_ID)),
                },
                &user_manager(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }

    #[tokio::test]
    async fn test_first_user_cannot_be_deleted() {
        let (service, _) = service(vec![record(1, ADMIN), record(2, ROLE_4)]);
        let err = service.delete_user(1, &actor()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotDeleteAdmin);
        assert!(service.delete_user(2, &actor()).await.unwrap());
        assert!(!service.delete_user(2, &actor()).await.unwrap());
    }
}
