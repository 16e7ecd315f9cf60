//! User identity projection
//!
//! The user store owns the full user entity; the authorization core only
//! reads and writes the `isAdmin` / `roleId` pair.

use serde::{Deserialize, Serialize};

use super::role::RoleId;
use super::serde_helpers;

/// User ID type
pub type UserId = i64;

/// User row as exposed by the user store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Older rows store `1` / `0`
    #[serde(default, deserialize_with = "serde_helpers::flexible_bool")]
    pub is_admin: bool,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

impl UserRecord {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            is_admin: self.is_admin,
            role_id: self.role_id,
        }
    }
}

/// Authorization identity of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub is_admin: bool,
    pub role_id: Option<RoleId>,
}

impl UserIdentity {
    pub const fn admin() -> Self {
        Self {
            is_admin: true,
            role_id: None,
        }
    }

    pub const fn with_role(role_id: RoleId) -> Self {
        Self {
            is_admin: false,
            role_id: Some(role_id),
        }
    }

    pub const fn unassigned() -> Self {
        Self {
            is_admin: false,
            role_id: None,
        }
    }

    /// `isAdmin` and `roleId` are mutually exclusive
    pub const fn is_consistent(&self) -> bool {
        !(self.is_admin && self.role_id.is_some())
    }

    /// State of the identity machine. Admin wins over a stale role.
    pub const fn state(&self) -> IdentityState {
        match (self.is_admin, self.role_id) {
            (true, _) => IdentityState::Admin,
            (false, Some(id)) => IdentityState::RoleAssigned(id),
            (false, None) => IdentityState::Unassigned,
        }
    }
}

/// Identity state machine; every state is reachable from every other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    Admin,
    RoleAssigned(RoleId),
    Unassigned,
}

/// Identity-mutating request
///
/// Both fields are optional. `roleId: null` is an explicit value and differs
/// from an omitted `roleId`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    #[serde(default, deserialize_with = "serde_helpers::option_flexible_bool")]
    pub is_admin: Option<bool>,
    #[serde(
        default,
        deserialize_with = "serde_helpers::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub role_id: Option<Option<RoleId>>,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub username: String,
    #[serde(default, deserialize_with = "serde_helpers::option_flexible_bool")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// Patch handed to the user store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    /// Always a fully resolved identity, never half of one
    pub identity: Option<UserIdentity>,
}
