//! Role Model

use serde::{Deserialize, Serialize};

use super::permission::{PartialPermissions, PermissionMatrix};

/// Role ID type (sequential, assigned by the catalog)
pub type RoleId = i64;

/// Role entity (RBAC 角色)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub permissions: PermissionMatrix,
    /// Derived by the membership aggregator; never authoritative
    #[serde(default)]
    pub user_count: u32,
}

/// Create role payload
///
/// `permissions` may name any subset of resources; the rest fall back to
/// the default matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: PartialPermissions,
}

/// Update role payload
///
/// Shallow merge of the provided fields. A `permissions` value replaces the
/// whole matrix: resources it omits lose every grant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PartialPermissions>,
}

/// Persisted role row as found in role snapshots
///
/// `permissions` is kept untyped: older snapshots store permission arrays
/// or partial objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: serde_json::Value,
}
