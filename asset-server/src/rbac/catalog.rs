//! Role Catalog
//!
//! 角色表是共享可变状态：写操作（含自增 id）在写锁下串行执行，
//! 读操作拿到克隆快照，外部永远拿不到内部集合本身。

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;
use shared::models::{PermissionMatrix, Role, RoleCreate, RoleId, RoleRecord, RoleUpdate};

use crate::rbac::seed::seed_roles;
use crate::utils::{AppError, AppResult, ErrorCode};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text, validate_text,
};

/// Stored form of a role's matrix
#[derive(Debug, Clone)]
enum StoredPermissions {
    /// Written through the catalog API; always complete
    Matrix(PermissionMatrix),
    /// Loaded from an older snapshot, shape not guaranteed
    Raw(Value),
}

#[derive(Debug, Clone)]
struct RoleRow {
    id: RoleId,
    name: String,
    description: String,
    permissions: StoredPermissions,
    user_count: u32,
}

impl RoleRow {
    fn from_role(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            description: role.description,
            permissions: StoredPermissions::Matrix(role.permissions),
            user_count: role.user_count,
        }
    }

    /// Matrix handed to readers; malformed raw data reads as the default matrix
    fn matrix(&self) -> PermissionMatrix {
        match &self.permissions {
            StoredPermissions::Matrix(m) => m.clone(),
            StoredPermissions::Raw(value) => PermissionMatrix::from_value(value).unwrap_or_else(|| {
                tracing::warn!(
                    role_id = self.id,
                    "Stored permissions are malformed, using default matrix"
                );
                PermissionMatrix::defaults()
            }),
        }
    }

    fn to_role(&self) -> Role {
        Role {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            permissions: self.matrix(),
            user_count: self.user_count,
        }
    }
}

#[derive(Debug)]
struct CatalogInner {
    rows: BTreeMap<RoleId, RoleRow>,
    next_id: RoleId,
}

impl CatalogInner {
    fn from_rows(rows: impl IntoIterator<Item = RoleRow>) -> Self {
        let rows: BTreeMap<RoleId, RoleRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let next_id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        Self { rows, next_id }
    }
}

fn validate_role_name(name: &str) -> AppResult<()> {
    validate_required_text(name, "name", MAX_NAME_LEN)
        .map_err(|e| AppError::with_message(ErrorCode::RoleNameInvalid, e.message))
}

/// Guarded role table
#[derive(Debug)]
pub struct RoleCatalog {
    inner: RwLock<CatalogInner>,
}

impl RoleCatalog {
    /// Empty catalog, first id is 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::from_rows(Vec::new())),
        }
    }

    /// Catalog holding the four seed roles
    pub fn with_seed_roles() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::from_rows(
                seed_roles().into_iter().map(RoleRow::from_role),
            )),
        }
    }

    /// Catalog restored from a role snapshot
    ///
    /// Complete matrices are stored as typed; anything else is kept raw and
    /// repaired on read.
    pub fn from_records(records: Vec<RoleRecord>) -> Self {
        let rows = records.into_iter().map(|record| {
            let permissions = match PermissionMatrix::from_value(&record.permissions) {
                Some(m) if m.is_complete() => StoredPermissions::Matrix(m),
                _ => {
                    tracing::warn!(
                        role_id = record.id,
                        role_name = %record.name,
                        "Role snapshot carries a legacy permission value"
                    );
                    StoredPermissions::Raw(record.permissions)
                }
            };
            RoleRow {
                id: record.id,
                name: record.name,
                description: record.description,
                permissions,
                user_count: 0,
            }
        });
        Self {
            inner: RwLock::new(CatalogInner::from_rows(rows)),
        }
    }

    /// Create a role; unspecified resources take the default matrix
    pub fn create_role(&self, data: RoleCreate) -> AppResult<Role> {
        validate_role_name(&data.name)?;
        validate_text(&data.description, "description", MAX_NOTE_LEN)?;

        let permissions = PermissionMatrix::merged_over_defaults(&data.permissions);

        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        let row = RoleRow {
            id,
            name: data.name.trim().to_string(),
            description: data.description,
            permissions: StoredPermissions::Matrix(permissions),
            user_count: 0,
        };
        let role = row.to_role();
        inner.rows.insert(id, row);

        tracing::debug!(role_id = id, role_name = %role.name, "Role created");
        Ok(role)
    }

    pub fn get_roles(&self) -> Vec<Role> {
        self.inner.read().rows.values().map(RoleRow::to_role).collect()
    }

    pub fn get_role_by_id(&self, id: RoleId) -> Option<Role> {
        self.inner.read().rows.get(&id).map(RoleRow::to_role)
    }

    /// Matrix of a role, `None` if the role does not exist
    pub fn permissions_for(&self, id: RoleId) -> Option<PermissionMatrix> {
        self.inner.read().rows.get(&id).map(RoleRow::matrix)
    }

    pub fn contains(&self, id: RoleId) -> bool {
        self.inner.read().rows.contains_key(&id)
    }

    /// Shallow merge; `permissions` replaces the whole matrix
    pub fn update_role(&self, id: RoleId, data: RoleUpdate) -> AppResult<Option<Role>> {
        if let Some(name) = &data.name {
            validate_role_name(name)?;
        }
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;

        let mut inner = self.inner.write();
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            row.name = name.trim().to_string();
        }
        if let Some(description) = data.description {
            row.description = description;
        }
        if let Some(partial) = data.permissions {
            row.permissions = StoredPermissions::Matrix(PermissionMatrix::replaced_by(&partial));
        }

        tracing::debug!(role_id = id, "Role updated");
        Ok(Some(row.to_role()))
    }

    /// Remove a role, returning its name. Users still referencing it fall
    /// back to the default matrix on their next check.
    pub fn delete_role(&self, id: RoleId) -> Option<String> {
        let removed = self.inner.write().rows.remove(&id)?;
        tracing::debug!(role_id = id, role_name = %removed.name, "Role deleted");
        Some(removed.name)
    }

    /// Overwrite every role's user count; roles absent from `counts` get 0
    pub fn apply_user_counts(&self, counts: &HashMap<RoleId, u32>) {
        let mut inner = self.inner.write();
        for row in inner.rows.values_mut() {
            row.user_count = counts.get(&row.id).copied().unwrap_or(0);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::with_seed_roles()
    }
}
