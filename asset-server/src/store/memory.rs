//! In-memory user store

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{UserId, UserIdentity, UserPatch, UserRecord};

use super::{StoreResult, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, UserRecord>,
    next_id: UserId,
}

/// User store backed by a lock-guarded map
#[derive(Debug)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::with_users(Vec::new())
    }

    /// Seed with existing rows; rows are stored as-is, inconsistent
    /// admin/role pairs included
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            inner: RwLock::new(Inner { users, next_id }),
        }
    }

    /// Load a JSON array of users (`[{id, username, isAdmin, roleId}]`)
    pub fn load_from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let users: Vec<UserRecord> = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.as_ref().display(),
            count = users.len(),
            "Loaded user seed"
        );
        Ok(Self::with_users(users))
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        Ok(self.inner.read().users.values().cloned().collect())
    }

    async fn create_user(&self, username: String, identity: UserIdentity) -> StoreResult<UserRecord> {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        let user = UserRecord {
            id,
            username,
            is_admin: identity.is_admin,
            role_id: identity.role_id,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<Option<UserRecord>> {
        let mut inner = self.inner.write();
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = patch.username {
            user.username = username;
        }
        if let Some(identity) = patch.identity {
            user.is_admin = identity.is_admin;
            user.role_id = identity.role_id;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        Ok(self.inner.write().users.remove(&id).is_some())
    }
}
