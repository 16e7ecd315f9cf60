//! User Store
//!
//! 用户存储是外部协作者：授权核心只通过 [`UserStore`] 读取/写入
//! `isAdmin` / `roleId`。内置 [`MemoryUserStore`] 用于单机部署和测试。

pub mod memory;

pub use memory::MemoryUserStore;

use async_trait::async_trait;
use shared::error::AppError;
use shared::models::{UserId, UserIdentity, UserPatch, UserRecord};
use thiserror::Error;

/// User store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read user seed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed user seed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::database(err.to_string())
    }
}

/// Result type for user store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable user store as seen by the authorization core
///
/// Implementations must return the latest committed state from
/// [`UserStore::get_user`]; the reconciler relies on it on every check.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<UserRecord>>;

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    /// Insert a user; the store assigns the id
    async fn create_user(&self, username: String, identity: UserIdentity) -> StoreResult<UserRecord>;

    /// Apply a patch, returning the updated row or `None` if the user is gone
    async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<Option<UserRecord>>;

    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}
