//! Activity entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::UserId;
use std::fmt;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    RoleCreated,
    RoleUpdated,
    RoleDeleted,
    UserCreated,
    UserAccessChanged,
    UserDeleted,
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityAction::RoleCreated => "role_created",
            ActivityAction::RoleUpdated => "role_updated",
            ActivityAction::RoleDeleted => "role_deleted",
            ActivityAction::UserCreated => "user_created",
            ActivityAction::UserAccessChanged => "user_access_changed",
            ActivityAction::UserDeleted => "user_deleted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Role,
    User,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Role => f.write_str("role"),
            ItemType::User => f.write_str("user"),
        }
    }
}

/// One row of the activity journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub action: ActivityAction,
    pub item_type: ItemType,
    pub item_id: i64,
    /// Acting user; `None` for system-initiated changes
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

impl ActivityEntry {
    pub fn new(
        action: ActivityAction,
        item_type: ItemType,
        item_id: i64,
        user_id: Option<UserId>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            action,
            item_type,
            item_id,
            user_id,
            timestamp: Utc::now(),
            notes: notes.into(),
        }
    }
}
