//! Seed roles present at process start

use shared::models::{PermissionMatrix, Resource, ResourcePermissions, Role, RoleId};

/// Administrator role; admins are counted here by the membership aggregator
pub const ADMINISTRATOR_ROLE_ID: RoleId = 1;
pub const ASSET_MANAGER_ROLE_ID: RoleId = 2;
pub const USER_MANAGER_ROLE_ID: RoleId = 3;
pub const READ_ONLY_ROLE_ID: RoleId = 4;

fn asset_manager() -> PermissionMatrix {
    PermissionMatrix::from_fn(|r| match r {
        Resource::Assets
        | Resource::Licenses
        | Resource::Components
        | Resource::Accessories
        | Resource::Consumables => ResourcePermissions::ALL,
        Resource::Reports => ResourcePermissions::VIEW,
        _ => ResourcePermissions::NONE,
    })
}

fn user_manager() -> PermissionMatrix {
    PermissionMatrix::from_fn(|r| match r {
        Resource::Users => ResourcePermissions::ALL,
        Resource::Assets | Resource::Licenses | Resource::Reports => ResourcePermissions::VIEW,
        _ => ResourcePermissions::NONE,
    })
}

fn read_only() -> PermissionMatrix {
    PermissionMatrix::from_fn(|r| {
        if r.is_sensitive() {
            ResourcePermissions::NONE
        } else {
            ResourcePermissions::VIEW
        }
    })
}

/// The four built-in roles, ids 1..=4
pub fn seed_roles() -> Vec<Role> {
    [
        (
            ADMINISTRATOR_ROLE_ID,
            "Administrator",
            "Full access to every resource",
            PermissionMatrix::full_access(),
        ),
        (
            ASSET_MANAGER_ROLE_ID,
            "Asset Manager",
            "Manage assets, licenses and inventory items",
            asset_manager(),
        ),
        (
            USER_MANAGER_ROLE_ID,
            "User Manager",
            "Manage user accounts",
            user_manager(),
        ),
        (
            READ_ONLY_ROLE_ID,
            "Read Only",
            "View business resources",
            read_only(),
        ),
    ]
    .into_iter()
    .map(|(id, name, description, permissions)| Role {
        id,
        name: name.to_string(),
        description: description.to_string(),
        permissions,
        user_count: 0,
    })
    .collect()
}
