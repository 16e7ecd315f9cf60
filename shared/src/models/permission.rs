//! Permission Matrix
//!
//! 资源 × 动作 的授权矩阵。资源集合是封闭的 11 项，动作为
//! `view | edit | add | delete`。
//!
//! # 线上格式
//!
//! ```json
//! { "assets": { "view": true, "edit": false, "add": false, "delete": false }, ... }
//! ```
//!
//! `delete` 可省略，缺省为 `false`。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Capability domain guarded by the permission matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Assets,
    Users,
    Licenses,
    Components,
    Accessories,
    Consumables,
    Reports,
    Admin,
    VmMonitoring,
    NetworkDiscovery,
    BitlockerKeys,
}

impl Resource {
    /// Every resource key, in wire order
    pub const ALL: [Resource; 11] = [
        Resource::Assets,
        Resource::Users,
        Resource::Licenses,
        Resource::Components,
        Resource::Accessories,
        Resource::Consumables,
        Resource::Reports,
        Resource::Admin,
        Resource::VmMonitoring,
        Resource::NetworkDiscovery,
        Resource::BitlockerKeys,
    ];

    /// Wire key of this resource
    pub const fn as_str(&self) -> &'static str {
        match self {
            Resource::Assets => "assets",
            Resource::Users => "users",
            Resource::Licenses => "licenses",
            Resource::Components => "components",
            Resource::Accessories => "accessories",
            Resource::Consumables => "consumables",
            Resource::Reports => "reports",
            Resource::Admin => "admin",
            Resource::VmMonitoring => "vmMonitoring",
            Resource::NetworkDiscovery => "networkDiscovery",
            Resource::BitlockerKeys => "bitlockerKeys",
        }
    }

    /// Sensitive resources are hidden from principals without a role
    pub const fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Resource::Users
                | Resource::Admin
                | Resource::VmMonitoring
                | Resource::NetworkDiscovery
                | Resource::BitlockerKeys
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}

/// Operation requested on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Edit,
    Add,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Edit, Action::Add, Action::Delete];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Edit => "edit",
            Action::Add => "add",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grants for a single resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePermissions {
    pub view: bool,
    pub edit: bool,
    pub add: bool,
    #[serde(default)]
    pub delete: bool,
}

impl ResourcePermissions {
    /// No action allowed
    pub const NONE: Self = Self {
        view: false,
        edit: false,
        add: false,
        delete: false,
    };

    /// Every action allowed
    pub const ALL: Self = Self {
        view: true,
        edit: true,
        add: true,
        delete: true,
    };

    /// View only
    pub const VIEW: Self = Self {
        view: true,
        edit: false,
        add: false,
        delete: false,
    };

    pub const fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Edit => self.edit,
            Action::Add => self.add,
            Action::Delete => self.delete,
        }
    }
}

/// Partial matrix as accepted from API payloads
///
/// Unknown resource keys are rejected during deserialization.
pub type PartialPermissions = BTreeMap<Resource, ResourcePermissions>;

/// Resource-keyed grant table of a role
///
/// Matrices built through [`PermissionMatrix::merged_over_defaults`],
/// [`PermissionMatrix::replaced_by`] or the constructors carry every
/// resource key. Only [`PermissionMatrix::from_value`] may yield a partial
/// matrix, for data written before write-time validation existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<Resource, ResourcePermissions>);

impl PermissionMatrix {
    /// Baseline grant for a resource when no role resolves
    pub const fn default_for(resource: Resource) -> ResourcePermissions {
        if resource.is_sensitive() {
            ResourcePermissions::NONE
        } else {
            ResourcePermissions::VIEW
        }
    }

    /// DefaultPermissions: view on ordinary business resources, nothing else
    pub fn defaults() -> Self {
        Self::from_fn(Self::default_for)
    }

    /// Every action on every resource
    pub fn full_access() -> Self {
        Self::from_fn(|_| ResourcePermissions::ALL)
    }

    /// Build a complete matrix from a per-resource function
    pub fn from_fn(f: impl Fn(Resource) -> ResourcePermissions) -> Self {
        Self(Resource::ALL.into_iter().map(|r| (r, f(r))).collect())
    }

    /// Merge a partial matrix over DefaultPermissions (role creation)
    pub fn merged_over_defaults(partial: &PartialPermissions) -> Self {
        Self::from_fn(|r| {
            partial
                .get(&r)
                .copied()
                .unwrap_or_else(|| Self::default_for(r))
        })
    }

    /// Replace the whole matrix (role update)
    ///
    /// Resources missing from `partial` are cleared to no access; they do not
    /// keep their previous grants.
    pub fn replaced_by(partial: &PartialPermissions) -> Self {
        Self::from_fn(|r| partial.get(&r).copied().unwrap_or(ResourcePermissions::NONE))
    }

    /// Lenient parse of a stored matrix value
    ///
    /// Returns `None` when the value is not a resource-keyed object of
    /// `{view, edit, add, delete?}` entries (e.g. a legacy permission array).
    /// Unknown keys are ignored; known keys absent from the object stay absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut map = BTreeMap::new();
        for (key, entry) in object {
            let Ok(resource) = key.parse::<Resource>() else {
                tracing::debug!(key = %key, "Ignoring unknown resource key in stored matrix");
                continue;
            };
            let perms = serde_json::from_value::<ResourcePermissions>(entry.clone()).ok()?;
            map.insert(resource, perms);
        }
        Some(Self(map))
    }

    pub fn get(&self, resource: Resource) -> Option<&ResourcePermissions> {
        self.0.get(&resource)
    }

    /// `None` if the resource is absent, otherwise whether the action is granted
    pub fn allows(&self, resource: Resource, action: Action) -> Option<bool> {
        self.get(resource).map(|p| p.allows(action))
    }

    /// Whether every resource key is present
    pub fn is_complete(&self) -> bool {
        Resource::ALL.iter().all(|r| self.0.contains_key(r))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, ResourcePermissions)> + '_ {
        self.0.iter().map(|(r, p)| (*r, *p))
    }
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::defaults()
    }
}
