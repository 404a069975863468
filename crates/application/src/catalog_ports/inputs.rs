use std::collections::BTreeMap;

use rolegrid_core::{PermissionId, RoleId};
use rolegrid_domain::{Permission, Role};

/// Validated input for creating a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Privilege rank used for ordering.
    pub level: i32,
    /// Optional description.
    pub description: Option<String>,
}

/// Partial role update. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New display name.
    pub name: Option<String>,
    /// New privilege rank.
    pub level: Option<i32>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
}

/// Validated input for creating a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Unique permission slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Optional category tag.
    pub group: Option<String>,
}

/// Partial permission update. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePermissionInput {
    /// New slug.
    pub slug: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New category tag; `Some(None)` clears it.
    pub group: Option<Option<String>>,
}

/// Counts reported after replacing a role's permission set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionSyncResult {
    /// Newly granted permissions.
    pub attached: u64,
    /// Revoked permissions.
    pub detached: u64,
}

/// Role by permission grid keyed by role id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMatrix {
    /// Every role, ordered for display.
    pub roles: Vec<Role>,
    /// Every permission, ordered for display.
    pub permissions: Vec<Permission>,
    /// Granted permission ids per role id.
    pub matrix: BTreeMap<RoleId, Vec<PermissionId>>,
}
