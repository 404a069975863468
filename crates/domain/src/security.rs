use std::str::FromStr;

use rolegrid_core::AppError;
use serde::{Deserialize, Serialize};

/// Catalog permissions checked before administrative operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    /// Allows reading roles and the permission matrix.
    RolesView,
    /// Allows creating roles.
    RolesCreate,
    /// Allows updating roles and their permission sets.
    RolesUpdate,
    /// Allows deleting non-system roles.
    RolesDelete,
    /// Allows managing the permission catalog.
    PermissionsManage,
    /// Allows reading users and their role assignments.
    UsersView,
    /// Allows creating users in the local directory.
    UsersCreate,
    /// Allows editing users and changing their role assignments.
    UsersUpdate,
    /// Allows deleting users from the local directory.
    UsersDelete,
}

impl AdminPermission {
    /// Returns the catalog slug for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RolesView => "app.roles.view",
            Self::RolesCreate => "app.roles.create",
            Self::RolesUpdate => "app.roles.update",
            Self::RolesDelete => "app.roles.delete",
            Self::PermissionsManage => "app.permissions.manage",
            Self::UsersView => "app.users.view",
            Self::UsersCreate => "app.users.create",
            Self::UsersUpdate => "app.users.update",
            Self::UsersDelete => "app.users.delete",
        }
    }

    /// Returns all known admin permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AdminPermission] = &[
            AdminPermission::RolesView,
            AdminPermission::RolesCreate,
            AdminPermission::RolesUpdate,
            AdminPermission::RolesDelete,
            AdminPermission::PermissionsManage,
            AdminPermission::UsersView,
            AdminPermission::UsersCreate,
            AdminPermission::UsersUpdate,
            AdminPermission::UsersDelete,
        ];

        ALL
    }
}

impl FromStr for AdminPermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown admin permission '{value}'")))
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when role attributes change.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a role permission set is synchronized.
    RolePermissionsSynced,
    /// Emitted when a permission is created.
    PermissionCreated,
    /// Emitted when a permission is updated.
    PermissionUpdated,
    /// Emitted when a permission is deleted.
    PermissionDeleted,
    /// Emitted when a user is added to the local directory.
    UserCreated,
    /// Emitted when user attributes change.
    UserUpdated,
    /// Emitted when a user is deleted.
    UserDeleted,
    /// Emitted when a role is assigned to a user.
    UserRoleAssigned,
    /// Emitted when a role assignment is removed from a user.
    UserRoleRemoved,
    /// Emitted when a user's roles are synchronized for one scope.
    UserRolesSynced,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "rbac.role.created",
            Self::RoleUpdated => "rbac.role.updated",
            Self::RoleDeleted => "rbac.role.deleted",
            Self::RolePermissionsSynced => "rbac.role.permissions_synced",
            Self::PermissionCreated => "rbac.permission.created",
            Self::PermissionUpdated => "rbac.permission.updated",
            Self::PermissionDeleted => "rbac.permission.deleted",
            Self::UserCreated => "rbac.user.created",
            Self::UserUpdated => "rbac.user.updated",
            Self::UserDeleted => "rbac.user.deleted",
            Self::UserRoleAssigned => "rbac.user_role.assigned",
            Self::UserRoleRemoved => "rbac.user_role.removed",
            Self::UserRolesSynced => "rbac.user_role.synced",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AdminPermission;

    #[test]
    fn admin_permission_roundtrip_storage_value() {
        for permission in AdminPermission::all() {
            let restored = AdminPermission::from_str(permission.as_str());
            assert!(matches!(restored, Ok(value) if value == *permission));
        }
    }

    #[test]
    fn unknown_admin_permission_is_rejected() {
        let parsed = AdminPermission::from_str("app.roles.unknown");
        assert!(parsed.is_err());
    }
}
