use std::collections::BTreeMap;

use rolegrid_application::{PermissionMatrix, PermissionSyncResult};
use rolegrid_domain::{Permission, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::common::deserialize_present;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub slug: String,
    pub name: String,
    pub level: i32,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial role update. An explicit `null` description clears it.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub level: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub description: Option<Option<String>>,
}

/// Desired permission set of a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/sync-role-permissions-request.ts"
)]
pub struct SyncRolePermissionsRequest {
    #[ts(type = "Array<string>")]
    pub permission_ids: Vec<Uuid>,
}

/// Incoming payload for permission creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// Partial permission update. An explicit `null` group clears it.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-permission-request.ts"
)]
pub struct UpdatePermissionRequest {
    #[serde(default)]
    #[ts(optional)]
    pub slug: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(optional)]
    pub group: Option<Option<String>>,
}

/// API representation of a permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub group: Option<String>,
}

/// API representation of a role with its permissions.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub level: i32,
    pub description: Option<String>,
    pub is_system: bool,
    pub permissions: Vec<PermissionResponse>,
}

/// Applied role permission changes.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-sync-response.ts"
)]
pub struct PermissionSyncResponse {
    pub attached: u32,
    pub detached: u32,
}

/// Role by permission grid.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-matrix-response.ts"
)]
pub struct PermissionMatrixResponse {
    pub roles: Vec<RoleResponse>,
    pub permissions: Vec<PermissionResponse>,
    /// Permission ids granted to each role, keyed by role id.
    pub matrix: BTreeMap<String, Vec<String>>,
}

impl From<Permission> for PermissionResponse {
    fn from(value: Permission) -> Self {
        Self {
            id: value.id().to_string(),
            slug: value.slug().to_owned(),
            name: value.name().to_owned(),
            group: value.group().map(ToOwned::to_owned),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            id: value.id().to_string(),
            slug: value.slug().to_owned(),
            name: value.name().to_owned(),
            level: value.level(),
            description: value.description().map(ToOwned::to_owned),
            is_system: value.is_system(),
            permissions: value
                .permissions()
                .iter()
                .cloned()
                .map(PermissionResponse::from)
                .collect(),
        }
    }
}

impl From<PermissionSyncResult> for PermissionSyncResponse {
    fn from(value: PermissionSyncResult) -> Self {
        Self {
            attached: u32::try_from(value.attached).unwrap_or(u32::MAX),
            detached: u32::try_from(value.detached).unwrap_or(u32::MAX),
        }
    }
}

impl From<PermissionMatrix> for PermissionMatrixResponse {
    fn from(value: PermissionMatrix) -> Self {
        Self {
            roles: value.roles.into_iter().map(RoleResponse::from).collect(),
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionResponse::from)
                .collect(),
            matrix: value
                .matrix
                .into_iter()
                .map(|(role_id, permission_ids)| {
                    (
                        role_id.to_string(),
                        permission_ids.iter().map(ToString::to_string).collect(),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{UpdatePermissionRequest, UpdateRoleRequest};

    #[test]
    fn update_role_distinguishes_null_from_absent_description() {
        let cleared = serde_json::from_str::<UpdateRoleRequest>(r#"{"description": null}"#);
        let untouched = serde_json::from_str::<UpdateRoleRequest>(r#"{"name": "Auditor"}"#);

        assert!(matches!(cleared, Ok(request) if request.description == Some(None)));
        assert!(matches!(
            untouched,
            Ok(request) if request.description.is_none() && request.name.as_deref() == Some("Auditor")
        ));
    }

    #[test]
    fn update_permission_sets_group() {
        let request =
            serde_json::from_str::<UpdatePermissionRequest>(r#"{"group": "app.reports"}"#);
        assert!(matches!(
            request,
            Ok(request) if request.group == Some(Some("app.reports".to_owned())) && request.slug.is_none()
        ));
    }
}
