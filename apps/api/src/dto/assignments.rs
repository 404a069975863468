use rolegrid_application::{RoleSyncOutcome, UserRoleAssignment};
use rolegrid_domain::{Permission, RoleAssignment};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Grants one role to a user. Omitted ids mean a wider scope.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    #[ts(type = "string")]
    pub role_id: Uuid,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub branch_id: Option<Uuid>,
}

/// Scope of a single role revocation.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remove-role-request.ts"
)]
pub struct RemoveRoleRequest {
    #[serde(default)]
    #[ts(type = "string | null")]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub branch_id: Option<Uuid>,
}

/// Desired role set for one scope.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/sync-user-roles-request.ts"
)]
pub struct SyncUserRolesRequest {
    #[ts(type = "Array<string>")]
    pub role_ids: Vec<Uuid>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub branch_id: Option<Uuid>,
}

/// Query string of the effective permissions lookup.
#[derive(Debug, Deserialize)]
pub struct EffectivePermissionsQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub org_id: Option<Uuid>,
    #[serde(default)]
    pub branch_id: Option<Uuid>,
}

/// API representation of a stored role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    /// One of `global`, `org-wide` or `branch`.
    pub scope: String,
    pub created_at: String,
}

/// Role assignment joined with its catalog role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/user-role-response.ts"
)]
pub struct UserRoleResponse {
    pub id: String,
    pub role_id: String,
    /// Absent when the role was deleted from the catalog.
    pub role_slug: Option<String>,
    pub role_name: Option<String>,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    pub scope: String,
    pub created_at: String,
}

/// Result of a single role revocation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remove-role-response.ts"
)]
pub struct RemoveRoleResponse {
    pub removed: u32,
}

/// Roles changed by a scope sync.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/sync-user-roles-response.ts"
)]
pub struct SyncUserRolesResponse {
    pub attached: Vec<String>,
    pub detached: Vec<String>,
    pub scope: String,
}

/// Permission slugs effective in one context.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub permissions: Vec<String>,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            id: value.assignment_id.to_string(),
            user_id: value.user_id.to_string(),
            role_id: value.role_id.to_string(),
            org_id: value.scope.organization_id().map(|id| id.to_string()),
            branch_id: value.scope.branch_id().map(|id| id.to_string()),
            scope: value.scope.kind().as_str().to_owned(),
            created_at: value.created_at,
        }
    }
}

impl From<UserRoleAssignment> for UserRoleResponse {
    fn from(value: UserRoleAssignment) -> Self {
        let UserRoleAssignment { assignment, role } = value;
        Self {
            id: assignment.assignment_id.to_string(),
            role_id: assignment.role_id.to_string(),
            role_slug: role.as_ref().map(|role| role.slug().to_owned()),
            role_name: role.as_ref().map(|role| role.name().to_owned()),
            org_id: assignment.scope.organization_id().map(|id| id.to_string()),
            branch_id: assignment.scope.branch_id().map(|id| id.to_string()),
            scope: assignment.scope.kind().as_str().to_owned(),
            created_at: assignment.created_at,
        }
    }
}

impl From<RoleSyncOutcome> for SyncUserRolesResponse {
    fn from(value: RoleSyncOutcome) -> Self {
        Self {
            attached: value.attached.iter().map(ToString::to_string).collect(),
            detached: value.detached.iter().map(ToString::to_string).collect(),
            scope: value.scope.kind().as_str().to_owned(),
        }
    }
}

impl From<Vec<Permission>> for EffectivePermissionsResponse {
    fn from(value: Vec<Permission>) -> Self {
        Self {
            permissions: value
                .iter()
                .map(|permission| permission.slug().to_owned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rolegrid_application::{RoleSyncOutcome, UserRoleAssignment};
    use rolegrid_core::{AssignmentId, BranchId, OrganizationId, RoleId, UserId};
    use rolegrid_domain::{RoleAssignment, Scope};

    use super::{RemoveRoleRequest, SyncUserRolesResponse, UserRoleResponse};

    #[test]
    fn stale_assignment_renders_without_role_details() {
        let organization_id = OrganizationId::new();
        let branch_id = BranchId::new();
        let response = UserRoleResponse::from(UserRoleAssignment {
            assignment: RoleAssignment {
                assignment_id: AssignmentId::new(),
                user_id: UserId::new(),
                role_id: RoleId::new(),
                scope: Scope::Branch {
                    organization_id,
                    branch_id,
                },
                created_at: "2026-01-05T09:00:00Z".to_owned(),
            },
            role: None,
        });

        assert_eq!(response.scope, "branch");
        assert_eq!(response.org_id, Some(organization_id.to_string()));
        assert_eq!(response.branch_id, Some(branch_id.to_string()));
        assert!(response.role_slug.is_none());
    }

    #[test]
    fn sync_outcome_reports_scope_label() {
        let attached = RoleId::new();
        let response = SyncUserRolesResponse::from(RoleSyncOutcome {
            scope: Scope::OrgWide {
                organization_id: OrganizationId::new(),
            },
            attached: BTreeSet::from([attached]),
            detached: BTreeSet::new(),
        });

        assert_eq!(response.scope, "org-wide");
        assert_eq!(response.attached, vec![attached.to_string()]);
        assert!(response.detached.is_empty());
    }

    #[test]
    fn remove_request_defaults_to_global_scope() {
        let request = serde_json::from_str::<RemoveRoleRequest>("{}");
        assert!(matches!(
            request,
            Ok(request) if request.org_id.is_none() && request.branch_id.is_none()
        ));
    }
}
