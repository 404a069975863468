use rolegrid_core::{AssignmentId, RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::Scope;

/// Identity tuple of a role grant. At most one assignment exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    /// Grantee.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Breadth of the grant.
    pub scope: Scope,
}

impl AssignmentKey {
    /// Creates an assignment key.
    #[must_use]
    pub fn new(user_id: UserId, role_id: RoleId, scope: Scope) -> Self {
        Self {
            user_id,
            role_id,
            scope,
        }
    }
}

/// Persisted role grant. Never updated in place; a scope change is a removal
/// followed by a new assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable assignment id.
    pub assignment_id: AssignmentId,
    /// Grantee.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Breadth of the grant.
    pub scope: Scope,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

impl RoleAssignment {
    /// Returns the identity tuple of this assignment.
    #[must_use]
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(self.user_id, self.role_id, self.scope)
    }
}
