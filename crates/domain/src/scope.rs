//! Scope lattice for role grants.
//!
//! A grant applies globally, to one organization, or to a single branch inside
//! an organization. Grants are additive: a broader grant never hides a narrower
//! one and a narrower one never overrides a broader one.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rolegrid_core::{AppError, AppResult, BranchId, OrganizationId};
use serde::{Deserialize, Serialize};

/// Breadth of a role grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    /// Applies in every organization and branch.
    Global,
    /// Applies in every branch of one organization.
    OrgWide {
        /// Organization the grant is bound to.
        organization_id: OrganizationId,
    },
    /// Applies in one branch only.
    Branch {
        /// Organization owning the branch.
        organization_id: OrganizationId,
        /// Branch the grant is bound to.
        branch_id: BranchId,
    },
}

impl Scope {
    /// Builds a scope from the nullable column pair used at store and
    /// transport boundaries.
    pub fn from_parts(
        organization_id: Option<OrganizationId>,
        branch_id: Option<BranchId>,
    ) -> AppResult<Self> {
        match (organization_id, branch_id) {
            (None, None) => Ok(Self::Global),
            (Some(organization_id), None) => Ok(Self::OrgWide { organization_id }),
            (Some(organization_id), Some(branch_id)) => Ok(Self::Branch {
                organization_id,
                branch_id,
            }),
            (None, Some(branch_id)) => Err(AppError::InvalidScope(format!(
                "branch '{branch_id}' was given without an organization"
            ))),
        }
    }

    /// Returns the organization column value.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        match self {
            Self::Global => None,
            Self::OrgWide { organization_id } | Self::Branch { organization_id, .. } => {
                Some(*organization_id)
            }
        }
    }

    /// Returns the branch column value.
    #[must_use]
    pub fn branch_id(&self) -> Option<BranchId> {
        match self {
            Self::Branch { branch_id, .. } => Some(*branch_id),
            Self::Global | Self::OrgWide { .. } => None,
        }
    }

    /// Returns the scope classification.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        match self {
            Self::Global => ScopeKind::Global,
            Self::OrgWide { .. } => ScopeKind::OrgWide,
            Self::Branch { .. } => ScopeKind::Branch,
        }
    }

    /// Returns whether a grant stored with this scope applies in the queried
    /// context. First matching rule wins:
    ///
    /// 1. global grants always apply,
    /// 2. grants for another organization never apply,
    /// 3. org-wide grants apply to every branch of their organization,
    /// 4. branch grants apply only to their own branch.
    #[must_use]
    pub fn applies_to(&self, context: &AccessContext) -> bool {
        match self {
            Self::Global => true,
            Self::OrgWide { organization_id } => {
                context.organization_id == Some(*organization_id)
            }
            Self::Branch {
                organization_id,
                branch_id,
            } => {
                context.organization_id == Some(*organization_id)
                    && context.branch_id == Some(*branch_id)
            }
        }
    }
}

impl Display for Scope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(formatter, "global"),
            Self::OrgWide { organization_id } => write!(formatter, "org:{organization_id}"),
            Self::Branch {
                organization_id,
                branch_id,
            } => write!(formatter, "org:{organization_id}/branch:{branch_id}"),
        }
    }
}

/// Transport label of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// No organization and no branch.
    #[serde(rename = "global")]
    Global,
    /// Organization without branch.
    #[serde(rename = "org-wide")]
    OrgWide,
    /// Organization and branch.
    #[serde(rename = "branch")]
    Branch,
}

impl ScopeKind {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::OrgWide => "org-wide",
            Self::Branch => "branch",
        }
    }
}

impl FromStr for ScopeKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "global" => Ok(Self::Global),
            "org-wide" => Ok(Self::OrgWide),
            "branch" => Ok(Self::Branch),
            _ => Err(AppError::Validation(format!(
                "unknown scope kind '{value}'"
            ))),
        }
    }
}

/// Organization and branch a request is evaluated in, as supplied by the
/// identity provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessContext {
    /// Active organization, if any.
    pub organization_id: Option<OrganizationId>,
    /// Active branch, if any.
    pub branch_id: Option<BranchId>,
}

impl AccessContext {
    /// Creates a context from the active organization and branch.
    #[must_use]
    pub fn new(organization_id: Option<OrganizationId>, branch_id: Option<BranchId>) -> Self {
        Self {
            organization_id,
            branch_id,
        }
    }
}
