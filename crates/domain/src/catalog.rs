//! Role and permission catalog records.

use rolegrid_core::{AppError, AppResult, NonEmptyString, PermissionId, RoleId};
use serde::{Deserialize, Serialize};

/// Role slugs reserved for system-managed roles. These roles cannot be deleted
/// and their slugs cannot change.
pub const SYSTEM_ROLE_SLUGS: &[&str] = &["admin", "manager", "supervisor", "member", "viewer"];

/// Maximum accepted slug length.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Validates a catalog slug: lowercase ASCII letters, digits, `.`, `_` and `-`,
/// starting with a letter.
pub fn validate_slug(value: &str) -> AppResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AppError::Validation("slug must not be empty".to_owned()));
    }

    if value.len() > SLUG_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "slug must not exceed {SLUG_MAX_LENGTH} characters"
        )));
    }

    if !value.starts_with(|character: char| character.is_ascii_lowercase()) {
        return Err(AppError::Validation(format!(
            "slug '{value}' must start with a lowercase letter"
        )));
    }

    let valid = value.chars().all(|character| {
        character.is_ascii_lowercase()
            || character.is_ascii_digit()
            || matches!(character, '.' | '_' | '-')
    });
    if !valid {
        return Err(AppError::Validation(format!(
            "slug '{value}' may only contain lowercase letters, digits, '.', '_' and '-'"
        )));
    }

    Ok(value.to_owned())
}

/// Returns whether the slug names a system-managed role.
#[must_use]
pub fn is_system_role_slug(slug: &str) -> bool {
    SYSTEM_ROLE_SLUGS.contains(&slug)
}

/// A permission grantable through roles. Identity is the slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    slug: String,
    name: String,
    group: Option<String>,
}

impl Permission {
    /// Creates a validated permission record.
    pub fn new(
        id: PermissionId,
        slug: &str,
        name: impl Into<String>,
        group: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            slug: validate_slug(slug)?,
            name: NonEmptyString::new(name)?.into(),
            group: normalize_optional(group),
        })
    }

    /// Returns the stable permission id.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the unique slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the category tag, if any.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    slug: String,
    name: String,
    level: i32,
    description: Option<String>,
    permissions: Vec<Permission>,
}

impl Role {
    /// Creates a validated role record without permissions.
    pub fn new(
        id: RoleId,
        slug: &str,
        name: impl Into<String>,
        level: i32,
        description: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            slug: validate_slug(slug)?,
            name: NonEmptyString::new(name)?.into(),
            level,
            description: normalize_optional(description),
            permissions: Vec::new(),
        })
    }

    /// Returns the role with the given permissions, de-duplicated by slug and
    /// sorted by slug.
    #[must_use]
    pub fn with_permissions(mut self, mut permissions: Vec<Permission>) -> Self {
        permissions.sort_by(|left, right| left.slug.cmp(&right.slug));
        permissions.dedup_by(|left, right| left.slug == right.slug);
        self.permissions = permissions;
        self
    }

    /// Returns the stable role id.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the privilege rank used for display ordering.
    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the permissions attached to this role.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        self.permissions.as_slice()
    }

    /// Returns whether this role is system-managed.
    #[must_use]
    pub fn is_system(&self) -> bool {
        is_system_role_slug(self.slug.as_str())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
