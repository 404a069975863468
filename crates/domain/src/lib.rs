//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod catalog;
mod scope;
mod security;
mod user;

pub use assignment::{AssignmentKey, RoleAssignment};
pub use catalog::{
    Permission, Role, SLUG_MAX_LENGTH, SYSTEM_ROLE_SLUGS, is_system_role_slug, validate_slug,
};
pub use scope::{AccessContext, Scope, ScopeKind};
pub use security::{AdminPermission, AuditAction};
pub use user::{EMAIL_MAX_LENGTH, EmailAddress, UserAccount};
