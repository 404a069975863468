use rolegrid_core::{AppError, AppResult, UserIdentity};
use rolegrid_domain::{AccessContext, AdminPermission};

use crate::EffectivePermissionResolver;

/// Application service for context-scoped authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    resolver: EffectivePermissionResolver,
}

impl AuthorizationService {
    /// Creates a new authorization service over the permission resolver.
    #[must_use]
    pub fn new(resolver: EffectivePermissionResolver) -> Self {
        Self { resolver }
    }

    /// Ensures the actor holds the permission in the access context.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission: AdminPermission,
    ) -> AppResult<()> {
        if self.has_permission(actor, context, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{}'",
            actor.subject(),
            permission.as_str()
        )))
    }

    /// Returns whether the actor holds the permission in the access context.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission: AdminPermission,
    ) -> AppResult<bool> {
        self.resolver
            .has_permission(actor.user_id(), context, permission.as_str())
            .await
    }

    /// Returns the resolver backing the checks.
    #[must_use]
    pub fn resolver(&self) -> &EffectivePermissionResolver {
        &self.resolver
    }
}
