use std::sync::Arc;

use rolegrid_core::{AppResult, UserIdentity};
use rolegrid_domain::{AccessContext, AdminPermission, AuditAction};
use tracing::warn;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CatalogAdminRepository, RoleCatalog,
};

mod permissions;
mod roles;


/// Application service for role and permission catalog administration.
#[derive(Clone)]
pub struct CatalogService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn CatalogAdminRepository>,
    catalog: Arc<dyn RoleCatalog>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl CatalogService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn CatalogAdminRepository>,
        catalog: Arc<dyn RoleCatalog>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            catalog,
            audit_repository,
        }
    }

    async fn require(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        permission: AdminPermission,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, context, permission)
            .await
    }

    /// Appends an audit event for a mutation that is already stored.
    ///
    /// A failed append is logged and does not fail the request.
    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) {
        let appended = self
            .audit_repository
            .append_event(AuditEvent {
                actor_user_id: actor.user_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await;

        if let Err(error) = appended {
            warn!(action = action.as_str(), %error, "failed to append audit event");
        }
    }
}
