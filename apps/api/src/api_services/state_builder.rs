use std::sync::Arc;

use rolegrid_application::{
    AuthorizationService, CatalogService, EffectivePermissionResolver, UserDirectoryService,
    UserRoleService,
};
use rolegrid_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditRepository, PostgresCatalogRepository,
    PostgresUserRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let catalog_repository = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let assignment_repository = Arc::new(PostgresAssignmentRepository::new(pool.clone()));
    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    let authorization_service = AuthorizationService::new(EffectivePermissionResolver::new(
        assignment_repository.clone(),
        catalog_repository.clone(),
    ));

    AppState {
        catalog_service: CatalogService::new(
            authorization_service.clone(),
            catalog_repository.clone(),
            catalog_repository.clone(),
            audit_repository.clone(),
        ),
        user_role_service: UserRoleService::new(
            authorization_service.clone(),
            assignment_repository,
            catalog_repository,
            user_repository.clone(),
            audit_repository.clone(),
        ),
        user_directory_service: UserDirectoryService::new(
            authorization_service,
            user_repository,
            audit_repository,
        ),
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
        postgres_pool: pool,
    }
}
