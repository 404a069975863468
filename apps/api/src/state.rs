use rolegrid_application::{CatalogService, UserDirectoryService, UserRoleService};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub catalog_service: CatalogService,
    pub user_role_service: UserRoleService,
    pub user_directory_service: UserDirectoryService,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub postgres_pool: PgPool,
}
