use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use rolegrid_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route(
            "/api/admin/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/admin/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/admin/roles/{role_id}/permissions",
            get(handlers::roles::list_role_permissions_handler)
                .put(handlers::roles::sync_role_permissions_handler),
        )
        .route(
            "/api/admin/permission-matrix",
            get(handlers::roles::permission_matrix_handler),
        )
        .route(
            "/api/admin/permissions",
            get(handlers::permissions::list_permissions_handler)
                .post(handlers::permissions::create_permission_handler),
        )
        .route(
            "/api/admin/permissions/{permission_id}",
            get(handlers::permissions::get_permission_handler)
                .put(handlers::permissions::update_permission_handler)
                .delete(handlers::permissions::delete_permission_handler),
        )
        .route(
            "/api/admin/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route(
            "/api/admin/users/{user_id}",
            get(handlers::users::get_user_handler)
                .put(handlers::users::update_user_handler)
                .delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/admin/users/{user_id}/roles",
            get(handlers::user_roles::list_user_roles_handler)
                .post(handlers::user_roles::assign_user_role_handler),
        )
        .route(
            "/api/admin/users/{user_id}/roles/sync",
            put(handlers::user_roles::sync_user_roles_handler),
        )
        .route(
            "/api/admin/users/{user_id}/roles/{role_id}",
            delete(handlers::user_roles::remove_user_role_handler),
        )
        .route(
            "/api/admin/effective-permissions",
            get(handlers::user_roles::effective_permissions_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = cors::build_cors_layer(app_state.frontend_url.as_str())?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(admin_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
