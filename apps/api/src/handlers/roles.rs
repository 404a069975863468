use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use rolegrid_application::{CreateRoleInput, UpdateRoleInput};
use rolegrid_core::{PermissionId, RoleId, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    CreateRoleRequest, PermissionMatrixResponse, PermissionResponse, PermissionSyncResponse,
    RoleResponse, SyncRolePermissionsRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .catalog_service
        .list_roles(&user, &context)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .catalog_service
        .get_role(&user, &context, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .catalog_service
        .create_role(
            &user,
            &context,
            CreateRoleInput {
                slug: payload.slug,
                name: payload.name,
                level: payload.level,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .catalog_service
        .update_role(
            &user,
            &context,
            RoleId::from_uuid(role_id),
            UpdateRoleInput {
                name: payload.name,
                level: payload.level,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(role_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .delete_role(&user, &context, RoleId::from_uuid(role_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .catalog_service
        .list_role_permissions(&user, &context, RoleId::from_uuid(role_id))
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn sync_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<SyncRolePermissionsRequest>,
) -> ApiResult<Json<PermissionSyncResponse>> {
    let permission_ids = payload
        .permission_ids
        .into_iter()
        .map(PermissionId::from_uuid)
        .collect::<BTreeSet<_>>();

    let result = state
        .catalog_service
        .sync_role_permissions(&user, &context, RoleId::from_uuid(role_id), permission_ids)
        .await?;

    Ok(Json(PermissionSyncResponse::from(result)))
}

pub async fn permission_matrix_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
) -> ApiResult<Json<PermissionMatrixResponse>> {
    let matrix = state
        .catalog_service
        .permission_matrix(&user, &context)
        .await?;

    Ok(Json(PermissionMatrixResponse::from(matrix)))
}
