use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use rolegrid_application::{CreatePermissionInput, UpdatePermissionInput};
use rolegrid_core::{PermissionId, UserIdentity};
use uuid::Uuid;

use crate::dto::{CreatePermissionRequest, PermissionResponse, UpdatePermissionRequest};
use crate::error::ApiResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
) -> ApiResult<Json<Vec<PermissionResponse>>> {
    let permissions = state
        .catalog_service
        .list_permissions(&user, &context)
        .await?
        .into_iter()
        .map(PermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn get_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(permission_id): Path<Uuid>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .catalog_service
        .get_permission(&user, &context, PermissionId::from_uuid(permission_id))
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .catalog_service
        .create_permission(
            &user,
            &context,
            CreatePermissionInput {
                slug: payload.slug,
                name: payload.name,
                group: payload.group,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionResponse::from(permission))))
}

pub async fn update_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(permission_id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> ApiResult<Json<PermissionResponse>> {
    let permission = state
        .catalog_service
        .update_permission(
            &user,
            &context,
            PermissionId::from_uuid(permission_id),
            UpdatePermissionInput {
                slug: payload.slug,
                name: payload.name,
                group: payload.group,
            },
        )
        .await?;

    Ok(Json(PermissionResponse::from(permission)))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(permission_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .delete_permission(&user, &context, PermissionId::from_uuid(permission_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
