use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use rolegrid_core::{BranchId, OrganizationId, RoleId, UserId, UserIdentity};
use rolegrid_domain::AccessContext;
use uuid::Uuid;

use crate::dto::{
    AssignRoleRequest, EffectivePermissionsQuery, EffectivePermissionsResponse,
    RemoveRoleRequest, RemoveRoleResponse, RoleAssignmentResponse, SyncUserRolesRequest,
    SyncUserRolesResponse, UserRoleResponse,
};
use crate::error::ApiResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserRoleResponse>>> {
    let assignments = state
        .user_role_service
        .list_user_roles(&user, &context, UserId::from_uuid(user_id))
        .await?
        .into_iter()
        .map(UserRoleResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let assignment = state
        .user_role_service
        .assign_role(
            &user,
            &context,
            UserId::from_uuid(user_id),
            RoleId::from_uuid(payload.role_id),
            payload.org_id.map(OrganizationId::from_uuid),
            payload.branch_id.map(BranchId::from_uuid),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

/// Revokes one role. The scope travels in an optional JSON body; no body means
/// the global assignment.
pub async fn remove_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<RemoveRoleRequest>>,
) -> ApiResult<Json<RemoveRoleResponse>> {
    let Json(payload) = payload.unwrap_or_default();
    let removed = state
        .user_role_service
        .remove_role(
            &user,
            &context,
            UserId::from_uuid(user_id),
            RoleId::from_uuid(role_id),
            payload.org_id.map(OrganizationId::from_uuid),
            payload.branch_id.map(BranchId::from_uuid),
        )
        .await?;

    Ok(Json(RemoveRoleResponse {
        removed: u32::try_from(removed).unwrap_or(u32::MAX),
    }))
}

pub async fn sync_user_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SyncUserRolesRequest>,
) -> ApiResult<Json<SyncUserRolesResponse>> {
    let role_ids = payload
        .role_ids
        .into_iter()
        .map(RoleId::from_uuid)
        .collect::<BTreeSet<_>>();

    let outcome = state
        .user_role_service
        .sync_roles(
            &user,
            &context,
            UserId::from_uuid(user_id),
            role_ids,
            payload.org_id.map(OrganizationId::from_uuid),
            payload.branch_id.map(BranchId::from_uuid),
        )
        .await?;

    Ok(Json(SyncUserRolesResponse::from(outcome)))
}

pub async fn effective_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Query(query): Query<EffectivePermissionsQuery>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let target = AccessContext::new(
        query.org_id.map(OrganizationId::from_uuid),
        query.branch_id.map(BranchId::from_uuid),
    );

    let permissions = state
        .user_role_service
        .effective_permissions(&user, &context, UserId::from_uuid(query.user_id), &target)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(permissions)))
}
