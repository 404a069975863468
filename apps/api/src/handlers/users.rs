use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use rolegrid_application::{MAX_USERS_PER_PAGE, UserListQuery};
use rolegrid_core::{UserId, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    CreateUserRequest, UpdateUserRequest, UserListParams, UserPageResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::middleware::RequestContext;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Query(params): Query<UserListParams>,
) -> ApiResult<Json<UserPageResponse>> {
    let current_page = params.page().max(1);
    let per_page = params.per_page().clamp(1, MAX_USERS_PER_PAGE);
    let sort = params.sort()?;

    let page = state
        .user_directory_service
        .list_users(
            &user,
            &context,
            UserListQuery {
                search: params.search,
                page: current_page,
                per_page,
                sort,
            },
        )
        .await?;

    Ok(Json(UserPageResponse::new(page, current_page, per_page)))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .user_directory_service
        .get_user(&user, &context, UserId::from_uuid(user_id))
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let account = state
        .user_directory_service
        .create_user(
            &user,
            &context,
            payload.name.as_str(),
            payload.email.as_str(),
            payload.console_user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .user_directory_service
        .update_user(
            &user,
            &context,
            UserId::from_uuid(user_id),
            payload.name,
            payload.email,
            payload.console_user_id,
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    RequestContext(context): RequestContext,
    Path(user_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .user_directory_service
        .delete_user(&user, &context, UserId::from_uuid(user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
