use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use rolegrid_core::{AppError, BranchId, OrganizationId, UserIdentity};
use rolegrid_domain::AccessContext;
use tower_sessions::Session;
use tracing::warn;
use uuid::Uuid;

use crate::auth::SESSION_USER_KEY;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const BRANCH_HEADER: &str = "x-branch-id";

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method())
        && !is_same_origin(request.headers(), state.frontend_url.as_str())
    {
        warn!(method = %request.method(), uri = %request.uri(), "blocked cross-origin mutation");
        return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Organization and branch context supplied by the identity provider.
///
/// Only presence and UUID shape are checked here. Whether a branch without an
/// organization is meaningful is decided by the scope rules downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext(pub AccessContext);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        access_context_from_headers(&parts.headers)
            .map(Self)
            .map_err(ApiError::from)
    }
}

fn access_context_from_headers(headers: &HeaderMap) -> Result<AccessContext, AppError> {
    let organization_id = uuid_header(headers, ORGANIZATION_HEADER)?.map(OrganizationId::from_uuid);
    let branch_id = uuid_header(headers, BRANCH_HEADER)?.map(BranchId::from_uuid);

    Ok(AccessContext::new(organization_id, branch_id))
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::Validation(format!("{name} header must be ASCII")))?
        .trim();
    if value.is_empty() {
        return Ok(None);
    }

    Uuid::parse_str(value)
        .map(Some)
        .map_err(|error| AppError::Validation(format!("invalid {name} header: {error}")))
}

fn is_same_origin(headers: &HeaderMap, allowed_origin: &str) -> bool {
    if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
        return false;
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    origin == allowed_origin
        || referer == allowed_origin
        || referer.starts_with(format!("{allowed_origin}/").as_str())
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
