use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rolegrid_core::{AppError, UserIdentity};
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Operator login for a user already mirrored from the SSO console.
///
/// Grants the bootstrap role globally when the user holds no assignment yet.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if !tokens_match(payload.token.as_str(), state.bootstrap_token.as_str()) {
        warn!("rejected bootstrap login with invalid token");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let Some(account) = state
        .user_directory_service
        .find_by_email(payload.email.as_str())
        .await?
    else {
        warn!("rejected bootstrap login for unknown email");
        return Err(AppError::Unauthorized("unknown bootstrap user".to_owned()).into());
    };

    let granted = state
        .user_role_service
        .ensure_bootstrap_admin(account.user_id)
        .await?;

    let identity = UserIdentity::new(
        account.user_id,
        account
            .console_user_id
            .clone()
            .unwrap_or_else(|| account.email.clone()),
        account.name.clone(),
        Some(account.email.clone()),
    );

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(user_id = %account.user_id, granted, "bootstrap login succeeded");

    Ok(StatusCode::NO_CONTENT)
}

/// Compares tokens in constant time.
fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::tokens_match;

    #[test]
    fn bootstrap_token_must_match_exactly() {
        assert!(tokens_match("operator-secret", "operator-secret"));
        assert!(!tokens_match("operator-secreT", "operator-secret"));
        assert!(!tokens_match("operator", "operator-secret"));
        assert!(!tokens_match("", "operator-secret"));
    }
}
