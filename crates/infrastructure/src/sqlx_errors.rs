use rolegrid_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Returns the SQLSTATE code of a database error, if any.
pub(crate) fn sqlstate(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(database_error) => {
            database_error.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    sqlstate(error).as_deref() == Some(UNIQUE_VIOLATION)
}

pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    sqlstate(error).as_deref() == Some(FOREIGN_KEY_VIOLATION)
}

/// Maps a `sqlx` failure to an application error category.
///
/// Connectivity and pool failures become `StoreUnavailable`, check violations
/// become `InvalidScope`, unique violations become `Conflict`.
pub(crate) fn store_error(error: sqlx::Error, operation: &str) -> AppError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            AppError::StoreUnavailable(format!("failed to {operation}: {error}"))
        }
        _ => match sqlstate(&error).as_deref() {
            Some(CHECK_VIOLATION) => {
                AppError::InvalidScope(format!("failed to {operation}: {error}"))
            }
            Some(UNIQUE_VIOLATION) => AppError::Conflict(format!("failed to {operation}: {error}")),
            _ => AppError::Internal(format!("failed to {operation}: {error}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use rolegrid_core::AppError;

    use super::store_error;

    #[test]
    fn pool_exhaustion_is_store_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut, "list roles"),
            AppError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn missing_row_is_internal() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound, "load role"),
            AppError::Internal(message) if message.contains("load role")
        ));
    }
}
