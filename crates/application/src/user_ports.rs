use std::str::FromStr;

use async_trait::async_trait;
use rolegrid_core::{AppError, AppResult, UserId};
use rolegrid_domain::{EmailAddress, UserAccount};

/// Sortable columns of the users directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserSortField {
    /// Display name.
    #[default]
    Name,
    /// Login email.
    Email,
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
}

impl FromStr for UserSortField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            other => Err(AppError::Validation(format!(
                "unknown user sort field '{other}'"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "sort order must be 'asc' or 'desc', got '{value}'"
            ))),
        }
    }
}

/// Requested ordering; ties are broken by user id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserSort {
    /// Column to sort by.
    pub field: UserSortField,
    /// Direction.
    pub order: SortOrder,
}

/// Offset pagination, search and ordering for the users directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Ordering.
    pub sort: UserSort,
}

/// One page of users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    /// Users on the requested page.
    pub users: Vec<UserAccount>,
    /// Total users matching the query.
    pub total: u64,
}

/// Validated input for creating a local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Display name.
    pub name: String,
    /// Login email, unique across users.
    pub email: EmailAddress,
    /// SSO console user id, when already known.
    pub console_user_id: Option<String>,
}

/// Partial user update. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserInput {
    /// New display name.
    pub name: Option<String>,
    /// New login email.
    pub email: Option<EmailAddress>,
    /// New console link; `Some(None)` unlinks the user.
    pub console_user_id: Option<Option<String>>,
}

/// Repository port for the local users directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Finds a user by login email.
    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>>;

    /// Lists one page of users in the requested order.
    async fn list_users(&self, query: UserListQuery) -> AppResult<UserPage>;

    /// Creates a user. A taken email or console id is a `Conflict`.
    async fn create_user(&self, input: CreateUserInput) -> AppResult<UserAccount>;

    /// Applies a partial update. Fails with `NotFound` for unknown users.
    async fn update_user(&self, user_id: UserId, input: UpdateUserInput)
    -> AppResult<UserAccount>;

    /// Deletes a user together with its role assignments.
    async fn delete_user(&self, user_id: UserId) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{SortOrder, UserSortField};

    #[test]
    fn sort_values_parse_from_query_strings() {
        assert!(matches!(
            UserSortField::from_str("created_at"),
            Ok(UserSortField::CreatedAt)
        ));
        assert!(matches!(SortOrder::from_str("DESC"), Ok(SortOrder::Desc)));
        assert!(UserSortField::from_str("password").is_err());
        assert!(SortOrder::from_str("sideways").is_err());
    }
}
