//! PostgreSQL-backed mirror of SSO users.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::PgPool;

use rolegrid_application::{
    CreateUserInput, SortOrder, UpdateUserInput, UserListQuery, UserPage, UserRepository,
    UserSort, UserSortField,
};
use rolegrid_core::{AppError, AppResult, UserId};
use rolegrid_domain::{EmailAddress, UserAccount};

use crate::sqlx_errors::{is_unique_violation, store_error};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    name: String,
    email: String,
    console_user_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            console_user_id: row.console_user_id,
            created_at: row.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            updated_at: row.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Escapes `LIKE` wildcards in a user supplied search term.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// `ORDER BY` clause for a sort request, built from fixed column names only.
fn order_clause(sort: UserSort) -> &'static str {
    match (sort.field, sort.order) {
        (UserSortField::Name, SortOrder::Asc) => "name ASC, id ASC",
        (UserSortField::Name, SortOrder::Desc) => "name DESC, id DESC",
        (UserSortField::Email, SortOrder::Asc) => "email ASC, id ASC",
        (UserSortField::Email, SortOrder::Desc) => "email DESC, id DESC",
        (UserSortField::CreatedAt, SortOrder::Asc) => "created_at ASC, id ASC",
        (UserSortField::CreatedAt, SortOrder::Desc) => "created_at DESC, id DESC",
        (UserSortField::UpdatedAt, SortOrder::Asc) => "updated_at ASC, id ASC",
        (UserSortField::UpdatedAt, SortOrder::Desc) => "updated_at DESC, id DESC",
    }
}

fn user_write_error(error: sqlx::Error, operation: &str) -> AppError {
    if is_unique_violation(&error) {
        return AppError::Conflict(
            "a user with this email or console id already exists".to_owned(),
        );
    }

    store_error(error, operation)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, console_user_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(error, "find user by id"))?;

        Ok(row.map(UserAccount::from))
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, console_user_id, created_at, updated_at
            FROM users
            WHERE LOWER(email) = $1
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(error, "find user by email"))?;

        Ok(row.map(UserAccount::from))
    }

    async fn list_users(&self, query: UserListQuery) -> AppResult<UserPage> {
        let pattern = query.search.as_deref().map(like_pattern);
        let limit = i64::from(query.per_page);
        let offset = i64::from(query.page.saturating_sub(1)) * limit;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error(error, "count users"))?;

        let statement = format!(
            r#"
            SELECT id, name, email, console_user_id, created_at, updated_at
            FROM users
            WHERE $1::text IS NULL OR name ILIKE $1 OR email ILIKE $1
            ORDER BY {}
            LIMIT $2 OFFSET $3
            "#,
            order_clause(query.sort)
        );

        let rows = sqlx::query_as::<_, UserRow>(statement.as_str())
            .bind(pattern.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error(error, "list users"))?;

        Ok(UserPage {
            users: rows.into_iter().map(UserAccount::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, console_user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, console_user_id, created_at, updated_at
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.email.as_str())
        .bind(input.console_user_id.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| user_write_error(error, "create user"))?;

        Ok(UserAccount::from(row))
    }

    async fn update_user(
        &self,
        user_id: UserId,
        input: UpdateUserInput,
    ) -> AppResult<UserAccount> {
        let set_console_user_id = input.console_user_id.is_some();

        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                console_user_id = CASE WHEN $4 THEN $5 ELSE console_user_id END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, console_user_id, created_at, updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(input.name)
        .bind(input.email.map(String::from))
        .bind(set_console_user_id)
        .bind(input.console_user_id.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| user_write_error(error, "update user"))?
        .map(UserAccount::from)
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| store_error(error, "delete user"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' was not found"
            )));
        }

        Ok(())
    }
}
