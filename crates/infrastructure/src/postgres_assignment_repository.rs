use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use rolegrid_application::{AssignmentRepository, ScopeSyncTransaction};
use rolegrid_core::{AppError, AppResult, AssignmentId, BranchId, OrganizationId, RoleId, UserId};
use rolegrid_domain::{AssignmentKey, RoleAssignment, Scope};

use crate::sqlx_errors::{is_foreign_key_violation, is_unique_violation, store_error};


/// PostgreSQL-backed role assignment store.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    org_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    created_at: String,
}

impl TryFrom<AssignmentRow> for RoleAssignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let scope = Scope::from_parts(
            row.org_id.map(OrganizationId::from_uuid),
            row.branch_id.map(BranchId::from_uuid),
        )
        .map_err(|error| {
            AppError::Internal(format!("stored assignment '{}' is corrupt: {error}", row.id))
        })?;

        Ok(Self {
            assignment_id: AssignmentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            role_id: RoleId::from_uuid(row.role_id),
            scope,
            created_at: row.created_at,
        })
    }
}

/// Nullable `(org_id, branch_id)` columns for a scope.
fn scope_columns(scope: Scope) -> (Option<Uuid>, Option<Uuid>) {
    (
        scope.organization_id().map(|id| id.as_uuid()),
        scope.branch_id().map(|id| id.as_uuid()),
    )
}

fn advisory_lock_key(user_id: UserId, scope: Scope) -> String {
    let (org_id, branch_id) = scope_columns(scope);
    format!(
        "role_assignments:{user_id}:{}:{}",
        org_id.map(|id| id.to_string()).unwrap_or_default(),
        branch_id.map(|id| id.to_string()).unwrap_or_default()
    )
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn insert_assignment(&self, key: AssignmentKey) -> AppResult<RoleAssignment> {
        let (org_id, branch_id) = scope_columns(key.scope);

        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO role_assignments (user_id, role_id, org_id, branch_id)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id,
                user_id,
                role_id,
                org_id,
                branch_id,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            "#,
        )
        .bind(key.user_id.as_uuid())
        .bind(key.role_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return AppError::DuplicateAssignment(format!(
                    "role '{}' is already assigned to user '{}' in {}",
                    key.role_id, key.user_id, key.scope
                ));
            }
            if is_foreign_key_violation(&error) {
                return AppError::NotFound(format!(
                    "user '{}' or role '{}' was not found",
                    key.user_id, key.role_id
                ));
            }
            store_error(error, "insert role assignment")
        })?;

        RoleAssignment::try_from(row)
    }

    async fn remove_assignment(&self, key: AssignmentKey) -> AppResult<u64> {
        let (org_id, branch_id) = scope_columns(key.scope);

        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE user_id = $1
              AND role_id = $2
              AND org_id IS NOT DISTINCT FROM $3
              AND branch_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(key.user_id.as_uuid())
        .bind(key.role_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .execute(&self.pool)
        .await
        .map_err(|error| store_error(error, "remove role assignment"))?;

        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id,
                user_id,
                role_id,
                org_id,
                branch_id,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM role_assignments
            WHERE user_id = $1
            ORDER BY role_assignments.created_at, role_assignments.id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(error, "list role assignments"))?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    async fn list_for_user_and_scope(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Vec<RoleAssignment>> {
        let (org_id, branch_id) = scope_columns(scope);

        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id,
                user_id,
                role_id,
                org_id,
                branch_id,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM role_assignments
            WHERE user_id = $1
              AND org_id IS NOT DISTINCT FROM $2
              AND branch_id IS NOT DISTINCT FROM $3
            ORDER BY role_assignments.created_at, role_assignments.id
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(error, "list scoped role assignments"))?;

        rows.into_iter().map(RoleAssignment::try_from).collect()
    }

    async fn begin_scope_sync(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Box<dyn ScopeSyncTransaction>> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error(error, "begin role sync transaction"))?;

        // Held until commit or rollback; the snapshot of each later statement
        // is taken after the lock is granted.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(advisory_lock_key(user_id, scope))
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error(error, "lock role sync scope"))?;

        debug!(%user_id, %scope, "acquired role sync lock");

        Ok(Box::new(PostgresScopeSyncTransaction {
            transaction,
            user_id,
            scope,
        }))
    }
}

struct PostgresScopeSyncTransaction {
    transaction: Transaction<'static, Postgres>,
    user_id: UserId,
    scope: Scope,
}

#[async_trait]
impl ScopeSyncTransaction for PostgresScopeSyncTransaction {
    async fn current_role_ids(&mut self) -> AppResult<BTreeSet<RoleId>> {
        let (org_id, branch_id) = scope_columns(self.scope);

        let role_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM role_assignments
            WHERE user_id = $1
              AND org_id IS NOT DISTINCT FROM $2
              AND branch_id IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(self.user_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .fetch_all(&mut *self.transaction)
        .await
        .map_err(|error| store_error(error, "read current scope roles"))?;

        Ok(role_ids.into_iter().map(RoleId::from_uuid).collect())
    }

    async fn attach_role(&mut self, role_id: RoleId) -> AppResult<bool> {
        let user_id = self.user_id;
        let (org_id, branch_id) = scope_columns(self.scope);

        let result = sqlx::query(
            r#"
            INSERT INTO role_assignments (user_id, role_id, org_id, branch_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::NotFound(format!(
                    "user '{user_id}' or role '{role_id}' was not found"
                ));
            }
            store_error(error, "attach role")
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn detach_role(&mut self, role_id: RoleId) -> AppResult<u64> {
        let (org_id, branch_id) = scope_columns(self.scope);

        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE user_id = $1
              AND role_id = $2
              AND org_id IS NOT DISTINCT FROM $3
              AND branch_id IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(self.user_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(org_id)
        .bind(branch_id)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| store_error(error, "detach role"))?;

        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.transaction
            .commit()
            .await
            .map_err(|error| store_error(error, "commit role sync"))
    }
}
