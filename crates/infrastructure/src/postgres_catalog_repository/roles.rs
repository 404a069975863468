use super::*;

use tracing::info;

const ROLE_SELECT: &str = r#"
    SELECT
        roles.id AS role_id,
        roles.slug AS role_slug,
        roles.name AS role_name,
        roles.level AS role_level,
        roles.description AS role_description,
        permissions.id AS permission_id,
        permissions.slug AS permission_slug,
        permissions.name AS permission_name,
        permissions.permission_group
    FROM roles
    LEFT JOIN role_permissions
        ON role_permissions.role_id = roles.id
    LEFT JOIN permissions
        ON permissions.id = role_permissions.permission_id
"#;

const ROLE_ORDER: &str = "ORDER BY roles.level DESC, roles.slug, permissions.slug";

impl PostgresCatalogRepository {
    pub(super) async fn list_roles_impl(&self) -> AppResult<Vec<Role>> {
        let sql = format!("{ROLE_SELECT} {ROLE_ORDER}");
        let rows = sqlx::query_as::<_, RoleRow>(sql.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error(error, "list roles"))?;

        aggregate_roles(rows)
    }

    pub(super) async fn find_role_impl(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let sql = format!("{ROLE_SELECT} WHERE roles.id = $1 {ROLE_ORDER}");
        let rows = sqlx::query_as::<_, RoleRow>(sql.as_str())
            .bind(role_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error(error, "find role"))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    pub(super) async fn find_role_by_slug_impl(&self, slug: &str) -> AppResult<Option<Role>> {
        let sql = format!("{ROLE_SELECT} WHERE roles.slug = $1 {ROLE_ORDER}");
        let rows = sqlx::query_as::<_, RoleRow>(sql.as_str())
            .bind(slug)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| store_error(error, "find role by slug"))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    pub(super) async fn list_permissions_for_role_impl(
        &self,
        role_id: RoleId,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permissions.id, permissions.slug, permissions.name, permissions.permission_group
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = $1
            ORDER BY permissions.slug
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(error, "list role permissions"))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    pub(super) async fn create_role_impl(&self, input: CreateRoleInput) -> AppResult<Role> {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (slug, name, level, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.slug.as_str())
        .bind(input.name.as_str())
        .bind(input.level)
        .bind(input.description.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| role_write_error(error, input.slug.as_str(), "create role"))?;

        Role::new(
            RoleId::from_uuid(role_id),
            input.slug.as_str(),
            input.name,
            input.level,
            input.description,
        )
    }

    pub(super) async fn update_role_impl(
        &self,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        let clear_or_set_description = input.description.is_some();
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name),
                level = COALESCE($3, level),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(input.name)
        .bind(input.level)
        .bind(clear_or_set_description)
        .bind(input.description.flatten())
        .execute(&self.pool)
        .await
        .map_err(|error| store_error(error, "update role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        self.find_role_impl(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    pub(super) async fn delete_role_impl(&self, role_id: RoleId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| store_error(error, "delete role"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }

    pub(super) async fn sync_role_permissions_impl(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<PermissionSyncResult> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error(error, "begin transaction"))?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
            .bind(role_id.as_uuid())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| store_error(error, "lock role"))?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        let desired = permission_ids
            .iter()
            .map(|permission_id| permission_id.as_uuid())
            .collect::<Vec<_>>();

        let detached = sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1
              AND permission_id <> ALL($2)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(&desired)
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error(error, "detach role permissions"))?
        .rows_affected();

        let attached = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, desired.permission_id
            FROM UNNEST($2::uuid[]) AS desired(permission_id)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(&desired)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                return AppError::NotFound("one or more permissions were not found".to_owned());
            }
            store_error(error, "attach role permissions")
        })?
        .rows_affected();

        transaction
            .commit()
            .await
            .map_err(|error| store_error(error, "commit role permissions"))?;

        info!(%role_id, attached, detached, "replaced role permissions");

        Ok(PermissionSyncResult { attached, detached })
    }
}
