use super::*;

impl PostgresCatalogRepository {
    pub(super) async fn list_permissions_impl(&self) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, slug, name, permission_group
            FROM permissions
            ORDER BY permission_group NULLS FIRST, slug
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error(error, "list permissions"))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    pub(super) async fn find_permission_impl(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, slug, name, permission_group
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| store_error(error, "find permission"))?
        .map(Permission::try_from)
        .transpose()
    }

    pub(super) async fn create_permission_impl(
        &self,
        input: CreatePermissionInput,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (slug, name, permission_group)
            VALUES ($1, $2, $3)
            RETURNING id, slug, name, permission_group
            "#,
        )
        .bind(input.slug.as_str())
        .bind(input.name.as_str())
        .bind(input.group.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            permission_write_error(error, input.slug.as_str(), "create permission")
        })?;

        Permission::try_from(row)
    }

    pub(super) async fn update_permission_impl(
        &self,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        let slug_label = input.slug.clone().unwrap_or_default();
        let clear_or_set_group = input.group.is_some();

        sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE permissions
            SET slug = COALESCE($2, slug),
                name = COALESCE($3, name),
                permission_group = CASE WHEN $4 THEN $5 ELSE permission_group END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, slug, name, permission_group
            "#,
        )
        .bind(permission_id.as_uuid())
        .bind(input.slug)
        .bind(input.name)
        .bind(clear_or_set_group)
        .bind(input.group.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| permission_write_error(error, slug_label.as_str(), "update permission"))?
        .ok_or_else(|| AppError::NotFound(format!("permission '{permission_id}' was not found")))
        .and_then(Permission::try_from)
    }

    pub(super) async fn delete_permission_impl(&self, permission_id: PermissionId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    return AppError::Conflict(format!(
                        "permission '{permission_id}' is still granted by a role"
                    ));
                }
                store_error(error, "delete permission")
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        Ok(())
    }
}
