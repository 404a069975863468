use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rolegrid_core::{AppResult, UserId};
use rolegrid_domain::{AccessContext, Permission, RoleAssignment};
use tracing::debug;

use crate::{AssignmentRepository, RoleCatalog};

/// Computes the permissions a user holds in an organization/branch context.
#[derive(Clone)]
pub struct EffectivePermissionResolver {
    assignments: Arc<dyn AssignmentRepository>,
    catalog: Arc<dyn RoleCatalog>,
}

impl EffectivePermissionResolver {
    /// Creates a resolver over the assignment store and role catalog.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentRepository>, catalog: Arc<dyn RoleCatalog>) -> Self {
        Self {
            assignments,
            catalog,
        }
    }

    /// Returns the user's assignments whose scope applies in the context.
    pub async fn matching_assignments(
        &self,
        user_id: UserId,
        context: &AccessContext,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|assignment| assignment.scope.applies_to(context))
            .collect())
    }

    /// Returns the union of permissions granted by every matching assignment,
    /// de-duplicated and ordered by slug.
    ///
    /// Assignments that reference a role missing from the catalog are skipped.
    pub async fn resolve_effective_permissions(
        &self,
        user_id: UserId,
        context: &AccessContext,
    ) -> AppResult<Vec<Permission>> {
        let role_ids = self
            .matching_assignments(user_id, context)
            .await?
            .into_iter()
            .map(|assignment| assignment.role_id)
            .collect::<BTreeSet<_>>();

        let mut by_slug = BTreeMap::new();
        for role_id in role_ids {
            let Some(role) = self.catalog.find_role(role_id).await? else {
                debug!(%user_id, %role_id, "skipping assignment with unknown role");
                continue;
            };

            for permission in role.permissions() {
                by_slug
                    .entry(permission.slug().to_owned())
                    .or_insert_with(|| permission.clone());
            }
        }

        Ok(by_slug.into_values().collect())
    }

    /// Returns whether the user holds the permission slug in the context.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        context: &AccessContext,
        slug: &str,
    ) -> AppResult<bool> {
        Ok(self
            .resolve_effective_permissions(user_id, context)
            .await?
            .iter()
            .any(|permission| permission.slug() == slug))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rolegrid_core::{AppError, RoleId, UserId};
    use rolegrid_domain::{AccessContext, AssignmentKey, Scope};

    use crate::AssignmentRepository;
    use crate::test_support::{
        FakeAssignmentRepository, FakeRoleCatalog, branch, organization, permission, role,
    };

    use super::EffectivePermissionResolver;

    fn resolver(
        assignments: Arc<FakeAssignmentRepository>,
        catalog: FakeRoleCatalog,
    ) -> EffectivePermissionResolver {
        EffectivePermissionResolver::new(assignments, Arc::new(catalog))
    }

    #[tokio::test]
    async fn user_without_assignments_has_no_permissions() {
        let resolver = resolver(
            Arc::new(FakeAssignmentRepository::default()),
            FakeRoleCatalog::default(),
        );

        let permissions = resolver
            .resolve_effective_permissions(UserId::new(), &AccessContext::default())
            .await;

        assert!(matches!(permissions, Ok(values) if values.is_empty()));
    }

    #[tokio::test]
    async fn global_and_branch_grants_are_unioned_without_duplicates() {
        let user_id = UserId::new();
        let role_a = role("role-a", &[permission("x"), permission("y")]);
        let role_b = role("role-b", &[permission("y"), permission("z")]);
        let assignments = Arc::new(FakeAssignmentRepository::default());

        let global = assignments
            .insert_assignment(AssignmentKey::new(user_id, role_a.id(), Scope::Global))
            .await;
        let branch_grant = assignments
            .insert_assignment(AssignmentKey::new(
                user_id,
                role_b.id(),
                Scope::Branch {
                    organization_id: organization(5),
                    branch_id: branch(2),
                },
            ))
            .await;
        assert!(global.is_ok() && branch_grant.is_ok());

        let resolver = resolver(assignments, FakeRoleCatalog::with_roles(vec![role_a, role_b]));
        let permissions = resolver
            .resolve_effective_permissions(
                user_id,
                &AccessContext::new(Some(organization(5)), Some(branch(2))),
            )
            .await
            .unwrap_or_default();

        let slugs = permissions
            .iter()
            .map(|permission| permission.slug())
            .collect::<Vec<_>>();
        assert_eq!(slugs, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn branch_grant_is_ignored_in_other_branch() {
        let user_id = UserId::new();
        let role_a = role("role-a", &[permission("x")]);
        let role_b = role("role-b", &[permission("z")]);
        let assignments = Arc::new(FakeAssignmentRepository::default());

        for (role_id, scope) in [
            (role_a.id(), Scope::Global),
            (
                role_b.id(),
                Scope::Branch {
                    organization_id: organization(5),
                    branch_id: branch(2),
                },
            ),
        ] {
            let inserted = assignments
                .insert_assignment(AssignmentKey::new(user_id, role_id, scope))
                .await;
            assert!(inserted.is_ok());
        }

        let resolver = resolver(assignments, FakeRoleCatalog::with_roles(vec![role_a, role_b]));
        let permissions = resolver
            .resolve_effective_permissions(
                user_id,
                &AccessContext::new(Some(organization(5)), Some(branch(3))),
            )
            .await
            .unwrap_or_default();

        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].slug(), "x");
    }

    #[tokio::test]
    async fn stale_role_reference_is_skipped() {
        let user_id = UserId::new();
        let known = role("known", &[permission("app.users.view")]);
        let assignments = Arc::new(FakeAssignmentRepository::default());

        for role_id in [known.id(), RoleId::new()] {
            let inserted = assignments
                .insert_assignment(AssignmentKey::new(user_id, role_id, Scope::Global))
                .await;
            assert!(inserted.is_ok());
        }

        let resolver = resolver(assignments, FakeRoleCatalog::with_roles(vec![known]));
        let permissions = resolver
            .resolve_effective_permissions(user_id, &AccessContext::default())
            .await;

        assert!(matches!(permissions, Ok(values) if values.len() == 1));
    }

    #[tokio::test]
    async fn store_failure_is_propagated() {
        let assignments = Arc::new(FakeAssignmentRepository::unavailable());
        let resolver = resolver(assignments, FakeRoleCatalog::default());

        let result = resolver
            .resolve_effective_permissions(UserId::new(), &AccessContext::default())
            .await;

        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn has_permission_checks_slug_in_context() {
        let user_id = UserId::new();
        let manager = role("branch-manager", &[permission("app.users.update")]);
        let assignments = Arc::new(FakeAssignmentRepository::default());
        let inserted = assignments
            .insert_assignment(AssignmentKey::new(
                user_id,
                manager.id(),
                Scope::OrgWide {
                    organization_id: organization(5),
                },
            ))
            .await;
        assert!(inserted.is_ok());

        let resolver = resolver(assignments, FakeRoleCatalog::with_roles(vec![manager]));

        let inside = resolver
            .has_permission(
                user_id,
                &AccessContext::new(Some(organization(5)), Some(branch(1))),
                "app.users.update",
            )
            .await;
        let outside = resolver
            .has_permission(
                user_id,
                &AccessContext::new(Some(organization(7)), None),
                "app.users.update",
            )
            .await;

        assert!(matches!(inside, Ok(true)));
        assert!(matches!(outside, Ok(false)));
    }
}
