use std::sync::Arc;

use rolegrid_core::{AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use rolegrid_domain::{AccessContext, AdminPermission, AuditAction, EmailAddress, UserAccount};
use tracing::{info, warn};

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CreateUserInput, UpdateUserInput,
    UserListQuery, UserPage, UserRepository,
};

/// Largest accepted page size for the users directory.
pub const MAX_USERS_PER_PAGE: u32 = 100;

/// Administration of the local users directory.
#[derive(Clone)]
pub struct UserDirectoryService {
    authorization_service: AuthorizationService,
    users: Arc<dyn UserRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl UserDirectoryService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        users: Arc<dyn UserRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            users,
            audit_repository,
        }
    }

    /// Lists one page of users. Page numbers start at one and the page size is
    /// clamped to `1..=MAX_USERS_PER_PAGE`.
    pub async fn list_users(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        query: UserListQuery,
    ) -> AppResult<UserPage> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersView)
            .await?;

        let query = UserListQuery {
            search: query
                .search
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            page: query.page.max(1),
            per_page: query.per_page.clamp(1, MAX_USERS_PER_PAGE),
            sort: query.sort,
        };

        self.users.list_users(query).await
    }

    /// Returns one user.
    pub async fn get_user(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersView)
            .await?;

        self.load_user(user_id).await
    }

    /// Adds a user to the local directory.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        name: &str,
        email: &str,
        console_user_id: Option<String>,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersCreate)
            .await?;

        let input = CreateUserInput {
            name: NonEmptyString::new(name)?.into(),
            email: EmailAddress::new(email)?,
            console_user_id: normalize_console_user_id(console_user_id),
        };
        let user = self.users.create_user(input).await?;
        info!(user_id = %user.user_id, "created user");

        self.audit(
            actor,
            AuditAction::UserCreated,
            user.user_id,
            format!("created user '{}'", user.email),
        )
        .await;

        Ok(user)
    }

    /// Applies a partial update to a user.
    pub async fn update_user(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
        name: Option<String>,
        email: Option<String>,
        console_user_id: Option<Option<String>>,
    ) -> AppResult<UserAccount> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersUpdate)
            .await?;

        let input = UpdateUserInput {
            name: name
                .map(|value| NonEmptyString::new(value).map(String::from))
                .transpose()?,
            email: email.map(EmailAddress::new).transpose()?,
            console_user_id: console_user_id.map(normalize_console_user_id),
        };
        let user = self.users.update_user(user_id, input).await?;
        info!(%user_id, "updated user");

        self.audit(
            actor,
            AuditAction::UserUpdated,
            user_id,
            format!("updated user '{}'", user.email),
        )
        .await;

        Ok(user)
    }

    /// Deletes a user and every role assignment it holds.
    pub async fn delete_user(
        &self,
        actor: &UserIdentity,
        context: &AccessContext,
        user_id: UserId,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, context, AdminPermission::UsersDelete)
            .await?;

        let user = self.load_user(user_id).await?;
        self.users.delete_user(user_id).await?;
        info!(%user_id, "deleted user");

        self.audit(
            actor,
            AuditAction::UserDeleted,
            user_id,
            format!("deleted user '{}'", user.email),
        )
        .await;

        Ok(())
    }

    /// Resolves a login email to a known user without authorization.
    ///
    /// Used by operator bootstrap, which is guarded by its own token.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let email = EmailAddress::new(email)?;
        self.users.find_user_by_email(&email).await
    }

    async fn load_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' was not found")))
    }

    async fn audit(
        &self,
        actor: &UserIdentity,
        action: AuditAction,
        user_id: UserId,
        detail: String,
    ) {
        let appended = self
            .audit_repository
            .append_event(AuditEvent {
                actor_user_id: actor.user_id(),
                subject: actor.subject().to_owned(),
                action,
                resource_type: "rbac_user".to_owned(),
                resource_id: user_id.to_string(),
                detail: Some(detail),
            })
            .await;

        if let Err(error) = appended {
            warn!(%user_id, action = action.as_str(), %error, "failed to append audit event");
        }
    }
}

/// Blank console ids are stored as unlinked.
fn normalize_console_user_id(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rolegrid_core::{AppError, UserId};
    use rolegrid_domain::{AccessContext, AssignmentKey, AuditAction, Scope};

    use crate::test_support::{
        FakeAssignmentRepository, FakeAuditRepository, FakeRoleCatalog, FakeUserRepository,
        actor, admin_role, user_account,
    };
    use crate::{
        AssignmentRepository, AuthorizationService, EffectivePermissionResolver, SortOrder,
        UserListQuery, UserSort, UserSortField,
    };

    use super::UserDirectoryService;

    struct Harness {
        service: UserDirectoryService,
        audit: Arc<FakeAuditRepository>,
    }

    async fn harness(admin_id: UserId) -> Harness {
        let admin_role = admin_role();
        let assignments = Arc::new(FakeAssignmentRepository::default());
        let inserted = assignments
            .insert_assignment(AssignmentKey::new(admin_id, admin_role.id(), Scope::Global))
            .await;
        assert!(inserted.is_ok());

        let users = (0..25)
            .map(|index| {
                user_account(
                    UserId::new(),
                    &format!("User {index:02}"),
                    &format!("user{index:02}@example.com"),
                )
            })
            .chain([user_account(admin_id, "Admin", "admin@example.com")])
            .collect();
        let audit = Arc::new(FakeAuditRepository::default());

        Harness {
            service: UserDirectoryService::new(
                AuthorizationService::new(EffectivePermissionResolver::new(
                    assignments,
                    Arc::new(FakeRoleCatalog::with_roles(vec![admin_role])),
                )),
                Arc::new(FakeUserRepository::with_users(users)),
                audit.clone(),
            ),
            audit,
        }
    }

    fn query(search: Option<&str>, page: u32, per_page: u32) -> UserListQuery {
        UserListQuery {
            search: search.map(str::to_owned),
            page,
            per_page,
            sort: UserSort::default(),
        }
    }

    #[tokio::test]
    async fn list_users_pages_and_clamps_size() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;

        let page = harness
            .service
            .list_users(
                &actor(admin_id),
                &AccessContext::default(),
                query(Some("  user "), 0, 10),
            )
            .await;

        assert!(matches!(page, Ok(ref value) if value.total == 25 && value.users.len() == 10));
    }

    #[tokio::test]
    async fn list_users_honours_sort_order() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;

        let page = harness
            .service
            .list_users(
                &actor(admin_id),
                &AccessContext::default(),
                UserListQuery {
                    sort: UserSort {
                        field: UserSortField::Email,
                        order: SortOrder::Desc,
                    },
                    ..query(None, 1, 2)
                },
            )
            .await
            .map(|page| page.users)
            .unwrap_or_default();

        let emails = page.iter().map(|user| user.email.as_str()).collect::<Vec<_>>();
        assert_eq!(emails, ["user24@example.com", "user23@example.com"]);
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;

        let found = harness.service.find_by_email("ADMIN@Example.com").await;

        assert!(matches!(found, Ok(Some(user)) if user.user_id == admin_id));
    }

    #[tokio::test]
    async fn listing_requires_users_view() {
        let harness = harness(UserId::new()).await;

        let page = harness
            .service
            .list_users(
                &actor(UserId::new()),
                &AccessContext::default(),
                query(None, 1, 20),
            )
            .await;

        assert!(matches!(page, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn create_user_normalizes_and_audits() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;

        let created = harness
            .service
            .create_user(
                &actor(admin_id),
                &AccessContext::default(),
                "  Kim Branch ",
                "Kim@Example.com",
                Some("   ".to_owned()),
            )
            .await;

        assert!(matches!(
            created,
            Ok(ref user) if user.name == "Kim Branch"
                && user.email == "kim@example.com"
                && user.console_user_id.is_none()
        ));
        assert_eq!(
            harness.audit.events.lock().await[0].action,
            AuditAction::UserCreated
        );
    }

    #[tokio::test]
    async fn create_user_rejects_taken_email_and_bad_input() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;
        let admin = actor(admin_id);
        let context = AccessContext::default();

        let taken = harness
            .service
            .create_user(&admin, &context, "Copy", "user01@example.com", None)
            .await;
        let blank_name = harness
            .service
            .create_user(&admin, &context, " ", "new@example.com", None)
            .await;
        let bad_email = harness
            .service
            .create_user(&admin, &context, "New", "not-an-email", None)
            .await;

        assert!(matches!(taken, Err(AppError::Conflict(_))));
        assert!(matches!(blank_name, Err(AppError::Validation(_))));
        assert!(matches!(bad_email, Err(AppError::Validation(_))));
        assert!(harness.audit.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn update_user_changes_only_given_fields() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;

        let updated = harness
            .service
            .update_user(
                &actor(admin_id),
                &AccessContext::default(),
                admin_id,
                None,
                None,
                Some(Some("console-42".to_owned())),
            )
            .await;

        assert!(matches!(
            updated,
            Ok(ref user) if user.name == "Admin"
                && user.email == "admin@example.com"
                && user.console_user_id.as_deref() == Some("console-42")
        ));
    }

    #[tokio::test]
    async fn delete_user_removes_and_requires_grant() {
        let admin_id = UserId::new();
        let harness = harness(admin_id).await;
        let context = AccessContext::default();
        let target = harness
            .service
            .create_user(&actor(admin_id), &context, "Temp", "temp@example.com", None)
            .await;
        let Ok(target) = target else {
            panic!("fixture user should be created");
        };

        let forbidden = harness
            .service
            .delete_user(&actor(UserId::new()), &context, target.user_id)
            .await;
        let deleted = harness
            .service
            .delete_user(&actor(admin_id), &context, target.user_id)
            .await;
        let missing = harness
            .service
            .get_user(&actor(admin_id), &context, target.user_id)
            .await;

        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
        assert!(deleted.is_ok());
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }
}
