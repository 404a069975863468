//! Fakes behind the application ports, shared by service tests.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rolegrid_core::{
    AppError, AppResult, AssignmentId, BranchId, OrganizationId, PermissionId, RoleId, UserId,
    UserIdentity,
};
use rolegrid_domain::{
    AdminPermission, AssignmentKey, EmailAddress, Permission, Role, RoleAssignment, Scope,
    UserAccount,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, CatalogAdminRepository,
    CreatePermissionInput, CreateRoleInput, CreateUserInput, PermissionSyncResult, RoleCatalog,
    ScopeSyncTransaction, SortOrder, UpdatePermissionInput, UpdateRoleInput, UpdateUserInput,
    UserListQuery, UserPage, UserRepository, UserSortField,
};

pub(crate) fn organization(seed: u128) -> OrganizationId {
    OrganizationId::from_uuid(Uuid::from_u128(seed))
}

pub(crate) fn branch(seed: u128) -> BranchId {
    BranchId::from_uuid(Uuid::from_u128(seed))
}

pub(crate) fn permission(slug: &str) -> Permission {
    match Permission::new(PermissionId::new(), slug, slug, None) {
        Ok(permission) => permission,
        Err(error) => panic!("invalid permission fixture '{slug}': {error}"),
    }
}

pub(crate) fn role(slug: &str, permissions: &[Permission]) -> Role {
    match Role::new(RoleId::new(), slug, slug, 10, None) {
        Ok(role) => role.with_permissions(permissions.to_vec()),
        Err(error) => panic!("invalid role fixture '{slug}': {error}"),
    }
}

/// Role granting every admin permission.
pub(crate) fn admin_role() -> Role {
    let permissions = AdminPermission::all()
        .iter()
        .map(|admin_permission| permission(admin_permission.as_str()))
        .collect::<Vec<_>>();
    match Role::new(RoleId::new(), "admin", "Administrator", 100, None) {
        Ok(role) => role.with_permissions(permissions),
        Err(error) => panic!("invalid admin role fixture: {error}"),
    }
}

pub(crate) fn actor(user_id: UserId) -> UserIdentity {
    UserIdentity::new(user_id, "console|admin", "Admin", None)
}

pub(crate) fn user_account(user_id: UserId, name: &str, email: &str) -> UserAccount {
    UserAccount {
        user_id,
        name: name.to_owned(),
        email: email.to_owned(),
        console_user_id: None,
        created_at: "2026-01-01T00:00:00Z".to_owned(),
        updated_at: "2026-01-01T00:00:00Z".to_owned(),
    }
}

#[derive(Default)]
pub(crate) struct FakeAssignmentRepository {
    records: Arc<Mutex<Vec<RoleAssignment>>>,
    unavailable: bool,
    fail_detach: bool,
    transactions_started: AtomicUsize,
}

impl FakeAssignmentRepository {
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_detach() -> Self {
        Self {
            fail_detach: true,
            ..Self::default()
        }
    }

    pub(crate) fn transactions_started(&self) -> usize {
        self.transactions_started.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::StoreUnavailable("fake store is down".to_owned()));
        }

        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for FakeAssignmentRepository {
    async fn insert_assignment(&self, key: AssignmentKey) -> AppResult<RoleAssignment> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;

        if records.iter().any(|record| record.key() == key) {
            return Err(AppError::DuplicateAssignment(format!(
                "role '{}' is already assigned",
                key.role_id
            )));
        }

        let assignment = RoleAssignment {
            assignment_id: AssignmentId::new(),
            user_id: key.user_id,
            role_id: key.role_id,
            scope: key.scope,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        };
        records.push(assignment.clone());
        Ok(assignment)
    }

    async fn remove_assignment(&self, key: AssignmentKey) -> AppResult<u64> {
        self.ensure_available()?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| record.key() != key);
        Ok((before - records.len()) as u64)
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        self.ensure_available()?;
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_for_user_and_scope(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.ensure_available()?;
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|record| record.user_id == user_id && record.scope == scope)
            .cloned()
            .collect())
    }

    async fn begin_scope_sync(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Box<dyn ScopeSyncTransaction>> {
        self.transactions_started.fetch_add(1, Ordering::SeqCst);
        self.ensure_available()?;

        // Held until commit or drop, which serializes syncs.
        let records = self.records.clone().lock_owned().await;

        Ok(Box::new(FakeScopeSyncTransaction {
            records,
            user_id,
            scope,
            staged_attach: BTreeSet::new(),
            staged_detach: BTreeSet::new(),
            fail_detach: self.fail_detach,
        }))
    }
}

struct FakeScopeSyncTransaction {
    records: OwnedMutexGuard<Vec<RoleAssignment>>,
    user_id: UserId,
    scope: Scope,
    staged_attach: BTreeSet<RoleId>,
    staged_detach: BTreeSet<RoleId>,
    fail_detach: bool,
}

#[async_trait]
impl ScopeSyncTransaction for FakeScopeSyncTransaction {
    async fn current_role_ids(&mut self) -> AppResult<BTreeSet<RoleId>> {
        let mut role_ids = self
            .records
            .iter()
            .filter(|record| record.user_id == self.user_id && record.scope == self.scope)
            .map(|record| record.role_id)
            .collect::<BTreeSet<_>>();
        role_ids.extend(self.staged_attach.iter().copied());
        role_ids.retain(|role_id| !self.staged_detach.contains(role_id));
        Ok(role_ids)
    }

    async fn attach_role(&mut self, role_id: RoleId) -> AppResult<bool> {
        if self.current_role_ids().await?.contains(&role_id) {
            return Ok(false);
        }

        self.staged_detach.remove(&role_id);
        self.staged_attach.insert(role_id);
        Ok(true)
    }

    async fn detach_role(&mut self, role_id: RoleId) -> AppResult<u64> {
        if self.fail_detach {
            return Err(AppError::StoreUnavailable(
                "fake store dropped the connection".to_owned(),
            ));
        }

        if !self.current_role_ids().await?.contains(&role_id) {
            return Ok(0);
        }

        self.staged_attach.remove(&role_id);
        self.staged_detach.insert(role_id);
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Self {
            mut records,
            user_id,
            scope,
            staged_attach,
            staged_detach,
            ..
        } = *self;

        records.retain(|record| {
            !(record.user_id == user_id
                && record.scope == scope
                && staged_detach.contains(&record.role_id))
        });
        for role_id in staged_attach {
            records.push(RoleAssignment {
                assignment_id: AssignmentId::new(),
                user_id,
                role_id,
                scope,
                created_at: "2026-01-01T00:00:00Z".to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleCatalog {
    roles: Mutex<Vec<Role>>,
    permissions: Mutex<Vec<Permission>>,
}

impl FakeRoleCatalog {
    pub(crate) fn with_roles(roles: Vec<Role>) -> Self {
        let mut permissions = roles
            .iter()
            .flat_map(|role| role.permissions().iter().cloned())
            .collect::<Vec<_>>();
        permissions.sort_by(|left, right| left.slug().cmp(right.slug()));
        permissions.dedup_by(|left, right| left.slug() == right.slug());

        Self {
            roles: Mutex::new(roles),
            permissions: Mutex::new(permissions),
        }
    }

    pub(crate) async fn role_count(&self) -> usize {
        self.roles.lock().await.len()
    }
}

#[async_trait]
impl RoleCatalog for FakeRoleCatalog {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn find_role_by_slug(&self, slug: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.slug() == slug)
            .cloned())
    }

    async fn list_permissions_for_role(&self, role_id: RoleId) -> AppResult<Vec<Permission>> {
        Ok(self
            .find_role(role_id)
            .await?
            .map(|role| role.permissions().to_vec())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CatalogAdminRepository for FakeRoleCatalog {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles.iter().any(|role| role.slug() == input.slug) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.slug
            )));
        }

        let role = Role::new(
            RoleId::new(),
            input.slug.as_str(),
            input.name,
            input.level,
            input.description,
        )?;
        roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, role_id: RoleId, input: UpdateRoleInput) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let Some(position) = roles.iter().position(|role| role.id() == role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        let current = roles[position].clone();
        let updated = Role::new(
            role_id,
            current.slug(),
            input.name.unwrap_or_else(|| current.name().to_owned()),
            input.level.unwrap_or(current.level()),
            input
                .description
                .unwrap_or_else(|| current.description().map(ToOwned::to_owned)),
        )?
        .with_permissions(current.permissions().to_vec());
        roles[position] = updated.clone();
        Ok(updated)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let before = roles.len();
        roles.retain(|role| role.id() != role_id);
        if roles.len() == before {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }
        Ok(())
    }

    async fn sync_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> AppResult<PermissionSyncResult> {
        let permissions = self.permissions.lock().await.clone();
        let mut roles = self.roles.lock().await;
        let Some(position) = roles.iter().position(|role| role.id() == role_id) else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };

        let current = roles[position]
            .permissions()
            .iter()
            .map(Permission::id)
            .collect::<BTreeSet<_>>();
        let desired = permissions
            .iter()
            .filter(|permission| permission_ids.contains(&permission.id()))
            .cloned()
            .collect::<Vec<_>>();
        let desired_ids = desired.iter().map(Permission::id).collect::<BTreeSet<_>>();

        let result = PermissionSyncResult {
            attached: desired_ids.difference(&current).count() as u64,
            detached: current.difference(&desired_ids).count() as u64,
        };
        roles[position] = roles[position].clone().with_permissions(desired);
        Ok(result)
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.permissions.lock().await.clone())
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .find(|permission| permission.id() == permission_id)
            .cloned())
    }

    async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().await;
        if permissions
            .iter()
            .any(|permission| permission.slug() == input.slug)
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                input.slug
            )));
        }

        let permission = Permission::new(
            PermissionId::new(),
            input.slug.as_str(),
            input.name,
            input.group,
        )?;
        permissions.push(permission.clone());
        Ok(permission)
    }

    async fn update_permission(
        &self,
        permission_id: PermissionId,
        input: UpdatePermissionInput,
    ) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().await;
        let Some(position) = permissions
            .iter()
            .position(|permission| permission.id() == permission_id)
        else {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        };

        let current = permissions[position].clone();
        let updated = Permission::new(
            permission_id,
            input.slug.as_deref().unwrap_or(current.slug()),
            input.name.unwrap_or_else(|| current.name().to_owned()),
            input
                .group
                .unwrap_or_else(|| current.group().map(ToOwned::to_owned)),
        )?;
        permissions[position] = updated.clone();
        Ok(updated)
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<()> {
        let referenced = self.roles.lock().await.iter().any(|role| {
            role.permissions()
                .iter()
                .any(|permission| permission.id() == permission_id)
        });
        if referenced {
            return Err(AppError::Conflict(format!(
                "permission '{permission_id}' is still granted by a role"
            )));
        }

        self.permissions
            .lock()
            .await
            .retain(|permission| permission.id() != permission_id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeUserRepository {
    users: Mutex<Vec<UserAccount>>,
}

impl FakeUserRepository {
    pub(crate) fn with_users(users: Vec<UserAccount>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

fn sort_key(user: &UserAccount, field: UserSortField) -> &str {
    match field {
        UserSortField::Name => user.name.as_str(),
        UserSortField::Email => user.email.as_str(),
        UserSortField::CreatedAt => user.created_at.as_str(),
        UserSortField::UpdatedAt => user.updated_at.as_str(),
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email.as_str())
            .cloned())
    }

    async fn list_users(&self, query: UserListQuery) -> AppResult<UserPage> {
        let needle = query.search.map(|value| value.to_lowercase());
        let mut matching = self
            .users
            .lock()
            .await
            .iter()
            .filter(|user| {
                needle.as_deref().is_none_or(|needle| {
                    user.name.to_lowercase().contains(needle) || user.email.contains(needle)
                })
            })
            .cloned()
            .collect::<Vec<_>>();

        matching.sort_by(|left, right| {
            let ordering = sort_key(left, query.sort.field)
                .cmp(sort_key(right, query.sort.field))
                .then_with(|| left.user_id.as_uuid().cmp(&right.user_id.as_uuid()));
            match query.sort.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let offset = (query.page.saturating_sub(1) * query.per_page) as usize;
        Ok(UserPage {
            total: matching.len() as u64,
            users: matching
                .into_iter()
                .skip(offset)
                .take(query.per_page as usize)
                .collect(),
        })
    }

    async fn create_user(&self, input: CreateUserInput) -> AppResult<UserAccount> {
        let mut users = self.users.lock().await;
        if users.iter().any(|user| user.email == input.email.as_str()) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already taken",
                input.email.as_str()
            )));
        }

        let mut user = user_account(UserId::new(), input.name.as_str(), input.email.as_str());
        user.console_user_id = input.console_user_id;
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        input: UpdateUserInput,
    ) -> AppResult<UserAccount> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|user| user.user_id == user_id) else {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        };

        if let Some(name) = input.name {
            user.name = name;
        }
        if let Some(email) = input.email {
            user.email = email.into();
        }
        if let Some(console_user_id) = input.console_user_id {
            user.console_user_id = console_user_id;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|user| user.user_id != user_id);
        if users.len() == before {
            return Err(AppError::NotFound(format!("user '{user_id}' was not found")));
        }

        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    unavailable: bool,
}

impl FakeAuditRepository {
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::StoreUnavailable("fake audit log is down".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}
