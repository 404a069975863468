use std::collections::BTreeSet;

use async_trait::async_trait;
use rolegrid_core::{AppResult, RoleId, UserId};
use rolegrid_domain::{AssignmentKey, RoleAssignment, Scope};

/// Repository port owning role assignment records.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persists a new assignment.
    ///
    /// Fails with `AppError::DuplicateAssignment` when the exact key exists.
    async fn insert_assignment(&self, key: AssignmentKey) -> AppResult<RoleAssignment>;

    /// Deletes the assignment with the exact key and returns the number of
    /// removed rows. Removing a missing key returns `0`.
    async fn remove_assignment(&self, key: AssignmentKey) -> AppResult<u64>;

    /// Lists every assignment of a user, across all scopes.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists assignments stored with exactly the given scope.
    async fn list_for_user_and_scope(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Opens a unit of work over one `(user, scope)` pair. Concurrent units of
    /// work for the same pair are serialized by the store.
    async fn begin_scope_sync(
        &self,
        user_id: UserId,
        scope: Scope,
    ) -> AppResult<Box<dyn ScopeSyncTransaction>>;
}

/// Unit of work used by the role sync engine.
///
/// Changes become visible only on [`ScopeSyncTransaction::commit`]; dropping
/// the transaction discards them.
#[async_trait]
pub trait ScopeSyncTransaction: Send {
    /// Returns the role ids currently assigned in the transaction scope.
    async fn current_role_ids(&mut self) -> AppResult<BTreeSet<RoleId>>;

    /// Attaches a role. Returns `false` when it was already attached.
    async fn attach_role(&mut self, role_id: RoleId) -> AppResult<bool>;

    /// Detaches a role and returns the number of removed rows.
    async fn detach_role(&mut self, role_id: RoleId) -> AppResult<u64>;

    /// Commits every staged change atomically.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
