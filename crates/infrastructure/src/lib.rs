//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_catalog_repository;
mod postgres_user_repository;
mod sqlx_errors;

pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_user_repository::PostgresUserRepository;
