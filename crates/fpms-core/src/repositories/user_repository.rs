//! User repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AuditLogEntry, Role, User};
use crate::error::DomainError;
use fpms_shared::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    async fn deactivate(&self, id: &Uuid, removed_by: &Uuid) -> Result<(), DomainError>;

    async fn list_by_offices(
        &self,
        office_codes: &[String],
        page: Pagination,
    ) -> Result<Vec<User>, DomainError>;
    async fn search(
        &self,
        office_codes: &[String],
        query: &str,
        page: Pagination,
    ) -> Result<Vec<User>, DomainError>;
    async fn count_by_role(
        &self,
        office_codes: &[String],
    ) -> Result<Vec<(Role, i64)>, DomainError>;

    async fn record_login_success(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
    async fn record_login_failure(
        &self,
        id: &Uuid,
        failed_attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError>;

    /// Atomically updates the hash, archives the previous one into
    /// password_history, and appends the audit entry in a single
    /// transaction.
    async fn update_password(
        &self,
        id: &Uuid,
        new_hash: &str,
        audit: &AuditLogEntry,
    ) -> Result<(), DomainError>;

    /// Current hash plus the most recent archived hashes, newest first.
    async fn recent_password_hashes(
        &self,
        id: &Uuid,
        limit: u32,
    ) -> Result<Vec<String>, DomainError>;
}
