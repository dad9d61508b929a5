//! Audit log repository trait (port)
//!
//! Deliberately append-only: there is no update or delete surface.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::AuditLogEntry;
use crate::error::DomainError;
use fpms_shared::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogEntry, DomainError>;
    async fn list_for_user(
        &self,
        user_id: &Uuid,
        page: Pagination,
    ) -> Result<Vec<AuditLogEntry>, DomainError>;
}
