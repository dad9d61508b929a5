//! Session repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Session;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session, DomainError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Session>, DomainError>;
    async fn touch(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
    async fn revoke(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
