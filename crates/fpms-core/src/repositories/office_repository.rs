//! Office repository trait (port)

use async_trait::async_trait;

use crate::domain::Office;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfficeRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Office>, DomainError>;
    async fn create(&self, office: &Office) -> Result<Office, DomainError>;
    /// Every office strictly below `code` in the tree, excluding `code`
    /// itself.
    async fn list_descendants(&self, code: &str) -> Result<Vec<Office>, DomainError>;
}
