//! System settings repository trait (port)
//!
//! Key/value flags, currently only the one-shot bootstrap guard.

use async_trait::async_trait;

use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemSettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
}
