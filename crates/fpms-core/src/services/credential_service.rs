// ============================================================================
// FPMS Core - Credential Service
// File: crates/fpms-core/src/services/credential_service.rs
// ============================================================================
//! Password change (self-service) and password reset (administrative).
//!
//! Both paths go through `UserRepository::update_password`, which runs
//! hash update, history archival, and audit insert in one transaction.
//! Generated plaintext is returned to the caller exactly once and never
//! persisted or logged.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AuditAction, AuditLogEntry, User};
use crate::error::DomainError;
use crate::repositories::UserRepository;
use crate::services::AccessControlService;
use fpms_security::password::{PasswordPolicy, PasswordService};
use fpms_shared::ClientInfo;

pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    access: Arc<AccessControlService>,
    policy: PasswordPolicy,
    history_depth: u32,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        access: Arc<AccessControlService>,
        policy: PasswordPolicy,
        history_depth: u32,
    ) -> Self {
        Self { users, access, policy, history_depth }
    }

    /// Self-service password change: requires the current password.
    pub async fn change_password(
        &self,
        user: &User,
        current: &str,
        new: &str,
        client: &ClientInfo,
    ) -> Result<(), DomainError> {
        let current_valid = PasswordService::verify(current, &user.password_hash)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        if !current_valid {
            warn!("Password change refused: wrong current password: {}", user.username);
            return Err(DomainError::InvalidCredentials);
        }

        self.policy
            .check_chosen(new)
            .map_err(|e| DomainError::PasswordRejected(e.to_string()))?;

        self.reject_recent_reuse(&user.id, new).await?;

        let new_hash = PasswordService::hash(new)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let audit = AuditLogEntry::new(Some(user.id), AuditAction::PasswordChanged, client)
            .on_record("users", user.id);

        self.users.update_password(&user.id, &new_hash, &audit).await?;

        info!("Password changed for: {}", user.username);
        Ok(())
    }

    /// Administrative reset within the requester's jurisdiction. Returns
    /// the generated plaintext for one-time display to the operator.
    pub async fn reset_password(
        &self,
        requester: &User,
        target_id: &Uuid,
        client: &ClientInfo,
    ) -> Result<String, DomainError> {
        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        self.access
            .ensure_can_manage(requester, target.role, &target.office_code)
            .await?;

        let plaintext = PasswordService::generate();
        let new_hash = PasswordService::hash(&plaintext)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let audit = AuditLogEntry::new(Some(requester.id), AuditAction::PasswordReset, client)
            .on_record("users", target.id);

        self.users.update_password(&target.id, &new_hash, &audit).await?;

        info!(
            "Password reset for {} by {}",
            target.username, requester.username
        );
        Ok(plaintext)
    }

    async fn reject_recent_reuse(&self, user_id: &Uuid, new: &str) -> Result<(), DomainError> {
        let recent = self
            .users
            .recent_password_hashes(user_id, self.history_depth)
            .await?;
        for hash in &recent {
            let reused = PasswordService::verify(new, hash)
                .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
            if reused {
                return Err(DomainError::PasswordRecentlyUsed);
            }
        }
        Ok(())
    }
}
