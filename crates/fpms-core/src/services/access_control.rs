// ============================================================================
// FPMS Core - Access Control Service
// File: crates/fpms-core/src/services/access_control.rs
// ============================================================================
//! Jurisdiction rule: who may manage whom.
//!
//! A requester may manage a target only when the requester's role strictly
//! outranks the target's role AND the requester's office is a proper
//! ancestor of the target's office in the jurisdiction tree. Any office
//! lookup miss denies.

use std::sync::Arc;
use tracing::warn;

use crate::domain::{Role, User};
use crate::error::DomainError;
use crate::repositories::OfficeRepository;
use fpms_shared::constants::MAX_OFFICE_CHAIN_DEPTH;

pub struct AccessControlService {
    offices: Arc<dyn OfficeRepository>,
}

impl AccessControlService {
    pub fn new(offices: Arc<dyn OfficeRepository>) -> Self {
        Self { offices }
    }

    /// Decides whether `requester` may manage (reset password of, view
    /// activity of, administer) a user with `target_role` in
    /// `target_office_code`.
    pub async fn can_manage(
        &self,
        requester: &User,
        target_role: Role,
        target_office_code: &str,
    ) -> Result<bool, DomainError> {
        if !requester.can_login() {
            return Ok(false);
        }
        if !requester.role.outranks(target_role) {
            return Ok(false);
        }
        // Moha is the root jurisdiction; the rank check is sufficient.
        if requester.role == Role::Moha {
            return Ok(true);
        }
        let ancestors = self.ancestor_chain(target_office_code).await?;
        Ok(ancestors.iter().any(|code| code == &requester.office_code))
    }

    pub async fn ensure_can_manage(
        &self,
        requester: &User,
        target_role: Role,
        target_office_code: &str,
    ) -> Result<(), DomainError> {
        if self.can_manage(requester, target_role, target_office_code).await? {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied)
        }
    }

    /// Proper ancestors of an office, nearest parent first. Returns an
    /// empty chain (which callers treat as deny) when the office is
    /// unknown, a parent pointer dangles, or the walk exceeds the depth
    /// bound.
    async fn ancestor_chain(&self, office_code: &str) -> Result<Vec<String>, DomainError> {
        let mut chain = Vec::new();

        let Some(mut office) = self.offices.find_by_code(office_code).await? else {
            return Ok(chain);
        };

        for _ in 0..MAX_OFFICE_CHAIN_DEPTH {
            let Some(parent_code) = office.parent_code.clone() else {
                return Ok(chain);
            };
            match self.offices.find_by_code(&parent_code).await? {
                Some(parent) => {
                    chain.push(parent.code.clone());
                    office = parent;
                }
                None => {
                    warn!(office = %office.code, parent = %parent_code, "dangling parent_code, denying");
                    chain.clear();
                    return Ok(chain);
                }
            }
        }

        warn!(office = %office_code, "office chain exceeds depth bound, denying");
        chain.clear();
        Ok(chain)
    }
}
