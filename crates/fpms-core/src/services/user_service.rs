// ============================================================================
// FPMS Core - User Service
// File: crates/fpms-core/src/services/user_service.rs
// ============================================================================
//! User administration within the requester's jurisdiction, plus
//! self-service profile operations.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{AuditAction, AuditLogEntry, Role, User};
use crate::error::DomainError;
use crate::repositories::{AuditLogRepository, OfficeRepository, UserRepository};
use crate::services::AccessControlService;
use fpms_security::password::PasswordService;
use fpms_shared::{ClientInfo, Pagination};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    offices: Arc<dyn OfficeRepository>,
    audit: Arc<dyn AuditLogRepository>,
    access: Arc<AccessControlService>,
}

/// Payload for creating a user in a subordinate office.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub office_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Creation result. The initial password is shown once to the operator
/// and exists nowhere else in plaintext.
#[derive(Debug)]
pub struct CreatedUser {
    pub user: User,
    pub initial_password: String,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        offices: Arc<dyn OfficeRepository>,
        audit: Arc<dyn AuditLogRepository>,
        access: Arc<AccessControlService>,
    ) -> Self {
        Self { users, offices, audit, access }
    }

    pub async fn create_user(
        &self,
        requester: &User,
        req: NewUser,
        client: &ClientInfo,
    ) -> Result<CreatedUser, DomainError> {
        info!("User creation attempt: {} by {}", req.username, requester.username);

        let office = self
            .offices
            .find_by_code(&req.office_code)
            .await?
            .ok_or_else(|| DomainError::OfficeNotFound(req.office_code.clone()))?;

        if office.office_type != req.role {
            return Err(DomainError::ValidationError(format!(
                "Office {} does not host {} users",
                office.code,
                req.role.as_str()
            )));
        }

        self.access
            .ensure_can_manage(requester, req.role, &office.code)
            .await?;

        if self.users.find_by_username(&req.username).await?.is_some() {
            warn!("User creation failed: username taken: {}", req.username);
            return Err(DomainError::UsernameAlreadyExists(req.username));
        }

        let initial_password = PasswordService::generate();
        let password_hash = PasswordService::hash(&initial_password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let user = User::new(
            req.username,
            req.email,
            req.phone,
            password_hash,
            req.role,
            office.code,
            Some(requester.id),
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let created = self.users.create(&user).await?;

        self.audit
            .append(
                &AuditLogEntry::new(Some(requester.id), AuditAction::UserCreated, client)
                    .on_record("users", created.id)
                    .with_change(None, Some(snapshot(&created))),
            )
            .await?;

        info!("User created: {} ({})", created.username, created.id);

        Ok(CreatedUser { user: created, initial_password })
    }

    /// Users in offices strictly below the requester's office. Empty for
    /// gn requesters.
    pub async fn list_manageable(
        &self,
        requester: &User,
        page: Pagination,
    ) -> Result<Vec<User>, DomainError> {
        let codes = self.jurisdiction_codes(requester).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.users.list_by_offices(&codes, page.clamped()).await
    }

    pub async fn search(
        &self,
        requester: &User,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<User>, DomainError> {
        let codes = self.jurisdiction_codes(requester).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.users.search(&codes, query, page.clamped()).await
    }

    pub async fn get_user(&self, requester: &User, id: &Uuid) -> Result<User, DomainError> {
        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if requester.id != target.id {
            self.access
                .ensure_can_manage(requester, target.role, &target.office_code)
                .await?;
        }
        Ok(target)
    }

    pub async fn update_user(
        &self,
        requester: &User,
        id: &Uuid,
        changes: UpdateUser,
        client: &ClientInfo,
    ) -> Result<User, DomainError> {
        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        self.access
            .ensure_can_manage(requester, target.role, &target.office_code)
            .await?;

        let old = snapshot(&target);
        let mut updated = target;
        if let Some(email) = changes.email {
            updated.email = email;
        }
        if let Some(phone) = changes.phone {
            updated.phone = Some(phone);
        }
        if let Some(is_active) = changes.is_active {
            updated.is_active = is_active;
        }
        updated.modified_at = Some(chrono::Utc::now());
        updated.modified_by = Some(requester.id);

        updated
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let saved = self.users.update(&updated).await?;

        self.audit
            .append(
                &AuditLogEntry::new(Some(requester.id), AuditAction::UserUpdated, client)
                    .on_record("users", saved.id)
                    .with_change(Some(old), Some(snapshot(&saved))),
            )
            .await?;

        Ok(saved)
    }

    pub async fn deactivate_user(
        &self,
        requester: &User,
        id: &Uuid,
        client: &ClientInfo,
    ) -> Result<(), DomainError> {
        let target = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        self.access
            .ensure_can_manage(requester, target.role, &target.office_code)
            .await?;

        self.users.deactivate(id, &requester.id).await?;

        self.audit
            .append(
                &AuditLogEntry::new(Some(requester.id), AuditAction::UserDeactivated, client)
                    .on_record("users", target.id)
                    .with_change(Some(snapshot(&target)), None),
            )
            .await?;

        info!("User deactivated: {} by {}", target.username, requester.username);
        Ok(())
    }

    /// Self-service profile update; no jurisdiction check.
    pub async fn update_profile(
        &self,
        user: &User,
        changes: UpdateProfile,
        client: &ClientInfo,
    ) -> Result<User, DomainError> {
        let old = snapshot(user);
        let mut updated = user.clone();
        if let Some(email) = changes.email {
            updated.email = email;
        }
        if let Some(phone) = changes.phone {
            updated.phone = Some(phone);
        }
        updated.modified_at = Some(chrono::Utc::now());
        updated.modified_by = Some(user.id);

        updated
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let saved = self.users.update(&updated).await?;

        self.audit
            .append(
                &AuditLogEntry::new(Some(user.id), AuditAction::UserUpdated, client)
                    .on_record("users", saved.id)
                    .with_change(Some(old), Some(snapshot(&saved))),
            )
            .await?;

        Ok(saved)
    }

    /// Activity log: own log is always visible; someone else's requires
    /// the same jurisdiction rule as password reset.
    pub async fn activity_log(
        &self,
        requester: &User,
        target_id: &Uuid,
        page: Pagination,
    ) -> Result<Vec<AuditLogEntry>, DomainError> {
        if requester.id != *target_id {
            let target = self
                .users
                .find_by_id(target_id)
                .await?
                .ok_or(DomainError::UserNotFound)?;
            self.access
                .ensure_can_manage(requester, target.role, &target.office_code)
                .await?;
        }
        self.audit.list_for_user(target_id, page.clamped()).await
    }

    /// User counts per role within the requester's jurisdiction.
    pub async fn dashboard_summary(
        &self,
        requester: &User,
    ) -> Result<Vec<(Role, i64)>, DomainError> {
        let codes = self.jurisdiction_codes(requester).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.users.count_by_role(&codes).await
    }

    async fn jurisdiction_codes(&self, requester: &User) -> Result<Vec<String>, DomainError> {
        if requester.role == Role::Gn {
            return Ok(Vec::new());
        }
        let descendants = self.offices.list_descendants(&requester.office_code).await?;
        Ok(descendants.into_iter().map(|o| o.code).collect())
    }
}

/// Audit snapshot of a user row. The password hash is deliberately
/// excluded.
fn snapshot(user: &User) -> Value {
    json!({
        "username": user.username,
        "email": user.email,
        "phone": user.phone,
        "role": user.role.as_str(),
        "office_code": user.office_code,
        "is_active": user.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Office;
    use crate::repositories::audit_repository::MockAuditLogRepository;
    use crate::repositories::office_repository::MockOfficeRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use fpms_security::PasswordPolicy;

    fn office(code: &str, office_type: Role, parent: Option<&str>) -> Office {
        Office::new(
            code.to_string(),
            format!("{code} office"),
            office_type,
            parent.map(str::to_string),
        )
    }

    fn user(role: Role, office_code: &str) -> User {
        User::new(
            format!("{}_user", role.as_str()),
            format!("{}@fpms.gov.lk", role.as_str()),
            None,
            "$argon2id$stub".to_string(),
            role,
            office_code.to_string(),
            None,
        )
        .unwrap()
    }

    fn offices_mock() -> MockOfficeRepository {
        let tree: std::collections::HashMap<String, Office> = [
            office("MOHA", Role::Moha, None),
            office("D-KAL", Role::District, Some("MOHA")),
            office("DIV-KAL-01", Role::Division, Some("D-KAL")),
            office("GN-KAL-01-001", Role::Gn, Some("DIV-KAL-01")),
        ]
        .into_iter()
        .map(|o| (o.code.clone(), o))
        .collect();

        let mut mock = MockOfficeRepository::new();
        let lookup = tree.clone();
        mock.expect_find_by_code()
            .returning(move |code| Ok(lookup.get(code).cloned()));
        mock
    }

    fn access_service() -> Arc<AccessControlService> {
        Arc::new(AccessControlService::new(Arc::new(offices_mock())))
    }

    #[tokio::test]
    async fn test_create_user_returns_policy_conforming_password() {
        let requester = user(Role::Division, "DIV-KAL-01");

        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users.expect_create().returning(|u| Ok(u.clone()));

        let mut audit = MockAuditLogRepository::new();
        audit
            .expect_append()
            .withf(|e| {
                e.action == AuditAction::UserCreated
                    && e.new_values
                        .as_ref()
                        .is_some_and(|v| v.get("password_hash").is_none())
            })
            .returning(|e| Ok(e.clone()));

        let svc = UserService::new(
            Arc::new(users),
            Arc::new(offices_mock()),
            Arc::new(audit),
            access_service(),
        );

        let created = svc
            .create_user(
                &requester,
                NewUser {
                    username: "new_gn_officer".to_string(),
                    email: "new@fpms.gov.lk".to_string(),
                    phone: None,
                    role: Role::Gn,
                    office_code: "GN-KAL-01-001".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap();

        PasswordPolicy::default().check(&created.initial_password).unwrap();
        // The plaintext is not what got persisted.
        assert_ne!(created.user.password_hash, created.initial_password);
    }

    #[tokio::test]
    async fn test_create_user_outside_jurisdiction_denied() {
        let requester = user(Role::Gn, "GN-KAL-01-001");
        let svc = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(offices_mock()),
            Arc::new(MockAuditLogRepository::new()),
            access_service(),
        );
        let err = svc
            .create_user(
                &requester,
                NewUser {
                    username: "another_gn".to_string(),
                    email: "x@fpms.gov.lk".to_string(),
                    phone: None,
                    role: Role::Gn,
                    office_code: "GN-KAL-01-001".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_create_user_role_office_mismatch_rejected() {
        let requester = user(Role::Moha, "MOHA");
        let svc = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(offices_mock()),
            Arc::new(MockAuditLogRepository::new()),
            access_service(),
        );
        let err = svc
            .create_user(
                &requester,
                NewUser {
                    username: "misplaced".to_string(),
                    email: "x@fpms.gov.lk".to_string(),
                    phone: None,
                    role: Role::District,
                    office_code: "GN-KAL-01-001".to_string(),
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_gn_list_manageable_is_empty() {
        let requester = user(Role::Gn, "GN-KAL-01-001");
        let svc = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(offices_mock()),
            Arc::new(MockAuditLogRepository::new()),
            access_service(),
        );
        let list = svc
            .list_manageable(&requester, Pagination::default())
            .await
            .unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_activity_log_of_peer_denied() {
        let requester = user(Role::Gn, "GN-KAL-01-001");
        let peer = user(Role::Gn, "GN-KAL-01-001");
        let peer_id = peer.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(peer.clone())));

        let svc = UserService::new(
            Arc::new(users),
            Arc::new(offices_mock()),
            Arc::new(MockAuditLogRepository::new()),
            access_service(),
        );
        let err = svc
            .activity_log(&requester, &peer_id, Pagination::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_own_activity_log_visible() {
        let requester = user(Role::Gn, "GN-KAL-01-001");
        let own_id = requester.id;

        let mut audit = MockAuditLogRepository::new();
        audit.expect_list_for_user().returning(|_, _| Ok(Vec::new()));

        let svc = UserService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(offices_mock()),
            Arc::new(audit),
            access_service(),
        );
        assert!(svc
            .activity_log(&requester, &own_id, Pagination::default())
            .await
            .is_ok());
    }
}
