// ============================================================================
// FPMS Core - Authentication Service
// File: crates/fpms-core/src/services/auth_service.rs
// ============================================================================
//! Login/logout with account lockout, and per-request session
//! authentication with an inactivity timeout.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{AuditAction, AuditLogEntry, Role, Session, User};
use crate::error::DomainError;
use crate::repositories::{AuditLogRepository, SessionRepository, UserRepository};
use fpms_security::password::PasswordService;
use fpms_shared::ClientInfo;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    audit: Arc<dyn AuditLogRepository>,
    max_failed_logins: i32,
    lockout_secs: i64,
    idle_timeout_secs: i64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        audit: Arc<dyn AuditLogRepository>,
        max_failed_logins: i32,
        lockout_secs: i64,
        idle_timeout_secs: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            audit,
            max_failed_logins,
            lockout_secs,
            idle_timeout_secs,
        }
    }

    /// Login with username and password.
    ///
    /// Unknown username, wrong password, and disabled account all surface
    /// as the same `InvalidCredentials` so callers cannot enumerate
    /// accounts. Lockout state is reported distinctly but only after the
    /// account exists check, and it holds even for the correct password.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginResult, DomainError> {
        info!("Login attempt for username: {}", username);

        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!("Login failed: unknown username: {}", username);
                self.audit_login_failure(None, client).await;
                return Err(DomainError::InvalidCredentials);
            }
        };

        if !user.can_login() {
            warn!("Login failed: user not active: {}", username);
            self.audit_login_failure(Some(user.id), client).await;
            return Err(DomainError::InvalidCredentials);
        }

        let now = Utc::now();
        if user.is_locked_at(now) {
            warn!("Login refused: account locked: {}", username);
            self.audit_login_failure(Some(user.id), client).await;
            return Err(DomainError::AccountLocked);
        }

        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;

        if !password_valid {
            return Err(self.handle_failed_password(&user, client).await);
        }

        self.users.record_login_success(&user.id, now).await?;

        let session = self.sessions.create(&Session::new(user.id)).await?;

        self.audit
            .append(&AuditLogEntry::new(Some(user.id), AuditAction::Login, client))
            .await?;

        info!("Login successful for: {}", username);

        // Mirror what record_login_success just persisted.
        let mut user = user;
        user.last_login_at = Some(now);
        user.failed_login_attempts = 0;
        user.locked_until = None;

        Ok(LoginResult {
            user: UserInfo::from(&user),
            session_id: session.id,
            csrf_token: session.csrf_token,
        })
    }

    /// Validates a session for the current request and slides the
    /// inactivity window forward.
    pub async fn authenticate(&self, session_id: &Uuid) -> Result<AuthenticatedUser, DomainError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or(DomainError::InvalidSession)?;

        if session.is_revoked() {
            return Err(DomainError::InvalidSession);
        }

        let now = Utc::now();
        if session.is_idle_expired(self.idle_timeout_secs, now) {
            self.sessions.revoke(&session.id, now).await?;
            self.audit
                .append(&AuditLogEntry::new(
                    Some(session.user_id),
                    AuditAction::SessionTimeout,
                    &ClientInfo::default(),
                ))
                .await?;
            return Err(DomainError::SessionExpired);
        }

        let user = self
            .users
            .find_by_id(&session.user_id)
            .await?
            .filter(User::can_login)
            .ok_or(DomainError::InvalidSession)?;

        self.sessions.touch(&session.id, now).await?;

        Ok(AuthenticatedUser { user, session })
    }

    /// Revokes the session. Idempotent: a missing or already revoked
    /// session logs out cleanly.
    pub async fn logout(&self, session_id: &Uuid, client: &ClientInfo) -> Result<(), DomainError> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            return Ok(());
        };
        if !session.is_revoked() {
            self.sessions.revoke(&session.id, Utc::now()).await?;
            self.audit
                .append(&AuditLogEntry::new(
                    Some(session.user_id),
                    AuditAction::Logout,
                    client,
                ))
                .await?;
        }
        Ok(())
    }

    /// Housekeeping: drop sessions idle past the timeout.
    pub async fn purge_expired_sessions(&self) -> Result<u64, DomainError> {
        let cutoff = Utc::now() - Duration::seconds(self.idle_timeout_secs);
        self.sessions.purge_expired(cutoff).await
    }

    async fn handle_failed_password(&self, user: &User, client: &ClientInfo) -> DomainError {
        let attempts = user.failed_login_attempts + 1;
        let locked_until = if attempts >= self.max_failed_logins {
            Some(Utc::now() + Duration::seconds(self.lockout_secs))
        } else {
            None
        };

        if let Err(e) = self
            .users
            .record_login_failure(&user.id, attempts, locked_until)
            .await
        {
            error!("Failed to record login failure: {}", e);
        }

        if locked_until.is_some() {
            warn!(
                "Account locked after {} failed attempts: {}",
                attempts, user.username
            );
            if let Err(e) = self
                .audit
                .append(&AuditLogEntry::new(
                    Some(user.id),
                    AuditAction::AccountLocked,
                    client,
                ))
                .await
            {
                error!("Failed to append audit entry: {}", e);
            }
            return DomainError::AccountLocked;
        }

        warn!("Login failed: invalid password for: {}", user.username);
        self.audit_login_failure(Some(user.id), client).await;
        DomainError::InvalidCredentials
    }

    async fn audit_login_failure(&self, user_id: Option<Uuid>, client: &ClientInfo) {
        if let Err(e) = self
            .audit
            .append(&AuditLogEntry::new(user_id, AuditAction::LoginFailed, client))
            .await
        {
            error!("Failed to append audit entry: {}", e);
        }
    }
}

/// Result of successful login. The csrf_token travels back to the client
/// and must accompany every mutating request.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserInfo,
    pub session_id: Uuid,
    pub csrf_token: String,
}

/// Authenticated request context.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session: Session,
}

/// User info returned in auth responses. Never carries the hash.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub office_code: String,
    pub is_active: bool,
    pub last_login_at: Option<chrono::DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            office_code: user.office_code.clone(),
            is_active: user.is_active,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::audit_repository::MockAuditLogRepository;
    use crate::repositories::session_repository::MockSessionRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use mockall::predicate::*;

    const MAX_FAILED: i32 = 3;
    const LOCKOUT_SECS: i64 = 900;
    const IDLE_SECS: i64 = 1800;

    fn hash_of(password: &str) -> String {
        PasswordService::hash(password).unwrap()
    }

    fn gn_user(password: &str) -> User {
        User::new(
            "gn_officer_01".to_string(),
            "officer@fpms.gov.lk".to_string(),
            None,
            hash_of(password),
            Role::Gn,
            "GN-KAL-01-001".to_string(),
            None,
        )
        .unwrap()
    }

    fn service(
        users: MockUserRepository,
        sessions: MockSessionRepository,
        audit: MockAuditLogRepository,
    ) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(sessions),
            Arc::new(audit),
            MAX_FAILED,
            LOCKOUT_SECS,
            IDLE_SECS,
        )
    }

    fn audit_expecting(action: AuditAction) -> MockAuditLogRepository {
        let mut audit = MockAuditLogRepository::new();
        audit
            .expect_append()
            .withf(move |entry| entry.action == action)
            .returning(|entry| Ok(entry.clone()));
        audit
    }

    #[tokio::test]
    async fn test_login_success_resets_counter_and_opens_session() {
        let mut user = gn_user("Valid-Pass-7");
        user.failed_login_attempts = 2;

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .with(eq("gn_officer_01"))
            .returning(move |_| Ok(Some(found.clone())));
        users
            .expect_record_login_success()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions.expect_create().returning(|s| Ok(s.clone()));

        let svc = service(users, sessions, audit_expecting(AuditAction::Login));
        let result = svc
            .login("gn_officer_01", "Valid-Pass-7", &ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(result.user.username, "gn_officer_01");
        assert_eq!(result.csrf_token.len(), 64);
    }

    #[tokio::test]
    async fn test_login_result_reflects_recorded_state() {
        let mut user = gn_user("Valid-Pass-7");
        user.failed_login_attempts = 2;
        user.phone = Some("0711234567".to_string());

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_record_login_success().returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions.expect_create().returning(|s| Ok(s.clone()));

        let svc = service(users, sessions, audit_expecting(AuditAction::Login));
        let result = svc
            .login("gn_officer_01", "Valid-Pass-7", &ClientInfo::default())
            .await
            .unwrap();

        // The response mirrors the persisted post-login state, not the
        // pre-login row.
        assert!(result.user.is_active);
        assert!(result.user.last_login_at.is_some());
        assert_eq!(result.user.phone.as_deref(), Some("0711234567"));
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_same_error() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        let svc = service(
            users,
            MockSessionRepository::new(),
            audit_expecting(AuditAction::LoginFailed),
        );
        let unknown = svc
            .login("nobody", "whatever", &ClientInfo::default())
            .await
            .unwrap_err();

        let user = gn_user("Valid-Pass-7");
        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_record_login_failure().returning(|_, _, _| Ok(()));
        let svc = service(
            users,
            MockSessionRepository::new(),
            audit_expecting(AuditAction::LoginFailed),
        );
        let wrong = svc
            .login("gn_officer_01", "bad-password", &ClientInfo::default())
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_lockout_engages_at_threshold() {
        let mut user = gn_user("Valid-Pass-7");
        user.failed_login_attempts = MAX_FAILED - 1;

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(found.clone())));
        users
            .expect_record_login_failure()
            .withf(|_, attempts, locked_until| *attempts == MAX_FAILED && locked_until.is_some())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let svc = service(
            users,
            MockSessionRepository::new(),
            audit_expecting(AuditAction::AccountLocked),
        );
        let err = svc
            .login("gn_officer_01", "bad-password", &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountLocked));
    }

    #[tokio::test]
    async fn test_locked_account_refuses_correct_password() {
        let mut user = gn_user("Valid-Pass-7");
        user.failed_login_attempts = MAX_FAILED;
        user.locked_until = Some(Utc::now() + Duration::seconds(LOCKOUT_SECS));

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(found.clone())));

        let svc = service(
            users,
            MockSessionRepository::new(),
            audit_expecting(AuditAction::LoginFailed),
        );
        let err = svc
            .login("gn_officer_01", "Valid-Pass-7", &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AccountLocked));
    }

    #[tokio::test]
    async fn test_expired_lock_allows_login_again() {
        let mut user = gn_user("Valid-Pass-7");
        user.locked_until = Some(Utc::now() - Duration::seconds(1));

        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_username()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_record_login_success().returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions.expect_create().returning(|s| Ok(s.clone()));

        let svc = service(users, sessions, audit_expecting(AuditAction::Login));
        assert!(svc
            .login("gn_officer_01", "Valid-Pass-7", &ClientInfo::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_idle_session_times_out_and_is_revoked() {
        let user = gn_user("Valid-Pass-7");
        let mut session = Session::new(user.id);
        session.last_seen_at = Utc::now() - Duration::seconds(IDLE_SECS + 10);
        let session_id = session.id;

        let mut sessions = MockSessionRepository::new();
        let found = session.clone();
        sessions
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        sessions.expect_revoke().times(1).returning(|_, _| Ok(()));

        let svc = service(
            MockUserRepository::new(),
            sessions,
            audit_expecting(AuditAction::SessionTimeout),
        );
        let err = svc.authenticate(&session_id).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionExpired));
    }

    #[tokio::test]
    async fn test_live_session_touches_and_returns_user() {
        let user = gn_user("Valid-Pass-7");
        let session = Session::new(user.id);
        let session_id = session.id;

        let mut sessions = MockSessionRepository::new();
        let found = session.clone();
        sessions
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        sessions.expect_touch().times(1).returning(|_, _| Ok(()));

        let mut users = MockUserRepository::new();
        let found_user = user.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found_user.clone())));

        let svc = service(users, sessions, MockAuditLogRepository::new());
        let auth = svc.authenticate(&session_id).await.unwrap();
        assert_eq!(auth.user.id, user.id);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_find_by_id().returning(|_| Ok(None));
        let svc = service(
            MockUserRepository::new(),
            sessions,
            MockAuditLogRepository::new(),
        );
        assert!(svc
            .logout(&Uuid::new_v4(), &ClientInfo::default())
            .await
            .is_ok());
    }
}
