//! Router assembly

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers::{auth, dashboard, health, profile, users};
use crate::middleware::require_session;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/dashboard", get(dashboard::summary))
        .route("/api/v1/profile", get(profile::get).put(profile::update))
        .route("/api/v1/profile/password", post(profile::change_password))
        .route("/api/v1/users", get(users::list).post(users::create))
        .route("/api/v1/users/search", get(users::search))
        .route(
            "/api/v1/users/{id}",
            get(users::get).put(users::update).delete(users::deactivate),
        )
        .route("/api/v1/users/{id}/reset-password", post(users::reset_password))
        .route("/api/v1/users/{id}/activity", get(users::activity))
        .layer(from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{CSRF_HEADER, SESSION_HEADER};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use fpms_core::domain::{AuditLogEntry, Office, Role, Session, User};
    use fpms_core::error::DomainError;
    use fpms_core::repositories::{
        AuditLogRepository, OfficeRepository, SessionRepository, UserRepository,
    };
    use fpms_core::services::{AccessControlService, AuthService, CredentialService, UserService};
    use fpms_security::PasswordPolicy;
    use fpms_shared::config::{
        AppConfig, AppSettings, DatabaseSettings, PasswordSettings, SessionSettings,
    };
    use fpms_shared::Pagination;

    struct FakeUsers(User);

    #[async_trait]
    impl UserRepository for FakeUsers {
        async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
            Ok((*id == self.0.id).then(|| self.0.clone()))
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
            Ok((self.0.username == username).then(|| self.0.clone()))
        }
        async fn create(&self, user: &User) -> Result<User, DomainError> {
            Ok(user.clone())
        }
        async fn update(&self, user: &User) -> Result<User, DomainError> {
            Ok(user.clone())
        }
        async fn deactivate(&self, _id: &Uuid, _removed_by: &Uuid) -> Result<(), DomainError> {
            Ok(())
        }
        async fn list_by_offices(
            &self,
            _office_codes: &[String],
            _page: Pagination,
        ) -> Result<Vec<User>, DomainError> {
            Ok(Vec::new())
        }
        async fn search(
            &self,
            _office_codes: &[String],
            _query: &str,
            _page: Pagination,
        ) -> Result<Vec<User>, DomainError> {
            Ok(Vec::new())
        }
        async fn count_by_role(
            &self,
            _office_codes: &[String],
        ) -> Result<Vec<(Role, i64)>, DomainError> {
            Ok(Vec::new())
        }
        async fn record_login_success(
            &self,
            _id: &Uuid,
            _at: DateTime<Utc>,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn record_login_failure(
            &self,
            _id: &Uuid,
            _failed_attempts: i32,
            _locked_until: Option<DateTime<Utc>>,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn update_password(
            &self,
            _id: &Uuid,
            _new_hash: &str,
            _audit: &AuditLogEntry,
        ) -> Result<(), DomainError> {
            Ok(())
        }
        async fn recent_password_hashes(
            &self,
            _id: &Uuid,
            _limit: u32,
        ) -> Result<Vec<String>, DomainError> {
            Ok(Vec::new())
        }
    }

    struct FakeSessions(Session);

    #[async_trait]
    impl SessionRepository for FakeSessions {
        async fn create(&self, session: &Session) -> Result<Session, DomainError> {
            Ok(session.clone())
        }
        async fn find_by_id(&self, id: &Uuid) -> Result<Option<Session>, DomainError> {
            Ok((*id == self.0.id).then(|| self.0.clone()))
        }
        async fn touch(&self, _id: &Uuid, _at: DateTime<Utc>) -> Result<(), DomainError> {
            Ok(())
        }
        async fn revoke(&self, _id: &Uuid, _at: DateTime<Utc>) -> Result<(), DomainError> {
            Ok(())
        }
        async fn purge_expired(&self, _cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    struct FakeAudit;

    #[async_trait]
    impl AuditLogRepository for FakeAudit {
        async fn append(&self, entry: &AuditLogEntry) -> Result<AuditLogEntry, DomainError> {
            Ok(entry.clone())
        }
        async fn list_for_user(
            &self,
            _user_id: &Uuid,
            _page: Pagination,
        ) -> Result<Vec<AuditLogEntry>, DomainError> {
            Ok(Vec::new())
        }
    }

    struct FakeOffices;

    #[async_trait]
    impl OfficeRepository for FakeOffices {
        async fn find_by_code(&self, _code: &str) -> Result<Option<Office>, DomainError> {
            Ok(None)
        }
        async fn create(&self, office: &Office) -> Result<Office, DomainError> {
            Ok(office.clone())
        }
        async fn list_descendants(&self, _code: &str) -> Result<Vec<Office>, DomainError> {
            Ok(Vec::new())
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            app: AppSettings {
                env: "test".to_string(),
                host: "127.0.0.1".to_string(),
                port: 0,
                name: "fpms-server".to_string(),
            },
            database: DatabaseSettings {
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
            },
            session: SessionSettings { idle_timeout_secs: 1800 },
            password: PasswordSettings {
                min_length: 8,
                history_depth: 5,
                max_failed_logins: 5,
                lockout_secs: 900,
            },
        }
    }

    fn app_with_session() -> (Router, Session) {
        let user = User::new(
            "gn_officer_01".to_string(),
            "officer@fpms.gov.lk".to_string(),
            None,
            "$argon2id$stub".to_string(),
            Role::Gn,
            "GN-KAL-01-001".to_string(),
            None,
        )
        .unwrap();
        let session = Session::new(user.id);

        let users: Arc<dyn UserRepository> = Arc::new(FakeUsers(user));
        let sessions: Arc<dyn SessionRepository> = Arc::new(FakeSessions(session.clone()));
        let audit: Arc<dyn AuditLogRepository> = Arc::new(FakeAudit);
        let offices: Arc<dyn OfficeRepository> = Arc::new(FakeOffices);

        let access = Arc::new(AccessControlService::new(offices.clone()));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            sessions,
            audit.clone(),
            5,
            900,
            1800,
        ));
        let user_service = Arc::new(UserService::new(
            users.clone(),
            offices,
            audit,
            access.clone(),
        ));
        let credentials = Arc::new(CredentialService::new(
            users,
            access,
            PasswordPolicy::default(),
            5,
        ));

        let state = AppState {
            auth,
            users: user_service,
            credentials,
            config: test_config(),
        };
        (router(state), session)
    }

    fn request(
        method: Method,
        uri: &str,
        session: Option<&Session>,
        csrf: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session.id.to_string());
        }
        if let Some(csrf) = csrf {
            builder = builder.header(CSRF_HEADER, csrf);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_mutating_request_with_wrong_csrf_rejected() {
        let (app, session) = app_with_session();
        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/auth/logout",
                Some(&session),
                Some("not-the-session-token"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mutating_request_with_matching_csrf_passes() {
        let (app, session) = app_with_session();
        let csrf = session.csrf_token.clone();
        let response = app
            .oneshot(request(
                Method::POST,
                "/api/v1/auth/logout",
                Some(&session),
                Some(&csrf),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_read_request_needs_no_csrf() {
        let (app, session) = app_with_session();
        let response = app
            .oneshot(request(Method::GET, "/api/v1/profile", Some(&session), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_rejected() {
        let (app, _) = app_with_session();
        let response = app
            .oneshot(request(Method::GET, "/api/v1/profile", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
