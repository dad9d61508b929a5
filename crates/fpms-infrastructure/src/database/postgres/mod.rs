//! PostgreSQL repository implementations

pub mod user_repo_impl;
pub mod office_repo_impl;
pub mod audit_repo_impl;
pub mod session_repo_impl;
pub mod settings_repo_impl;

pub use user_repo_impl::PgUserRepository;
pub use office_repo_impl::PgOfficeRepository;
pub use audit_repo_impl::PgAuditLogRepository;
pub use session_repo_impl::PgSessionRepository;
pub use settings_repo_impl::PgSystemSettingsRepository;
