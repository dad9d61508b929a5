//! Repository traits (ports)

pub mod user_repository;
pub mod office_repository;
pub mod audit_repository;
pub mod session_repository;
pub mod settings_repository;

pub use user_repository::UserRepository;
pub use office_repository::OfficeRepository;
pub use audit_repository::AuditLogRepository;
pub use session_repository::SessionRepository;
pub use settings_repository::SystemSettingsRepository;
