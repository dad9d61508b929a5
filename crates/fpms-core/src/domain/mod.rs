//! # FPMS Core - Domain Module
//!
//! Domain entities for the family-registry portal.

pub mod role;
pub mod office;
pub mod user;
pub mod audit;
pub mod session;

// Re-export all entities and enums
pub use role::Role;
pub use office::Office;
pub use user::User;
pub use audit::{AuditAction, AuditLogEntry};
pub use session::Session;
