//! Application-wide constants

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Walk limit when resolving an office's ancestor chain. The hierarchy is
/// four levels deep (moha > district > division > gn); anything deeper is
/// corrupt data and treated as a lookup miss.
pub const MAX_OFFICE_CHAIN_DEPTH: usize = 8;

pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: i64 = 1800;
pub const DEFAULT_MAX_FAILED_LOGINS: i32 = 5;
pub const DEFAULT_LOCKOUT_SECS: i64 = 900;
pub const DEFAULT_PASSWORD_HISTORY_DEPTH: u32 = 5;

/// Persisted system_settings key for the one-shot bootstrap guard.
pub const BOOTSTRAP_FLAG_KEY: &str = "bootstrap_completed";
