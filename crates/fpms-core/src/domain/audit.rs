//! Audit log entities
//!
//! Entries are append-only. Neither the entity nor the repository trait
//! exposes a way to mutate a written row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use fpms_shared::ClientInfo;

/// Security-relevant action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    LoginFailed,
    AccountLocked,
    Logout,
    SessionTimeout,
    PasswordChanged,
    PasswordReset,
    UserCreated,
    UserUpdated,
    UserDeactivated,
    BootstrapCompleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::AccountLocked => "account_locked",
            AuditAction::Logout => "logout",
            AuditAction::SessionTimeout => "session_timeout",
            AuditAction::PasswordChanged => "password_changed",
            AuditAction::PasswordReset => "password_reset",
            AuditAction::UserCreated => "user_created",
            AuditAction::UserUpdated => "user_updated",
            AuditAction::UserDeactivated => "user_deactivated",
            AuditAction::BootstrapCompleted => "bootstrap_completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "login" => Some(AuditAction::Login),
            "login_failed" => Some(AuditAction::LoginFailed),
            "account_locked" => Some(AuditAction::AccountLocked),
            "logout" => Some(AuditAction::Logout),
            "session_timeout" => Some(AuditAction::SessionTimeout),
            "password_changed" => Some(AuditAction::PasswordChanged),
            "password_reset" => Some(AuditAction::PasswordReset),
            "user_created" => Some(AuditAction::UserCreated),
            "user_updated" => Some(AuditAction::UserUpdated),
            "user_deactivated" => Some(AuditAction::UserDeactivated),
            "bootstrap_completed" => Some(AuditAction::BootstrapCompleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    /// Acting user; None for failed logins against unknown usernames.
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub record_id: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(user_id: Option<Uuid>, action: AuditAction, client: &ClientInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action,
            table_name: None,
            record_id: None,
            old_values: None,
            new_values: None,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn on_record(mut self, table_name: &str, record_id: impl ToString) -> Self {
        self.table_name = Some(table_name.to_string());
        self.record_id = Some(record_id.to_string());
        self
    }

    pub fn with_change(mut self, old_values: Option<Value>, new_values: Option<Value>) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_str_roundtrip() {
        for action in [
            AuditAction::Login,
            AuditAction::LoginFailed,
            AuditAction::AccountLocked,
            AuditAction::Logout,
            AuditAction::SessionTimeout,
            AuditAction::PasswordChanged,
            AuditAction::PasswordReset,
            AuditAction::UserCreated,
            AuditAction::UserUpdated,
            AuditAction::UserDeactivated,
            AuditAction::BootstrapCompleted,
        ] {
            assert_eq!(AuditAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn test_builder() {
        let entry = AuditLogEntry::new(None, AuditAction::LoginFailed, &ClientInfo::default())
            .on_record("users", "some-id");
        assert_eq!(entry.table_name.as_deref(), Some("users"));
        assert!(entry.old_values.is_none());
    }
}
