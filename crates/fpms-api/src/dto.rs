//! Request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use fpms_core::domain::{AuditLogEntry, Role, User};
use fpms_shared::Pagination;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    #[validate(length(min = 1, message = "Office code is required"))]
    pub office_code: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// User DTO for responses. Never exposes the password hash.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: &'static str,
    pub office_code: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role.as_str(),
            office_code: user.office_code.clone(),
            is_active: user.is_active,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserDto,
    pub session_token: Uuid,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user: UserDto,
    /// Shown exactly once; not retrievable afterwards.
    pub initial_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    /// Shown exactly once; not retrievable afterwards.
    pub temporary_password: String,
}

#[derive(Debug, Serialize)]
pub struct AuditEntryDto {
    pub id: Uuid,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_values: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_values: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&AuditLogEntry> for AuditEntryDto {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action.as_str(),
            table_name: entry.table_name.clone(),
            record_id: entry.record_id.clone(),
            old_values: entry.old_values.clone(),
            new_values: entry.new_values.clone(),
            ip_address: entry.ip_address.clone(),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub counts: Vec<RoleCount>,
}

#[derive(Debug, Serialize)]
pub struct RoleCount {
    pub role: &'static str,
    pub users: i64,
}

impl DashboardResponse {
    pub fn from_counts(counts: Vec<(Role, i64)>) -> Self {
        Self {
            counts: counts
                .into_iter()
                .map(|(role, users)| RoleCount { role: role.as_str(), users })
                .collect(),
        }
    }
}
