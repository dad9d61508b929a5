//! User domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,

    pub password_hash: String,

    pub role: Role,
    pub office_code: String,

    pub is_active: bool,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<Uuid>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        phone: Option<String>,
        password_hash: String,
        role: Role,
        office_code: String,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let user = Self {
            id: Uuid::new_v4(),
            username,
            email,
            phone,
            password_hash,
            role,
            office_code,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        };

        user.validate()?;
        Ok(user)
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    pub fn record_login(&mut self) {
        self.last_login_at = Some(Utc::now());
        self.failed_login_attempts = 0;
        self.locked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn sample_user() -> User {
        let email: String = SafeEmail().fake();
        User::new(
            "gn_officer_01".to_string(),
            email,
            None,
            "$argon2id$stub".to_string(),
            Role::Gn,
            "GN-0101-001".to_string(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_new_user_validates() {
        let user = sample_user();
        assert!(user.can_login());
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[test]
    fn test_rejects_bad_email() {
        let result = User::new(
            "gn_officer_01".to_string(),
            "not-an-email".to_string(),
            None,
            "$argon2id$stub".to_string(),
            Role::Gn,
            "GN-0101-001".to_string(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lock_window() {
        let mut user = sample_user();
        let now = Utc::now();
        assert!(!user.is_locked_at(now));

        user.locked_until = Some(now + Duration::minutes(15));
        assert!(user.is_locked_at(now));
        // Lock expires on its own.
        assert!(!user.is_locked_at(now + Duration::minutes(16)));
    }

    #[test]
    fn test_record_login_resets_counter() {
        let mut user = sample_user();
        user.failed_login_attempts = 4;
        user.locked_until = Some(Utc::now());
        user.record_login();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());
        assert!(user.last_login_at.is_some());
    }
}
