//! Server-side session entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            csrf_token: fpms_security::csrf::generate_csrf_token(),
            created_at: now,
            last_seen_at: now,
            revoked_at: None,
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Inactivity timeout is measured against last_seen_at, not created_at.
    pub fn is_idle_expired(&self, idle_timeout_secs: i64, now: DateTime<Utc>) -> bool {
        now - self.last_seen_at > Duration::seconds(idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_expiry() {
        let mut session = Session::new(Uuid::new_v4());
        let now = Utc::now();
        assert!(!session.is_idle_expired(1800, now));

        session.last_seen_at = now - Duration::seconds(1801);
        assert!(session.is_idle_expired(1800, now));

        // Activity pushes the window forward.
        session.last_seen_at = now - Duration::seconds(10);
        assert!(!session.is_idle_expired(1800, now));
    }
}
