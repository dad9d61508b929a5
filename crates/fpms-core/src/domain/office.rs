//! Office domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// A node in the jurisdiction tree. The root moha office has no parent;
/// every other office carries an explicit parent_code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub code: String,
    pub name: String,
    pub office_type: Role,
    pub parent_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Office {
    pub fn new(code: String, name: String, office_type: Role, parent_code: Option<String>) -> Self {
        Self {
            code,
            name,
            office_type,
            parent_code,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_code.is_none()
    }
}
