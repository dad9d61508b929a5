//! User role enumeration and the fixed jurisdiction ordering

use serde::{Deserialize, Serialize};

/// Administrative role, ordered moha > district > division > gn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Moha,
    District,
    Division,
    Gn,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Moha => "moha",
            Role::District => "district",
            Role::Division => "division",
            Role::Gn => "gn",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "moha" => Some(Role::Moha),
            "district" => Some(Role::District),
            "division" => Some(Role::Division),
            "gn" => Some(Role::Gn),
            _ => None,
        }
    }

    /// Depth in the jurisdiction tree; 0 is the root.
    pub fn level(&self) -> u8 {
        match self {
            Role::Moha => 0,
            Role::District => 1,
            Role::Division => 2,
            Role::Gn => 3,
        }
    }

    /// Strict ordering check: a role only outranks roles strictly below it.
    /// Equal roles never outrank each other; gn outranks no one.
    pub fn outranks(&self, other: Role) -> bool {
        self.level() < other.level()
    }

    pub fn all() -> [Role; 4] {
        [Role::Moha, Role::District, Role::Division, Role::Gn]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_ordering() {
        for a in Role::all() {
            // No role outranks itself.
            assert!(!a.outranks(a));
            // gn outranks nothing.
            assert!(!Role::Gn.outranks(a));
        }
        assert!(Role::Moha.outranks(Role::District));
        assert!(Role::Moha.outranks(Role::Gn));
        assert!(Role::District.outranks(Role::Division));
        assert!(Role::Division.outranks(Role::Gn));
        assert!(!Role::Division.outranks(Role::District));
    }

    #[test]
    fn test_str_roundtrip() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("root"), None);
    }
}
