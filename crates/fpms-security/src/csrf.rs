//! CSRF token helpers for session-bound double-submit checks

use rand::Rng;
use sha2::{Digest, Sha256};

pub fn generate_csrf_token() -> String {
    let token: [u8; 32] = rand::rng().random();
    hex::encode(token)
}

/// Compares the submitted token against the session's token without
/// early exit on the first differing byte.
pub fn validate_csrf_token(token: &str, expected: &str) -> bool {
    let a = Sha256::digest(token.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a == b
}
