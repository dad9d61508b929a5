//! Password hashing with Argon2, generation, and policy checks

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use thiserror::Error;
use zxcvbn::{zxcvbn, Score};

use fpms_shared::constants::{GENERATED_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghjkmnpqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("Verification failed")]
    VerificationFailed,
    #[error("Password too short (minimum {0} characters)")]
    TooShort(usize),
    #[error("Password too long")]
    TooLong,
    #[error("Password must contain upper case, lower case, and a digit")]
    MissingCharacterClass,
    #[error("Password too weak")]
    TooWeak,
}

/// Minimum-strength policy for operator-chosen passwords.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: MIN_PASSWORD_LENGTH }
    }
}

impl PasswordPolicy {
    /// Structural rules: length bounds plus mixed case and a digit.
    /// Human-chosen passwords additionally pass a zxcvbn score gate.
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        if password.chars().count() < self.min_length {
            return Err(PasswordError::TooShort(self.min_length));
        }
        if password.chars().count() > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong);
        }
        let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_upper && has_lower && has_digit) {
            return Err(PasswordError::MissingCharacterClass);
        }
        Ok(())
    }

    pub fn check_chosen(&self, password: &str) -> Result<(), PasswordError> {
        self.check(password)?;
        let estimate = zxcvbn(password, &[]);
        if estimate.score() < Score::Three {
            return Err(PasswordError::TooWeak);
        }
        Ok(())
    }
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Generates a random password with at least one upper, one lower, and
    /// one digit, from an alphabet without look-alike characters.
    pub fn generate() -> String {
        Self::generate_with_length(GENERATED_PASSWORD_LENGTH)
    }

    pub fn generate_with_length(length: usize) -> String {
        let length = length.max(MIN_PASSWORD_LENGTH);
        let mut rng = rand::rng();
        let mut bytes: Vec<u8> = Vec::with_capacity(length);

        bytes.push(UPPER[rng.random_range(0..UPPER.len())]);
        bytes.push(LOWER[rng.random_range(0..LOWER.len())]);
        bytes.push(DIGITS[rng.random_range(0..DIGITS.len())]);

        let pool: Vec<u8> = [UPPER, LOWER, DIGITS].concat();
        while bytes.len() < length {
            bytes.push(pool[rng.random_range(0..pool.len())]);
        }

        // Fisher-Yates so the guaranteed classes are not positional.
        for i in (1..bytes.len()).rev() {
            let j = rng.random_range(0..=i);
            bytes.swap(i, j);
        }

        String::from_utf8(bytes).expect("alphabet is ASCII")
    }
}
