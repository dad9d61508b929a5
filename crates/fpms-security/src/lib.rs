//! # FPMS Security
//!
//! Security utilities: password hashing and generation, policy checks, CSRF.

pub mod password;
pub mod csrf;

pub use password::{PasswordPolicy, PasswordService};
