//! HTTP handlers, one module per page group

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod users;
