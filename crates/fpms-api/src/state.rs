//! Shared application state

use std::sync::Arc;

use fpms_core::services::{AuthService, CredentialService, UserService};
use fpms_shared::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub credentials: Arc<CredentialService>,
    pub config: AppConfig,
}
