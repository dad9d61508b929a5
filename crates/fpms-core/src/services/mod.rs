//! Domain services (business logic)

pub mod access_control;
pub mod auth_service;
pub mod user_service;
pub mod credential_service;

pub use access_control::AccessControlService;
pub use auth_service::{AuthService, AuthenticatedUser, LoginResult, UserInfo};
pub use credential_service::CredentialService;
pub use user_service::{CreatedUser, NewUser, UpdateProfile, UpdateUser, UserService};
