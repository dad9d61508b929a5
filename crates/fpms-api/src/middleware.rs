//! Session authentication and CSRF middleware

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use fpms_core::{services::AuthenticatedUser, DomainError};
use fpms_shared::ClientInfo;

use crate::response::domain_error;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Authenticates the session token, enforces the CSRF double-submit on
/// mutating methods, and stores the authenticated user as a request
/// extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session_id = match session_id_from(req.headers()) {
        Some(id) => id,
        None => return domain_error(DomainError::InvalidSession).into_response(),
    };

    let auth = match state.auth.authenticate(&session_id).await {
        Ok(auth) => auth,
        Err(err) => return domain_error(err).into_response(),
    };

    if mutates(req.method()) && !csrf_matches(req.headers(), &auth) {
        return domain_error(DomainError::InvalidSession).into_response();
    }

    req.extensions_mut().insert(auth);
    next.run(req).await
}

fn session_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
}

fn mutates(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

fn csrf_matches(headers: &HeaderMap, auth: &AuthenticatedUser) -> bool {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| {
            fpms_security::csrf::validate_csrf_token(token, &auth.session.csrf_token)
        })
}

/// Client metadata for audit entries, best effort from proxy headers.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}
