// ============================================================================
// FPMS API - Auth Handlers
// File: crates/fpms-api/src/handlers/auth.rs
// ============================================================================
//! Login and logout handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use validator::Validate;

use fpms_core::services::AuthenticatedUser;

use crate::dto::{LoginRequest, LoginResponse, UserDto};
use crate::middleware::client_info;
use crate::response::{domain_error, ApiResponse, ErrorResponse};
use crate::state::AppState;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ErrorResponse> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("VALIDATION_ERROR", &e.to_string())),
        ));
    }

    let client = client_info(&headers);
    let result = state
        .auth
        .login(&payload.username, &payload.password, &client)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user: UserDto {
            id: result.user.id,
            username: result.user.username,
            email: result.user.email,
            phone: result.user.phone,
            role: result.user.role.as_str(),
            office_code: result.user.office_code,
            is_active: result.user.is_active,
            last_login_at: result.user.last_login_at,
        },
        session_token: result.session_id,
        csrf_token: result.csrf_token,
    })))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    let client = client_info(&headers);
    state
        .auth
        .logout(&auth.session.id, &client)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(())))
}
