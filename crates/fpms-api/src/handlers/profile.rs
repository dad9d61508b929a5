// ============================================================================
// FPMS API - Profile Handlers
// File: crates/fpms-api/src/handlers/profile.rs
// ============================================================================
//! Self-service profile and password change

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use validator::Validate;

use fpms_core::services::{AuthenticatedUser, UpdateProfile};

use crate::dto::{ChangePasswordRequest, UpdateProfileRequest, UserDto};
use crate::middleware::client_info;
use crate::response::{domain_error, ApiResponse, ErrorResponse};
use crate::state::AppState;

/// GET /api/v1/profile
pub async fn get(
    Extension(auth): Extension<AuthenticatedUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(&auth.user)))
}

/// PUT /api/v1/profile
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let client = client_info(&headers);
    let updated = state
        .users
        .update_profile(
            &auth.user,
            UpdateProfile {
                email: payload.email,
                phone: payload.phone,
            },
            &client,
        )
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(&updated))))
}

/// POST /api/v1/profile/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("VALIDATION_ERROR", &e.to_string())),
        ));
    }
    let client = client_info(&headers);
    state
        .credentials
        .change_password(
            &auth.user,
            &payload.current_password,
            &payload.new_password,
            &client,
        )
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(())))
}
