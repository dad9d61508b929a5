// ============================================================================
// FPMS API - User Administration Handlers
// File: crates/fpms-api/src/handlers/users.rs
// ============================================================================
//! CRUD over subordinate users, password reset, and activity log.
//! Every operation is gated by the jurisdiction rule inside the services.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use fpms_core::domain::Role;
use fpms_core::services::{AuthenticatedUser, NewUser, UpdateUser};

use crate::dto::{
    AuditEntryDto, CreateUserRequest, CreateUserResponse, PageQuery, ResetPasswordResponse,
    SearchQuery, UpdateUserRequest, UserDto,
};
use crate::middleware::client_info;
use crate::response::{domain_error, ApiResponse, ErrorResponse};
use crate::state::AppState;

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ErrorResponse> {
    let users = state
        .users
        .list_manageable(&auth.user, query.pagination())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        users.iter().map(UserDto::from).collect(),
    )))
}

/// GET /api/v1/users/search
pub async fn search(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ErrorResponse> {
    let users = state
        .users
        .search(&auth.user, &query.q, query.pagination())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        users.iter().map(UserDto::from).collect(),
    )))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<CreateUserResponse>>, ErrorResponse> {
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("VALIDATION_ERROR", &e.to_string())),
        ));
    }
    let role = Role::from_str(&payload.role).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("VALIDATION_ERROR", "Unknown role")),
        )
    })?;

    let client = client_info(&headers);
    let created = state
        .users
        .create_user(
            &auth.user,
            NewUser {
                username: payload.username,
                email: payload.email,
                phone: payload.phone,
                role,
                office_code: payload.office_code,
            },
            &client,
        )
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(CreateUserResponse {
        user: UserDto::from(&created.user),
        initial_password: created.initial_password,
    })))
}

/// GET /api/v1/users/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let user = state
        .users
        .get_user(&auth.user, &id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(&user))))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let client = client_info(&headers);
    let updated = state
        .users
        .update_user(
            &auth.user,
            &id,
            UpdateUser {
                email: payload.email,
                phone: payload.phone,
                is_active: payload.is_active,
            },
            &client,
        )
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(UserDto::from(&updated))))
}

/// DELETE /api/v1/users/{id}
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    let client = client_info(&headers);
    state
        .users
        .deactivate_user(&auth.user, &id, &client)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(())))
}

/// POST /api/v1/users/{id}/reset-password
///
/// The temporary password in the response is the only place the
/// plaintext ever exists.
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ResetPasswordResponse>>, ErrorResponse> {
    let client = client_info(&headers);
    let temporary_password = state
        .credentials
        .reset_password(&auth.user, &id, &client)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ResetPasswordResponse {
        temporary_password,
    })))
}

/// GET /api/v1/users/{id}/activity
pub async fn activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEntryDto>>>, ErrorResponse> {
    let entries = state
        .users
        .activity_log(&auth.user, &id, query.pagination())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        entries.iter().map(AuditEntryDto::from).collect(),
    )))
}
