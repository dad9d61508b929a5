// ============================================================================
// FPMS API - Dashboard Handler
// File: crates/fpms-api/src/handlers/dashboard.rs
// ============================================================================
//! Jurisdiction-scoped dashboard summary

use axum::{extract::State, Extension, Json};

use fpms_core::services::AuthenticatedUser;

use crate::dto::DashboardResponse;
use crate::response::{domain_error, ApiResponse, ErrorResponse};
use crate::state::AppState;

/// GET /api/v1/dashboard
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<DashboardResponse>>, ErrorResponse> {
    let counts = state
        .users
        .dashboard_summary(&auth.user)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(DashboardResponse::from_counts(
        counts,
    ))))
}
