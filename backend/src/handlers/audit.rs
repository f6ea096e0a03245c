//! Audit trail handlers

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::auth::CurrentAdmin;
use crate::services::audit::{AuditFilters, AuditService};
use crate::AppState;
use shared::{AdminLog, ApiResponse, PaginatedResponse, Pagination};

/// Admin action log. SUPERADMIN only.
pub async fn list(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(filters): Query<AuditFilters>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<AdminLog>>>> {
    admin.require_superadmin()?;

    let page = AuditService::new(state.db.clone())
        .list(filters, pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
