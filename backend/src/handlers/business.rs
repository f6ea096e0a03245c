//! Business catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::check;
use crate::middleware::auth::CurrentAdmin;
use crate::services::audit::AuditService;
use crate::services::business::{
    BusinessFilters, BusinessService, BusinessStats, CreateBusinessRequest, UpdateBusinessRequest,
};
use crate::AppState;
use shared::{
    validation, ApiResponse, Business, BusinessWithStatus, PaginatedResponse, Pagination,
    WeeklySchedule,
};

fn validate_schedule(schedule: &WeeklySchedule) -> AppResult<()> {
    for day in schedule.0.values() {
        check("schedule.open", validation::validate_schedule_time(&day.open))?;
        check("schedule.close", validation::validate_schedule_time(&day.close))?;
    }
    Ok(())
}

/// Public listing of active businesses
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<BusinessFilters>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BusinessWithStatus>>>> {
    let page = BusinessService::new(state.db.clone())
        .list_public(filters, pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// Public detail view. Inactive businesses are not exposed here.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BusinessWithStatus>>> {
    let business = BusinessService::new(state.db.clone()).get(id).await?;
    if !business.business.is_active {
        return Err(crate::error::AppError::NotFound(
            "Business not found".to_string(),
        ));
    }
    Ok(Json(ApiResponse::ok(business)))
}

/// Admin listing including inactive businesses
pub async fn list_all(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(filters): Query<BusinessFilters>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<BusinessWithStatus>>>> {
    let page = BusinessService::new(state.db.clone())
        .list_all(filters, pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn create(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(request): Json<CreateBusinessRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Business>>)> {
    check("name", validation::validate_customer_name(&request.name))?;
    check("phone", validation::validate_phone(&request.phone))?;
    check("address", validation::validate_address(&request.address))?;
    validate_schedule(&request.schedule)?;

    let business = BusinessService::new(state.db.clone()).create(request).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "CREATE_BUSINESS",
        format!("Created business {} ({})", business.name, business.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(business))))
}

pub async fn update(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBusinessRequest>,
) -> AppResult<Json<ApiResponse<Business>>> {
    if let Some(ref phone) = request.phone {
        check("phone", validation::validate_phone(phone))?;
    }
    if let Some(ref address) = request.address {
        check("address", validation::validate_address(address))?;
    }
    if let Some(ref schedule) = request.schedule {
        validate_schedule(schedule)?;
    }

    let business = BusinessService::new(state.db.clone()).update(id, request).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "UPDATE_BUSINESS",
        format!("Updated business {} ({})", business.name, business.id),
    );

    Ok(Json(ApiResponse::ok(business)))
}

pub async fn toggle(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let business = BusinessService::new(state.db.clone()).toggle_active(id).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "TOGGLE_BUSINESS",
        format!(
            "Business {} ({}) set to {}",
            business.name,
            business.id,
            if business.is_active { "active" } else { "inactive" }
        ),
    );

    Ok(Json(ApiResponse::ok(business)))
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
) -> AppResult<Json<ApiResponse<BusinessStats>>> {
    let stats = BusinessService::new(state.db.clone()).stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn delete(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    BusinessService::new(state.db.clone()).delete(id).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "DELETE_BUSINESS",
        format!("Deleted business {id}"),
    );

    Ok(Json(ApiResponse::message("Business deleted")))
}
