//! Order intake, tracking and back-office handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::check;
use crate::middleware::auth::{CurrentAdmin, MaybeUser};
use crate::services::audit::AuditService;
use crate::services::order::{
    CreateCustomOrderRequest, CreateOrderRequest, CreateTransportRequest, OrderFilters,
    OrderService, OrderStats, OrderWithItems, UpdateOrderStatusRequest,
};
use crate::AppState;
use shared::{
    validation, ApiResponse, CustomOrder, Order, PaginatedResponse, Pagination, TransportRequest,
};

fn validate_customer(name: &str, phone: &str) -> AppResult<()> {
    check("customer_name", validation::validate_customer_name(name))?;
    check("customer_phone", validation::validate_phone(phone))?;
    Ok(())
}

/// Place a delivery order. Public, but a valid user token links the order
/// to that account.
pub async fn create(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(request): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    validate_customer(&request.customer_name, &request.customer_phone)?;
    check("customer_address", validation::validate_address(&request.customer_address))?;
    if let Some(ref coords) = request.customer_coordinates {
        check(
            "customer_coordinates",
            validation::validate_coordinates(coords.lat, coords.lng),
        )?;
    }

    let order = OrderService::new(state.db.clone())
        .create_delivery_order(request, user.map(|u| u.id))
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

/// Guest order tracking by phone number
pub async fn by_phone(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<OrderWithItems>>>> {
    check("phone", validation::validate_phone(&phone))?;

    let orders = OrderService::new(state.db.clone()).by_phone(&phone).await?;
    Ok(Json(ApiResponse::ok(orders)))
}

pub async fn create_custom(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CustomOrder>>)> {
    validate_customer(&request.customer_name, &request.customer_phone)?;
    check("customer_address", validation::validate_address(&request.customer_address))?;
    check("description", validation::validate_description(&request.description))?;

    let custom = OrderService::new(state.db.clone())
        .create_custom_order(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(custom))))
}

pub async fn create_transport(
    State(state): State<AppState>,
    Json(request): Json<CreateTransportRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransportRequest>>)> {
    validate_customer(&request.customer_name, &request.customer_phone)?;
    check("origin", validation::validate_address(&request.origin))?;
    check("destination", validation::validate_address(&request.destination))?;
    check("description", validation::validate_description(&request.description))?;

    let transport = OrderService::new(state.db.clone())
        .create_transport_request(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(transport))))
}

/// Admin order listing with filters
pub async fn list(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(filters): Query<OrderFilters>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let page = OrderService::new(state.db.clone())
        .list(filters, pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = OrderService::new(state.db.clone()).get(id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn update_status(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let new_status = request.status;
    let order = OrderService::new(state.db.clone())
        .update_status(id, request)
        .await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "UPDATE_ORDER_STATUS",
        format!("Order {id} moved to {}", new_status.as_str()),
    );

    Ok(Json(ApiResponse::ok(order)))
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
) -> AppResult<Json<ApiResponse<OrderStats>>> {
    let stats = OrderService::new(state.db.clone()).stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn list_custom(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<CustomOrder>>>> {
    let page = OrderService::new(state.db.clone())
        .list_custom_orders(pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn list_transport(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<TransportRequest>>>> {
    let page = OrderService::new(state.db.clone())
        .list_transport_requests(pagination)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}
