//! Product and menu handlers

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::check;
use crate::middleware::auth::CurrentAdmin;
use crate::services::audit::AuditService;
use crate::services::product::{CreateProductRequest, ProductService, UpdateProductRequest};
use crate::AppState;
use shared::{validation, ApiResponse, Product};

/// Public menu of a business, grouped by category
pub async fn menu(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BTreeMap<String, Vec<Product>>>>> {
    let menu = ProductService::new(state.db.clone()).menu(business_id).await?;
    Ok(Json(ApiResponse::ok(menu)))
}

/// Public list of menu categories a business offers
pub async fn categories(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let categories = ProductService::new(state.db.clone())
        .categories(business_id)
        .await?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// Public popular products carousel
pub async fn popular(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductService::new(state.db.clone()).popular().await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// Admin view of every product of a business
pub async fn list_by_business(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductService::new(state.db.clone())
        .list_by_business(business_id)
        .await?;
    Ok(Json(ApiResponse::ok(products)))
}

pub async fn create(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Json(request): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    check("name", validation::validate_customer_name(&request.name))?;
    check("price", validation::validate_price(request.price))?;
    check(
        "preparation_time",
        validation::validate_preparation_time(request.preparation_time),
    )?;

    let product = ProductService::new(state.db.clone()).create(request).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "CREATE_PRODUCT",
        format!("Created product {} ({})", product.name, product.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

pub async fn update(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    if let Some(price) = request.price {
        check("price", validation::validate_price(price))?;
    }
    if let Some(minutes) = request.preparation_time {
        check("preparation_time", validation::validate_preparation_time(minutes))?;
    }

    let product = ProductService::new(state.db.clone()).update(id, request).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "UPDATE_PRODUCT",
        format!("Updated product {} ({})", product.name, product.id),
    );

    Ok(Json(ApiResponse::ok(product)))
}

pub async fn toggle(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = ProductService::new(state.db.clone())
        .toggle_availability(id)
        .await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "TOGGLE_PRODUCT",
        format!(
            "Product {} ({}) set to {}",
            product.name,
            product.id,
            if product.is_available { "available" } else { "unavailable" }
        ),
    );

    Ok(Json(ApiResponse::ok(product)))
}

pub async fn delete(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    ProductService::new(state.db.clone()).delete(id).await?;

    AuditService::new(state.db.clone()).record(
        admin.id,
        "DELETE_PRODUCT",
        format!("Deleted product {id}"),
    );

    Ok(Json(ApiResponse::message("Product deleted")))
}
