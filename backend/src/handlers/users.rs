//! End-user registration, verification and profile handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::check;
use crate::middleware::auth::{CurrentAdmin, CurrentUser};
use crate::services::auth::RefreshRequest;
use crate::services::order::{OrderService, OrderWithItems};
use crate::services::tokens::{TokenIssuer, TokenPair};
use crate::services::users::{
    PhoneRequest, RegisterUserRequest, UpdateProfileRequest, UserFilters, UserOverview, UserStats,
    UsersService, VerifyPhoneRequest,
};
use crate::AppState;
use shared::{validation, ApiResponse, PaginatedResponse, Pagination, User};

#[derive(Debug, Serialize)]
pub struct UserSession {
    pub user: User,
    pub tokens: TokenPair,
}

fn service(state: &AppState) -> UsersService {
    UsersService::new(
        state.db.clone(),
        state.codes.clone(),
        state.messenger.clone(),
        TokenIssuer::new(&state.config.jwt),
    )
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    check("full_name", validation::validate_customer_name(&request.full_name))?;
    check("phone", validation::validate_phone(&request.phone))?;
    check("email", validation::validate_email(&request.email))?;
    check("address", validation::validate_address(&request.address))?;
    check(
        "location",
        validation::validate_coordinates(request.location_lat, request.location_lng),
    )?;

    let user = service(&state).register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            user,
            "Verification code sent to your phone",
        )),
    ))
}

pub async fn verify_phone(
    State(state): State<AppState>,
    Json(request): Json<VerifyPhoneRequest>,
) -> AppResult<Json<ApiResponse<UserSession>>> {
    check("phone", validation::validate_phone(&request.phone))?;

    let (user, tokens) = service(&state).verify_phone(request).await?;
    Ok(Json(ApiResponse::ok(UserSession { user, tokens })))
}

pub async fn resend_code(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    check("phone", validation::validate_phone(&request.phone))?;

    service(&state).resend_code(&request.phone).await?;
    Ok(Json(ApiResponse::message("Verification code sent")))
}

/// Log in with a verified phone number
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<PhoneRequest>,
) -> AppResult<Json<ApiResponse<UserSession>>> {
    check("phone", validation::validate_phone(&request.phone))?;

    let (user, tokens) = service(&state).login(&request.phone).await?;
    Ok(Json(ApiResponse::ok(UserSession { user, tokens })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let tokens = service(&state).refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = service(&state).get_profile(current.id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    if let Some(ref name) = request.full_name {
        check("full_name", validation::validate_customer_name(name))?;
    }
    if let Some(ref phone) = request.phone {
        check("phone", validation::validate_phone(phone))?;
    }
    if let Some(ref email) = request.email {
        check("email", validation::validate_email(email))?;
    }
    if let Some(ref address) = request.address {
        check("address", validation::validate_address(address))?;
    }
    if let (Some(lat), Some(lng)) = (request.location_lat, request.location_lng) {
        check("location", validation::validate_coordinates(lat, lng))?;
    }

    let user = service(&state).update_profile(current.id, request).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Orders placed by the authenticated user
pub async fn my_orders(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<OrderWithItems>>>> {
    let orders = OrderService::new(state.db.clone()).by_user(current.id).await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// Single order detail, only when it belongs to the authenticated user
pub async fn my_order(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let order = OrderService::new(state.db.clone()).get(id).await?;
    if order.order.user_id != Some(current.id) {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(Json(ApiResponse::ok(order)))
}

/// Admin listing of accounts with their order aggregates
pub async fn list_users(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Query(filters): Query<UserFilters>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<UserOverview>>>> {
    let page = service(&state).list(filters, pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn user_stats(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
) -> AppResult<Json<ApiResponse<UserStats>>> {
    let stats = service(&state).stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn user_detail(
    State(state): State<AppState>,
    _admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserOverview>>> {
    let user = service(&state).overview(id).await?;
    Ok(Json(ApiResponse::ok(user)))
}
