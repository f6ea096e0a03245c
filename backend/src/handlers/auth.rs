//! Admin authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::check;
use crate::middleware::auth::CurrentAdmin;
use crate::services::audit::AuditService;
use crate::services::auth::{AdminLoginRequest, AdminRegisterRequest, AuthService, RefreshRequest};
use crate::services::tokens::{TokenIssuer, TokenPair};
use crate::AppState;
use shared::{validation, Admin, ApiResponse};

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub admin: Admin,
    pub tokens: TokenPair,
}

fn service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), TokenIssuer::new(&state.config.jwt))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> AppResult<Json<ApiResponse<AdminSession>>> {
    check("email", validation::validate_email(&request.email))?;

    let (admin, tokens) = service(&state).login(request).await?;
    Ok(Json(ApiResponse::ok(AdminSession { admin, tokens })))
}

/// Create a new admin account. SUPERADMIN only.
pub async fn register(
    State(state): State<AppState>,
    current: CurrentAdmin,
    Json(request): Json<AdminRegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Admin>>)> {
    current.require_superadmin()?;
    check("email", validation::validate_email(&request.email))?;
    check("password", validation::validate_password(&request.password))?;

    let admin = service(&state).register(request).await?;

    AuditService::new(state.db.clone()).record(
        current.id,
        "CREATE_ADMIN",
        format!("Created admin {} with role {}", admin.email, admin.role.as_str()),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(admin))))
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
    current: CurrentAdmin,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let admin = service(&state).get_admin(current.id).await?;
    Ok(Json(ApiResponse::ok(admin)))
}
