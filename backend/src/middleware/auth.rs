//! Bearer token middleware for the two principal domains

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::tokens::TokenIssuer;
use crate::AppState;
use shared::AdminRole;

/// Authenticated administrator attached to the request
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub email: String,
    pub role: AdminRole,
}

impl CurrentAdmin {
    /// Guard for operations restricted to SUPERADMIN
    pub fn require_superadmin(&self) -> AppResult<()> {
        if self.role == AdminRole::Superadmin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "SUPERADMIN role required".to_string(),
            ))
        }
    }
}

/// Authenticated end user attached to the request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub phone: String,
}

/// Optional end user: present when a valid bearer token accompanies an
/// otherwise public request, absent otherwise
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

fn bearer_token(parts_or_headers: &axum::http::HeaderMap) -> AppResult<&str> {
    parts_or_headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))
}

/// Reject the request unless it carries a valid admin access token
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = TokenIssuer::new(&state.config.jwt).verify_admin_access(token)?;

    let admin = CurrentAdmin {
        id: claims.admin_id()?,
        email: claims.email.clone(),
        role: claims.role,
    };
    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}

/// Reject the request unless it carries a valid user access token
pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = TokenIssuer::new(&state.config.jwt).verify_user_access(token)?;

    let user = CurrentUser {
        id: claims.user_id()?,
        phone: claims.phone.clone(),
    };
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Admin authentication required".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("User authentication required".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_token(&parts.headers)
            .ok()
            .and_then(|token| TokenIssuer::new(&state.config.jwt).verify_user_access(token).ok())
            .and_then(|claims| {
                Some(CurrentUser {
                    id: claims.user_id().ok()?,
                    phone: claims.phone,
                })
            });
        Ok(MaybeUser(user))
    }
}
