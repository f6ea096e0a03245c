//! Back-office administrator authentication

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::tokens::{TokenIssuer, TokenPair};
use shared::{Admin, AdminRole};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminRegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: AdminRole,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub struct AuthService {
    db: PgPool,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(db: PgPool, tokens: TokenIssuer) -> Self {
        Self { db, tokens }
    }

    /// Validate credentials and issue a token pair.
    ///
    /// Inactive accounts are rejected with the same error as bad credentials
    /// so the response does not reveal which accounts exist.
    pub async fn login(&self, request: AdminLoginRequest) -> AppResult<(Admin, TokenPair)> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT * FROM admins WHERE email = $1",
        )
        .bind(request.email.to_lowercase())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !admin.is_active {
            return Err(AppError::InvalidCredentials);
        }

        let hash = admin.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(request.password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE admins SET last_access = NOW() WHERE id = $1")
            .bind(admin.id)
            .execute(&self.db)
            .await?;

        let pair = self.tokens.issue_admin_pair(admin.id, &admin.email, admin.role)?;
        Ok((admin, pair))
    }

    /// Create a new administrator account. Callers must already have checked
    /// that the acting admin is a SUPERADMIN.
    pub async fn register(&self, request: AdminRegisterRequest) -> AppResult<Admin> {
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(request.password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;

        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (id, email, password_hash, name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.email.to_lowercase())
        .bind(password_hash)
        .bind(request.name)
        .bind(request.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Email"))?;

        Ok(admin)
    }

    /// Exchange a refresh token for a fresh pair
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.verify_admin_refresh(refresh_token)?;
        let admin_id = claims.admin_id()?;

        // Re-read the account so revoked admins lose access at refresh time
        let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(admin_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !admin.is_active {
            return Err(AppError::Forbidden("Account is disabled".to_string()));
        }

        self.tokens.issue_admin_pair(admin.id, &admin.email, admin.role)
    }

    pub async fn get_admin(&self, admin_id: Uuid) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(admin_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin not found".to_string()))
    }
}
