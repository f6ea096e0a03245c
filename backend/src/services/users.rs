//! End-user accounts and the phone verification flow
//!
//! Users authenticate with their phone number alone. A six-digit code is
//! delivered over WhatsApp; verifying it flips `phone_verified` on first
//! registration and acts as the password on subsequent logins. Changing the
//! phone number drops verified status until the new number is confirmed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::VerificationSender;
use crate::services::tokens::{TokenIssuer, TokenPair};
use crate::services::verification::CodeStore;
use shared::{PaginatedResponse, Pagination, PaginationMeta, User};

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub location_lat: Decimal,
    pub location_lng: Decimal,
    pub accepted_terms: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPhoneRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub location_lat: Option<Decimal>,
    pub location_lng: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilters {
    /// Matches name, email or phone
    pub search: Option<String>,
    pub verified: Option<bool>,
}

/// Account row with its order aggregates for the back office
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserOverview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub user: User,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub last_order_at: Option<DateTime<Utc>>,
}

/// Account counters for the admin dashboard
#[derive(Debug, PartialEq, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub verified: i64,
    pub unverified: i64,
    pub new_today: i64,
    pub new_this_week: i64,
    pub new_this_month: i64,
}

impl UserStats {
    fn from_counts(total: i64, verified: i64, today: i64, week: i64, month: i64) -> Self {
        Self {
            total,
            verified,
            unverified: total - verified,
            new_today: today,
            new_this_week: week,
            new_this_month: month,
        }
    }
}

/// Which duplicate to report at registration. The phone check runs first,
/// so a request clashing on both fields reports the phone.
fn duplicate_conflict(phone_taken: bool, email_taken: bool) -> Option<AppError> {
    if phone_taken {
        Some(AppError::Conflict("Phone is already registered".to_string()))
    } else if email_taken {
        Some(AppError::Conflict("Email is already registered".to_string()))
    } else {
        None
    }
}

pub struct UsersService {
    db: PgPool,
    codes: CodeStore,
    messenger: Arc<dyn VerificationSender>,
    tokens: TokenIssuer,
}

impl UsersService {
    pub fn new(
        db: PgPool,
        codes: CodeStore,
        messenger: Arc<dyn VerificationSender>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            db,
            codes,
            messenger,
            tokens,
        }
    }

    /// Create an unverified account and send the first verification code.
    ///
    /// Delivery failure surfaces as an error, but the account already
    /// exists at that point; the client recovers through the resend
    /// endpoint once the messaging channel is back.
    pub async fn register(&self, request: RegisterUserRequest) -> AppResult<User> {
        if !request.accepted_terms {
            return Err(AppError::Validation {
                field: "accepted_terms".to_string(),
                message: "Terms must be accepted".to_string(),
            });
        }

        // Fast-path duplicate reporting, phone before email. The unique
        // constraints remain the authoritative guard against races.
        let phone_taken = self.phone_exists(&request.phone).await?;
        let email_taken = !phone_taken && self.email_exists(&request.email).await?;
        if let Some(err) = duplicate_conflict(phone_taken, email_taken) {
            return Err(err);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, full_name, phone, email, address, location_lat,
                location_lng, phone_verified, accepted_terms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, false, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.full_name)
        .bind(&request.phone)
        .bind(request.email.to_lowercase())
        .bind(request.address)
        .bind(request.location_lat)
        .bind(request.location_lng)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Phone or email"))?;

        self.send_code(&user.phone).await?;

        Ok(user)
    }

    /// Confirm the registration code and mark the phone as verified.
    /// Issues the first token pair on success.
    pub async fn verify_phone(&self, request: VerifyPhoneRequest) -> AppResult<(User, TokenPair)> {
        let user = self.user_by_phone(&request.phone).await?;

        if user.phone_verified {
            return Err(AppError::AlreadyVerified);
        }

        if !self.codes.check(&request.phone, &request.code) {
            return Err(AppError::InvalidCode);
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET phone_verified = true, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .fetch_one(&self.db)
        .await?;

        let pair = self.tokens.issue_user_pair(user.id, &user.phone)?;
        tracing::info!(user_id = %user.id, "phone verified");
        Ok((user, pair))
    }

    /// Resend the registration code. Throttled while a live code is pending.
    pub async fn resend_code(&self, phone: &str) -> AppResult<()> {
        let user = self.user_by_phone(phone).await?;
        if user.phone_verified {
            return Err(AppError::AlreadyVerified);
        }
        self.send_code(phone).await
    }

    /// Log in a verified account. The verified phone number is the
    /// credential; unverified accounts are sent back to the code flow.
    pub async fn login(&self, phone: &str) -> AppResult<(User, TokenPair)> {
        let user = self.user_by_phone(phone).await?;

        if !user.phone_verified {
            return Err(AppError::Forbidden(
                "Phone is not verified yet".to_string(),
            ));
        }

        let pair = self.tokens.issue_user_pair(user.id, &user.phone)?;
        Ok((user, pair))
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.verify_user_refresh(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::InvalidToken)?;

        self.tokens.issue_user_pair(user.id, &user.phone)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Update profile fields. A phone change resets verified status and
    /// triggers a fresh code to the new number.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<User> {
        let current = self.get_profile(user_id).await?;

        let phone_changed = request
            .phone
            .as_ref()
            .map(|p| *p != current.phone)
            .unwrap_or(false);
        let new_phone = request.phone.unwrap_or_else(|| current.phone.clone());

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = $2, phone = $3, email = $4, address = $5,
                location_lat = $6, location_lng = $7,
                phone_verified = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request.full_name.unwrap_or(current.full_name))
        .bind(&new_phone)
        .bind(request.email.map(|e| e.to_lowercase()).unwrap_or(current.email))
        .bind(request.address.unwrap_or(current.address))
        .bind(request.location_lat.unwrap_or(current.location_lat))
        .bind(request.location_lng.unwrap_or(current.location_lng))
        .bind(if phone_changed { false } else { current.phone_verified })
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Phone or email"))?;

        if phone_changed {
            if let Err(e) = self.send_code(&new_phone).await {
                tracing::warn!(phone = %new_phone, error = %e, "code delivery to new phone failed");
            }
        }

        Ok(user)
    }

    /// Paginated account listing with order aggregates (back office)
    pub async fn list(
        &self,
        filters: UserFilters,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<UserOverview>> {
        let pagination = pagination.clamped();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users u WHERE true");
        let mut query = QueryBuilder::new(
            r#"
            SELECT u.*, COUNT(o.id) AS total_orders,
                   COALESCE(SUM(o.total), 0) AS total_spent,
                   MAX(o.created_at) AS last_order_at
            FROM users u LEFT JOIN orders o ON o.user_id = u.id
            WHERE true
            "#,
        );
        for builder in [&mut count, &mut query] {
            if let Some(ref search) = filters.search {
                let pattern = format!("%{search}%");
                builder
                    .push(" AND (u.full_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR u.email ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR u.phone ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            if let Some(verified) = filters.verified {
                builder.push(" AND u.phone_verified = ").push_bind(verified);
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        query.push(" GROUP BY u.id ORDER BY u.created_at DESC");
        query.push(" LIMIT ").push_bind(i64::from(pagination.limit));
        query.push(" OFFSET ").push_bind(pagination.offset());

        let items = query
            .build_query_as::<UserOverview>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            items,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    /// Single account with its order aggregates (back office)
    pub async fn overview(&self, user_id: Uuid) -> AppResult<UserOverview> {
        sqlx::query_as::<_, UserOverview>(
            r#"
            SELECT u.*, COUNT(o.id) AS total_orders,
                   COALESCE(SUM(o.total), 0) AS total_spent,
                   MAX(o.created_at) AS last_order_at
            FROM users u LEFT JOIN orders o ON o.user_id = u.id
            WHERE u.id = $1
            GROUP BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Account counters for the admin dashboard
    pub async fn stats(&self) -> AppResult<UserStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        let verified: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone_verified = true")
                .fetch_one(&self.db)
                .await?;
        let today: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= CURRENT_DATE")
                .fetch_one(&self.db)
                .await?;
        let week: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE created_at >= CURRENT_DATE - INTERVAL '7 days'",
        )
        .fetch_one(&self.db)
        .await?;
        let month: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE created_at >= CURRENT_DATE - INTERVAL '1 month'",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(UserStats::from_counts(total, verified, today, week, month))
    }

    async fn phone_exists(&self, phone: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email.to_lowercase())
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn user_by_phone(&self, phone: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Generate, deliver and store a code. The code only becomes checkable
    /// after delivery succeeds, so a failed send never locks the user out.
    async fn send_code(&self, phone: &str) -> AppResult<()> {
        if self.codes.has_pending(phone) {
            return Err(AppError::RateLimited);
        }

        let code = crate::services::verification::generate_code();
        self.messenger.send_code(phone, &code).await?;
        self.codes.put_code(phone, &code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_duplicate_wins_over_email() {
        let err = duplicate_conflict(true, true).unwrap();
        assert!(matches!(err, AppError::Conflict(ref m) if m.starts_with("Phone")));
    }

    #[test]
    fn test_email_duplicate_reported_on_its_own() {
        let err = duplicate_conflict(false, true).unwrap();
        assert!(matches!(err, AppError::Conflict(ref m) if m.starts_with("Email")));
    }

    #[test]
    fn test_no_duplicate_no_conflict() {
        assert!(duplicate_conflict(false, false).is_none());
    }

    #[test]
    fn test_stats_derive_unverified_from_total() {
        let stats = UserStats::from_counts(10, 7, 1, 3, 6);
        assert_eq!(stats.unverified, 3);
        assert_eq!(
            stats,
            UserStats {
                total: 10,
                verified: 7,
                unverified: 3,
                new_today: 1,
                new_this_week: 3,
                new_this_month: 6,
            }
        );
    }
}
