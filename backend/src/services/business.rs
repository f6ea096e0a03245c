//! Business catalog management

use std::collections::HashMap;

use chrono::{FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    Business, BusinessType, BusinessWithStatus, Discount, PaginatedResponse, Pagination,
    PaginationMeta, WeeklySchedule,
};

/// Local time zone of the marketplace (Peru, UTC-5, no DST)
fn local_now() -> chrono::DateTime<FixedOffset> {
    let offset = FixedOffset::west_opt(5 * 3600).expect("valid fixed offset");
    Utc::now().with_timezone(&offset)
}

fn with_status(business: Business) -> BusinessWithStatus {
    let is_open = business.is_active && business.schedule.0.is_open_at(local_now());
    BusinessWithStatus { business, is_open }
}

#[derive(Debug, Default, Deserialize)]
pub struct BusinessFilters {
    #[serde(rename = "type")]
    pub business_type: Option<BusinessType>,
    pub zone: Option<String>,
    pub search: Option<String>,
    /// Admin listing only; the public listing always filters on active
    pub is_active: Option<bool>,
    pub is_promoted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub business_type: BusinessType,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: String,
    pub phone: String,
    pub zone: String,
    pub schedule: WeeklySchedule,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    #[serde(default)]
    pub is_promoted: bool,
    pub discount: Option<Discount>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBusinessRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub business_type: Option<BusinessType>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zone: Option<String>,
    pub schedule: Option<WeeklySchedule>,
    pub delivery_fee: Option<Decimal>,
    pub minimum_order: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_promoted: Option<bool>,
    pub discount: Option<Discount>,
}

/// Catalog counters for the admin dashboard
#[derive(Debug, Serialize)]
pub struct BusinessStats {
    pub total: i64,
    pub active: i64,
    pub by_type: HashMap<String, i64>,
}

pub struct BusinessService {
    db: PgPool,
}

impl BusinessService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Public listing: active businesses only, promoted first, each with its
    /// computed open/closed state
    pub async fn list_public(
        &self,
        filters: BusinessFilters,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<BusinessWithStatus>> {
        let pagination = pagination.clamped();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM businesses WHERE is_active = true");
        let mut query = QueryBuilder::new("SELECT * FROM businesses WHERE is_active = true");
        for builder in [&mut count, &mut query] {
            apply_filters(builder, &filters);
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        query.push(" ORDER BY is_promoted DESC, rating DESC, name ASC");
        query.push(" LIMIT ").push_bind(i64::from(pagination.limit));
        query.push(" OFFSET ").push_bind(pagination.offset());

        let businesses = query
            .build_query_as::<Business>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            items: businesses.into_iter().map(with_status).collect(),
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    /// Admin listing: every business regardless of active flag
    pub async fn list_all(
        &self,
        filters: BusinessFilters,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<BusinessWithStatus>> {
        let pagination = pagination.clamped();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM businesses WHERE true");
        let mut query = QueryBuilder::new("SELECT * FROM businesses WHERE true");
        for builder in [&mut count, &mut query] {
            apply_filters(builder, &filters);
            if let Some(is_active) = filters.is_active {
                builder.push(" AND is_active = ").push_bind(is_active);
            }
            if let Some(is_promoted) = filters.is_promoted {
                builder.push(" AND is_promoted = ").push_bind(is_promoted);
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(i64::from(pagination.limit));
        query.push(" OFFSET ").push_bind(pagination.offset());

        let businesses = query
            .build_query_as::<Business>()
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            items: businesses.into_iter().map(with_status).collect(),
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BusinessWithStatus> {
        let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Business not found".to_string()))?;

        Ok(with_status(business))
    }

    pub async fn create(&self, request: CreateBusinessRequest) -> AppResult<Business> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (
                id, name, business_type, description, logo, address, phone, zone,
                schedule, delivery_fee, minimum_order, is_active, is_promoted, discount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, true, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name)
        .bind(request.business_type)
        .bind(request.description)
        .bind(request.logo)
        .bind(request.address)
        .bind(request.phone)
        .bind(request.zone)
        .bind(sqlx::types::Json(request.schedule))
        .bind(request.delivery_fee)
        .bind(request.minimum_order)
        .bind(request.is_promoted)
        .bind(request.discount.map(sqlx::types::Json))
        .fetch_one(&self.db)
        .await?;

        Ok(business)
    }

    pub async fn update(&self, id: Uuid, request: UpdateBusinessRequest) -> AppResult<Business> {
        let current = self.get(id).await?.business;

        let business = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses SET
                name = $2, business_type = $3, description = $4, logo = $5,
                address = $6, phone = $7, zone = $8, schedule = $9,
                delivery_fee = $10, minimum_order = $11, is_active = $12,
                is_promoted = $13, discount = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.unwrap_or(current.name))
        .bind(request.business_type.unwrap_or(current.business_type))
        .bind(request.description.or(current.description))
        .bind(request.logo.or(current.logo))
        .bind(request.address.unwrap_or(current.address))
        .bind(request.phone.unwrap_or(current.phone))
        .bind(request.zone.unwrap_or(current.zone))
        .bind(
            request
                .schedule
                .map(sqlx::types::Json)
                .unwrap_or(current.schedule),
        )
        .bind(request.delivery_fee.unwrap_or(current.delivery_fee))
        .bind(request.minimum_order.unwrap_or(current.minimum_order))
        .bind(request.is_active.unwrap_or(current.is_active))
        .bind(request.is_promoted.unwrap_or(current.is_promoted))
        .bind(request.discount.map(sqlx::types::Json).or(current.discount))
        .fetch_one(&self.db)
        .await?;

        Ok(business)
    }

    /// Flip the active flag without touching the rest of the business
    pub async fn toggle_active(&self, id: Uuid) -> AppResult<Business> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business not found".to_string()))
    }

    /// Catalog counters for the admin dashboard
    pub async fn stats(&self) -> AppResult<BusinessStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
            .fetch_one(&self.db)
            .await?;
        let active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE is_active = true")
                .fetch_one(&self.db)
                .await?;

        let rows: Vec<(BusinessType, i64)> = sqlx::query_as(
            "SELECT business_type, COUNT(*) FROM businesses GROUP BY business_type",
        )
        .fetch_all(&self.db)
        .await?;

        let by_type = rows
            .into_iter()
            .map(|(t, count)| (t.as_str().to_string(), count))
            .collect();

        Ok(BusinessStats {
            total,
            active,
            by_type,
        })
    }

    /// Delete a business. Refused while any order references it, so order
    /// history stays intact.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let order_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE business_id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        if order_count > 0 {
            return Err(AppError::InvalidRequest(format!(
                "Business has {order_count} associated orders and cannot be deleted"
            )));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM products WHERE business_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn apply_filters(builder: &mut QueryBuilder<'_, sqlx::Postgres>, filters: &BusinessFilters) {
    if let Some(business_type) = filters.business_type {
        builder.push(" AND business_type = ").push_bind(business_type);
    }
    if let Some(ref zone) = filters.zone {
        builder.push(" AND zone = ").push_bind(zone.clone());
    }
    if let Some(ref search) = filters.search {
        builder
            .push(" AND name ILIKE ")
            .push_bind(format!("%{search}%"));
    }
}
