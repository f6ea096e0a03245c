//! Product (menu item) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::business::Discount;

/// A product offered by exactly one business
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, precision to cents
    pub price: Decimal,
    pub category: String,
    pub image: Option<String>,
    pub is_available: bool,
    pub is_popular: bool,
    /// Preparation estimate in minutes (1-120)
    pub preparation_time: i32,
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub discount: Option<sqlx::types::Json<Discount>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact product reference embedded in order line items
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
}
