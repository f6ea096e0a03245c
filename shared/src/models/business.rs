//! Business (merchant) models

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Business categories supported by the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "business_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessType {
    Restaurante,
    Tienda,
    Farmacia,
    Otros,
}

impl BusinessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Restaurante => "RESTAURANTE",
            BusinessType::Tienda => "TIENDA",
            BusinessType::Farmacia => "FARMACIA",
            BusinessType::Otros => "OTROS",
        }
    }
}

/// Opening hours for a single weekday
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    /// Opening time, "HH:MM"
    pub open: String,
    /// Closing time, "HH:MM"
    pub close: String,
    pub is_open: bool,
}

/// Weekly schedule keyed by Spanish weekday name (lunes..domingo)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeeklySchedule(pub HashMap<String, DaySchedule>);

impl WeeklySchedule {
    pub fn day_key(weekday: Weekday) -> &'static str {
        match weekday {
            Weekday::Mon => "lunes",
            Weekday::Tue => "martes",
            Weekday::Wed => "miercoles",
            Weekday::Thu => "jueves",
            Weekday::Fri => "viernes",
            Weekday::Sat => "sabado",
            Weekday::Sun => "domingo",
        }
    }

    /// Whether the business is open at the given local instant.
    ///
    /// Times are compared lexicographically as "HH:MM", matching the stored
    /// zero-padded format.
    pub fn is_open_at(&self, local: DateTime<chrono::FixedOffset>) -> bool {
        let key = Self::day_key(local.weekday());
        let Some(day) = self.0.get(key) else {
            return false;
        };
        if !day.is_open {
            return false;
        }
        let now = local.format("%H:%M").to_string();
        day.open.as_str() <= now.as_str() && now.as_str() <= day.close.as_str()
    }
}

/// Optional discount attached to a business or product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A business listed on the marketplace
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub business_type: BusinessType,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: String,
    pub phone: String,
    pub zone: String,
    pub schedule: sqlx::types::Json<WeeklySchedule>,
    pub delivery_fee: Decimal,
    pub minimum_order: Decimal,
    pub is_active: bool,
    pub is_promoted: bool,
    pub rating: f64,
    pub review_count: i32,
    pub discount: Option<sqlx::types::Json<Discount>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public listing view of a business with its computed open/closed state
#[derive(Debug, Clone, Serialize)]
pub struct BusinessWithStatus {
    #[serde(flatten)]
    pub business: Business,
    pub is_open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule_with(day: &str, open: &str, close: &str, is_open: bool) -> WeeklySchedule {
        let mut map = HashMap::new();
        map.insert(
            day.to_string(),
            DaySchedule {
                open: open.to_string(),
                close: close.to_string(),
                is_open,
            },
        );
        WeeklySchedule(map)
    }

    // 2024-01-01 was a Monday
    fn monday_at(h: u32, m: u32) -> DateTime<chrono::FixedOffset> {
        chrono::FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_open_within_hours() {
        let s = schedule_with("lunes", "08:00", "22:00", true);
        assert!(s.is_open_at(monday_at(12, 0)));
        assert!(s.is_open_at(monday_at(8, 0)));
        assert!(s.is_open_at(monday_at(22, 0)));
    }

    #[test]
    fn test_closed_outside_hours() {
        let s = schedule_with("lunes", "08:00", "22:00", true);
        assert!(!s.is_open_at(monday_at(7, 59)));
        assert!(!s.is_open_at(monday_at(22, 1)));
    }

    #[test]
    fn test_closed_when_flag_off() {
        let s = schedule_with("lunes", "08:00", "22:00", false);
        assert!(!s.is_open_at(monday_at(12, 0)));
    }

    #[test]
    fn test_closed_when_day_missing() {
        let s = schedule_with("martes", "08:00", "22:00", true);
        assert!(!s.is_open_at(monday_at(12, 0)));
    }
}
