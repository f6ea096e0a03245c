//! Order, custom order (encargo) and transport request models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// Kinds of orders the marketplace accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Delivery,
    Encargo,
    Transporte,
}

/// Accepted payment methods (cash and the two mobile wallets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Efectivo,
    Yape,
    Plin,
}

/// Delivery order lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Nuevo,
    Confirmado,
    Preparando,
    EnCamino,
    Entregado,
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Nuevo => "NUEVO",
            OrderStatus::Confirmado => "CONFIRMADO",
            OrderStatus::Preparando => "PREPARANDO",
            OrderStatus::EnCamino => "EN_CAMINO",
            OrderStatus::Entregado => "ENTREGADO",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }

    /// States reachable from `self`. Terminal states are absorbing.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Nuevo => &[OrderStatus::Confirmado, OrderStatus::Cancelado],
            OrderStatus::Confirmado => &[OrderStatus::Preparando, OrderStatus::Cancelado],
            OrderStatus::Preparando => &[OrderStatus::EnCamino, OrderStatus::Cancelado],
            OrderStatus::EnCamino => &[OrderStatus::Entregado, OrderStatus::Cancelado],
            OrderStatus::Entregado => &[],
            OrderStatus::Cancelado => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// A delivery order with its customer snapshot and computed totals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_type: OrderType,
    pub business_id: Option<Uuid>,
    /// Registered user, if the order was placed while authenticated
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    /// Delivery point, when the client shared its location
    pub customer_coordinates: Option<sqlx::types::Json<GpsCoordinates>>,
    pub customer_notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    /// Always subtotal + delivery_fee at creation time; immutable afterwards
    pub total: Decimal,
    pub status: OrderStatus,
    pub assigned_driver: Option<String>,
    pub estimated_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item with the product price snapshotted at order time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price at creation; later product price changes never touch this
    pub price: Decimal,
    pub notes: Option<String>,
}

/// Custom order (encargo) urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "urgency", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Normal,
    Urgente,
}

/// Custom order lifecycle states (managed manually; no transition endpoint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "custom_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomOrderStatus {
    Pendiente,
    Cotizado,
    Aceptado,
    Completado,
    Cancelado,
}

/// A custom errand request ("encargo")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomOrder {
    pub id: Uuid,
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub notes: Option<String>,
    pub status: CustomOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transport request lifecycle states (managed manually)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transport_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportStatus {
    Cotizando,
    Confirmado,
    EnRuta,
    Completado,
    Cancelado,
}

/// A point-to-point transport request
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransportRequest {
    pub id: Uuid,
    pub service_type: String,
    pub vehicle_type: String,
    pub origin: String,
    pub destination: String,
    pub description: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub status: TransportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Nuevo,
        OrderStatus::Confirmado,
        OrderStatus::Preparando,
        OrderStatus::EnCamino,
        OrderStatus::Entregado,
        OrderStatus::Cancelado,
    ];

    #[test]
    fn test_happy_path_transitions() {
        assert!(OrderStatus::Nuevo.can_transition_to(OrderStatus::Confirmado));
        assert!(OrderStatus::Confirmado.can_transition_to(OrderStatus::Preparando));
        assert!(OrderStatus::Preparando.can_transition_to(OrderStatus::EnCamino));
        assert!(OrderStatus::EnCamino.can_transition_to(OrderStatus::Entregado));
    }

    #[test]
    fn test_cancellation_from_every_active_state() {
        for s in [
            OrderStatus::Nuevo,
            OrderStatus::Confirmado,
            OrderStatus::Preparando,
            OrderStatus::EnCamino,
        ] {
            assert!(s.can_transition_to(OrderStatus::Cancelado), "{s:?}");
        }
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for terminal in [OrderStatus::Entregado, OrderStatus::Cancelado] {
            assert!(terminal.is_terminal());
            for next in ALL {
                assert!(!terminal.can_transition_to(next), "{terminal:?} -> {next:?}");
            }
        }
    }

    #[test]
    fn test_no_state_skipping() {
        assert!(!OrderStatus::Nuevo.can_transition_to(OrderStatus::Preparando));
        assert!(!OrderStatus::Nuevo.can_transition_to(OrderStatus::EnCamino));
        assert!(!OrderStatus::Nuevo.can_transition_to(OrderStatus::Entregado));
        assert!(!OrderStatus::Confirmado.can_transition_to(OrderStatus::Entregado));
    }

    #[test]
    fn test_no_self_transitions() {
        for s in ALL {
            assert!(!s.can_transition_to(s), "{s:?}");
        }
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!OrderStatus::Confirmado.can_transition_to(OrderStatus::Nuevo));
        assert!(!OrderStatus::EnCamino.can_transition_to(OrderStatus::Preparando));
    }
}
