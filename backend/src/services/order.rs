//! Order intake and lifecycle management
//!
//! Delivery orders snapshot product prices into line items at creation time
//! and compute totals server side. Status changes go through the transition
//! table on `OrderStatus`; nothing else may touch a persisted total.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    Business, CustomOrder, CustomOrderStatus, GpsCoordinates, Order, OrderItem, OrderStatus,
    OrderType, PaginatedResponse, Pagination, PaginationMeta, PaymentMethod, Product,
    ProductSummary, TransportRequest, TransportStatus, Urgency,
};

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub business_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_coordinates: Option<GpsCoordinates>,
    pub customer_notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub assigned_driver: Option<String>,
    pub estimated_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub business_id: Option<Uuid>,
    pub phone: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Matches against the customer name
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomOrderRequest {
    pub description: String,
    pub category: String,
    pub urgency: Urgency,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransportRequest {
    pub service_type: String,
    pub vehicle_type: String,
    pub origin: String,
    pub destination: String,
    pub description: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Line item detail joined with its product reference
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: ProductSummary,
}

/// Full order view returned by the read endpoints
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total: i64,
    pub by_status: HashMap<String, i64>,
    pub today_orders: i64,
    /// Sum of totals of orders delivered today
    pub today_revenue: Decimal,
}

/// A line item priced and validated, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLineItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub notes: Option<String>,
}

/// Price the requested items against the products actually on sale.
///
/// Every requested product must appear in `products` (the set fetched as
/// available for the target business). Prices are taken from the products,
/// never from the request.
pub fn build_line_items(
    items: &[OrderItemRequest],
    products: &HashMap<Uuid, Product>,
) -> AppResult<(Vec<PricedLineItem>, Decimal)> {
    if items.is_empty() {
        return Err(AppError::InvalidRequest(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut priced = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;

    for item in items {
        if item.quantity < 1 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be at least 1".to_string(),
            });
        }

        let product = products.get(&item.product_id).ok_or_else(|| {
            AppError::InvalidRequest("One or more products are not available".to_string())
        })?;

        subtotal += product.price * Decimal::from(item.quantity);
        priced.push(PricedLineItem {
            product_id: product.id,
            quantity: item.quantity,
            price: product.price,
            notes: item.notes.clone(),
        });
    }

    Ok((priced, subtotal))
}

pub struct OrderService {
    db: PgPool,
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a delivery order against an active business.
    ///
    /// Order and line items are inserted in one transaction; a failure at any
    /// point leaves no partial order behind.
    pub async fn create_delivery_order(
        &self,
        request: CreateOrderRequest,
        user_id: Option<Uuid>,
    ) -> AppResult<OrderWithItems> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE id = $1 AND is_active = true",
        )
        .bind(request.business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business not found or inactive".to_string()))?;

        let product_ids: Vec<Uuid> = request.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE id = ANY($1) AND business_id = $2 AND is_available = true
            "#,
        )
        .bind(&product_ids)
        .bind(business.id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

        let (line_items, subtotal) = build_line_items(&request.items, &products)?;

        if subtotal < business.minimum_order {
            return Err(AppError::MinimumOrderNotMet {
                minimum: business.minimum_order,
            });
        }

        let total = subtotal + business.delivery_fee;

        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, order_type, business_id, user_id, customer_name,
                customer_phone, customer_address, customer_coordinates,
                customer_notes, payment_method, payment_proof, subtotal,
                delivery_fee, total, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(OrderType::Delivery)
        .bind(business.id)
        .bind(user_id)
        .bind(request.customer_name)
        .bind(request.customer_phone)
        .bind(request.customer_address)
        .bind(request.customer_coordinates.map(sqlx::types::Json))
        .bind(request.customer_notes)
        .bind(request.payment_method)
        .bind(request.payment_proof)
        .bind(subtotal)
        .bind(business.delivery_fee)
        .bind(total)
        .bind(OrderStatus::Nuevo)
        .fetch_one(&mut *tx)
        .await?;

        for item in &line_items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, price, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.notes.clone())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order.id, business = %business.name, %total, "order created");
        self.get(order.id).await
    }

    /// Advance an order through its lifecycle. Transitions outside the table
    /// are rejected; terminal states accept nothing, including themselves.
    pub async fn update_status(
        &self,
        id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if !order.status.can_transition_to(request.status) {
            return Err(AppError::InvalidTransition {
                from: order.status.as_str().to_string(),
                to: request.status.as_str().to_string(),
            });
        }

        let updated = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                status = $2,
                assigned_driver = COALESCE($3, assigned_driver),
                estimated_time = COALESCE($4, estimated_time),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.assigned_driver)
        .bind(request.estimated_time)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %id,
            from = order.status.as_str(),
            to = updated.status.as_str(),
            "order status changed"
        );
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<OrderWithItems> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let items = self.items_for(order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    async fn items_for(&self, order_id: Uuid) -> AppResult<Vec<OrderItemDetail>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                   oi.notes, p.name AS product_name, p.category AS product_category,
                   p.image AS product_image
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderItemRow::into_detail).collect())
    }

    pub async fn list(
        &self,
        filters: OrderFilters,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Order>> {
        let pagination = pagination.clamped();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE true");
        let mut query = QueryBuilder::new("SELECT * FROM orders WHERE true");
        for builder in [&mut count, &mut query] {
            if let Some(status) = filters.status {
                builder.push(" AND status = ").push_bind(status);
            }
            if let Some(order_type) = filters.order_type {
                builder.push(" AND order_type = ").push_bind(order_type);
            }
            if let Some(business_id) = filters.business_id {
                builder.push(" AND business_id = ").push_bind(business_id);
            }
            if let Some(ref phone) = filters.phone {
                builder.push(" AND customer_phone = ").push_bind(phone.clone());
            }
            if let Some(from) = filters.from {
                builder.push(" AND created_at >= ").push_bind(from);
            }
            if let Some(to) = filters.to {
                builder.push(" AND created_at <= ").push_bind(to);
            }
            if let Some(ref search) = filters.search {
                builder
                    .push(" AND customer_name ILIKE ")
                    .push_bind(format!("%{search}%"));
            }
        }

        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        query.push(" ORDER BY created_at DESC");
        query.push(" LIMIT ").push_bind(i64::from(pagination.limit));
        query.push(" OFFSET ").push_bind(pagination.offset());

        let orders = query.build_query_as::<Order>().fetch_all(&self.db).await?;

        Ok(PaginatedResponse {
            items: orders,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    /// Most recent orders placed under a phone number (order tracking for
    /// guests). Capped at the last ten.
    pub async fn by_phone(&self, phone: &str) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE customer_phone = $1 ORDER BY created_at DESC LIMIT 10",
        )
        .bind(phone)
        .fetch_all(&self.db)
        .await?;

        let mut detailed = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_for(order.id).await?;
            detailed.push(OrderWithItems { order, items });
        }
        Ok(detailed)
    }

    /// Orders belonging to a registered user account
    pub async fn by_user(&self, user_id: Uuid) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut detailed = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_for(order.id).await?;
            detailed.push(OrderWithItems { order, items });
        }
        Ok(detailed)
    }

    pub async fn stats(&self) -> AppResult<OrderStats> {
        let rows: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(&self.db)
                .await?;

        let mut by_status = HashMap::new();
        let mut total = 0;
        for (status, count) in rows {
            total += count;
            by_status.insert(status.as_str().to_string(), count);
        }

        let today_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE created_at >= CURRENT_DATE",
        )
        .fetch_one(&self.db)
        .await?;

        let today_revenue: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(total) FROM orders
            WHERE status = 'ENTREGADO' AND updated_at >= CURRENT_DATE
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(OrderStats {
            total,
            by_status,
            today_orders,
            today_revenue: today_revenue.unwrap_or(Decimal::ZERO),
        })
    }

    pub async fn create_custom_order(
        &self,
        request: CreateCustomOrderRequest,
    ) -> AppResult<CustomOrder> {
        let custom = sqlx::query_as::<_, CustomOrder>(
            r#"
            INSERT INTO custom_orders (
                id, description, category, urgency, customer_name,
                customer_phone, customer_address, notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.description)
        .bind(request.category)
        .bind(request.urgency)
        .bind(request.customer_name)
        .bind(request.customer_phone)
        .bind(request.customer_address)
        .bind(request.notes)
        .bind(CustomOrderStatus::Pendiente)
        .fetch_one(&self.db)
        .await?;

        Ok(custom)
    }

    pub async fn list_custom_orders(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<CustomOrder>> {
        let pagination = pagination.clamped();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM custom_orders")
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, CustomOrder>(
            "SELECT * FROM custom_orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            items,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }

    pub async fn create_transport_request(
        &self,
        request: CreateTransportRequest,
    ) -> AppResult<TransportRequest> {
        let transport = sqlx::query_as::<_, TransportRequest>(
            r#"
            INSERT INTO transport_requests (
                id, service_type, vehicle_type, origin, destination,
                description, customer_name, customer_phone, scheduled_date,
                notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.service_type)
        .bind(request.vehicle_type)
        .bind(request.origin)
        .bind(request.destination)
        .bind(request.description)
        .bind(request.customer_name)
        .bind(request.customer_phone)
        .bind(request.scheduled_date)
        .bind(request.notes)
        .bind(TransportStatus::Cotizando)
        .fetch_one(&self.db)
        .await?;

        Ok(transport)
    }

    pub async fn list_transport_requests(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<TransportRequest>> {
        let pagination = pagination.clamped();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transport_requests")
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, TransportRequest>(
            "SELECT * FROM transport_requests ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            items,
            pagination: PaginationMeta::new(pagination, total as u64),
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    notes: Option<String>,
    product_name: String,
    product_category: String,
    product_image: Option<String>,
}

impl OrderItemRow {
    fn into_detail(self) -> OrderItemDetail {
        OrderItemDetail {
            product: ProductSummary {
                id: self.product_id,
                name: self.product_name,
                category: self.product_category,
                image: self.product_image,
            },
            item: OrderItem {
                id: self.id,
                order_id: self.order_id,
                product_id: self.product_id,
                quantity: self.quantity,
                price: self.price,
                notes: self.notes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: Uuid, price: Decimal) -> Product {
        Product {
            id,
            business_id: Uuid::new_v4(),
            name: "Lomo saltado".to_string(),
            description: None,
            price,
            category: "Platos".to_string(),
            image: None,
            is_available: true,
            is_popular: false,
            preparation_time: 20,
            ingredients: None,
            allergens: None,
            discount: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product_id: Uuid, quantity: i32) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
            notes: None,
        }
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let products = HashMap::from([
            (a, product(a, Decimal::new(1000, 2))),
            (b, product(b, Decimal::new(350, 2))),
        ]);

        let (lines, subtotal) =
            build_line_items(&[item(a, 2), item(b, 3)], &products).unwrap();

        assert_eq!(subtotal, Decimal::new(3050, 2));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price, Decimal::new(1000, 2));
        assert_eq!(lines[1].quantity, 3);
    }

    #[test]
    fn test_prices_come_from_catalog_not_request() {
        let a = Uuid::new_v4();
        let products = HashMap::from([(a, product(a, Decimal::new(725, 2)))]);
        let (lines, _) = build_line_items(&[item(a, 1)], &products).unwrap();
        assert_eq!(lines[0].price, Decimal::new(725, 2));
    }

    #[test]
    fn test_unknown_product_rejected() {
        let a = Uuid::new_v4();
        let products = HashMap::from([(a, product(a, Decimal::from(5)))]);
        let err = build_line_items(&[item(a, 1), item(Uuid::new_v4(), 1)], &products).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = build_line_items(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let a = Uuid::new_v4();
        let products = HashMap::from([(a, product(a, Decimal::from(5)))]);
        let err = build_line_items(&[item(a, 0)], &products).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
