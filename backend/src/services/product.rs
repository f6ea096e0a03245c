//! Product (menu) management

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{Discount, Product};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_popular: bool,
    pub preparation_time: i32,
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub discount: Option<Discount>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
    pub is_popular: Option<bool>,
    pub preparation_time: Option<i32>,
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub discount: Option<Discount>,
}

pub struct ProductService {
    db: PgPool,
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Available products of one business, grouped by category for the menu
    /// view. Categories sort alphabetically, popular items first within each.
    pub async fn menu(&self, business_id: Uuid) -> AppResult<BTreeMap<String, Vec<Product>>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE business_id = $1 AND is_available = true
            ORDER BY is_popular DESC, name ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: BTreeMap<String, Vec<Product>> = BTreeMap::new();
        for product in products {
            grouped.entry(product.category.clone()).or_default().push(product);
        }
        Ok(grouped)
    }

    /// Distinct menu categories a business currently offers
    pub async fn categories(&self, business_id: Uuid) -> AppResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category FROM products
            WHERE business_id = $1 AND is_available = true
            ORDER BY category ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(categories)
    }

    /// Popular products across active businesses (home screen carousel)
    pub async fn popular(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.* FROM products p
            JOIN businesses b ON b.id = p.business_id
            WHERE p.is_popular = true AND p.is_available = true AND b.is_active = true
            ORDER BY p.name ASC
            LIMIT 20
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    /// Every product of a business, including unavailable ones (admin view)
    pub async fn list_by_business(&self, business_id: Uuid) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE business_id = $1 ORDER BY category ASC, name ASC",
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    pub async fn create(&self, request: CreateProductRequest) -> AppResult<Product> {
        // The owning business must exist
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE id = $1")
            .bind(request.business_id)
            .fetch_one(&self.db)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound("Business not found".to_string()));
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                id, business_id, name, description, price, category, image,
                is_available, is_popular, preparation_time, ingredients,
                allergens, discount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.business_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.price)
        .bind(request.category)
        .bind(request.image)
        .bind(request.is_available)
        .bind(request.is_popular)
        .bind(request.preparation_time)
        .bind(request.ingredients)
        .bind(request.allergens)
        .bind(request.discount.map(sqlx::types::Json))
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    pub async fn update(&self, id: Uuid, request: UpdateProductRequest) -> AppResult<Product> {
        let current = self.get(id).await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $2, description = $3, price = $4, category = $5,
                image = $6, is_available = $7, is_popular = $8,
                preparation_time = $9, ingredients = $10, allergens = $11,
                discount = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name.unwrap_or(current.name))
        .bind(request.description.or(current.description))
        .bind(request.price.unwrap_or(current.price))
        .bind(request.category.unwrap_or(current.category))
        .bind(request.image.or(current.image))
        .bind(request.is_available.unwrap_or(current.is_available))
        .bind(request.is_popular.unwrap_or(current.is_popular))
        .bind(request.preparation_time.unwrap_or(current.preparation_time))
        .bind(request.ingredients.or(current.ingredients))
        .bind(request.allergens.or(current.allergens))
        .bind(request.discount.map(sqlx::types::Json).or(current.discount))
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Flip availability without touching the rest of the product
    pub async fn toggle_availability(&self, id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET is_available = NOT is_available, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    /// Delete a product. Refused while any order line item references it.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        let referenced: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        if referenced > 0 {
            return Err(AppError::InvalidRequest(
                "Product appears in existing orders and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
