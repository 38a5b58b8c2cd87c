use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Category, Product};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    pub category_id: Option<Uuid>,
}

/// Partial update; absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
}

pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- Products ---

    pub async fn create_product(
        &self,
        organization_id: Uuid,
        input: CreateProductInput,
    ) -> Result<Product, CatalogError> {
        validate_name(&input.name)?;
        validate_price(input.price)?;

        if input.stock_quantity < 0 {
            return Err(CatalogError::InvalidInput(
                "Stock quantity cannot be negative".to_string(),
            ));
        }

        if let Some(category_id) = input.category_id {
            self.ensure_category(organization_id, category_id).await?;
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn list_products(&self, organization_id: Uuid) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at
            FROM products
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_product(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
    ) -> Result<Product, CatalogError> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at
            FROM products
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(product_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
    }

    pub async fn update_product(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<Product, CatalogError> {
        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(price) = input.price {
            validate_price(price)?;
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category(organization_id, category_id).await?;
        }

        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                category_id = COALESCE($6, category_id),
                updated_at = $7
            WHERE id = $1 AND organization_id = $2
            RETURNING id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(product_id.to_string()))
    }

    pub async fn delete_product(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND organization_id = $2")
            .bind(product_id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(product_id.to_string()));
        }

        Ok(())
    }

    /// Apply a stock delta (positive restock, negative sale). The quantity
    /// is never allowed below zero.
    pub async fn adjust_inventory(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        delta: i32,
    ) -> Result<Product, CatalogError> {
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $3, updated_at = $4
            WHERE id = $1 AND organization_id = $2 AND stock_quantity + $3 >= 0
            RETURNING id, organization_id, category_id, name, description, price, stock_quantity, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(organization_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(product) => Ok(product),
            None => {
                // Distinguish "would go negative" from "no such product"
                self.get_product(organization_id, product_id).await?;
                Err(CatalogError::InsufficientStock(product_id.to_string()))
            }
        }
    }

    // --- Categories ---

    pub async fn create_category(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Category, CatalogError> {
        validate_name(name)?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, organization_id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, organization_id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn list_categories(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Category>, CatalogError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, organization_id, name, created_at, updated_at
            FROM categories
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn update_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        name: &str,
    ) -> Result<Category, CatalogError> {
        validate_name(name)?;

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $3, updated_at = $4
            WHERE id = $1 AND organization_id = $2
            RETURNING id, organization_id, name, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(organization_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(category_id.to_string()))
    }

    /// Delete a category; products in it fall back to "uncategorized".
    pub async fn delete_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE products SET category_id = NULL WHERE category_id = $1 AND organization_id = $2",
        )
        .bind(category_id)
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND organization_id = $2")
            .bind(category_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(category_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ensure_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), CatalogError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM categories WHERE id = $1 AND organization_id = $2",
        )
        .bind(category_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        if count.0 == 0 {
            return Err(CatalogError::UnknownCategory(category_id.to_string()));
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidInput("Name cannot be empty".to_string()));
    }
    if name.len() > 200 {
        return Err(CatalogError::InvalidInput(
            "Name must be less than 200 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), CatalogError> {
    if price < Decimal::ZERO {
        return Err(CatalogError::InvalidInput(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_names() {
        assert!(validate_name("Espresso").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn rejects_negative_prices() {
        assert!(validate_price(Decimal::new(1050, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
    }
}
