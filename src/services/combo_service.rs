use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Combo, ComboItem};

#[derive(Debug, thiserror::Error)]
pub enum ComboError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Product does not belong to this organization: {0}")]
    ForeignProduct(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComboItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateComboInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub items: Vec<ComboItemInput>,
}

/// Partial update; `items`, when present, replaces the whole item list.
#[derive(Debug, Deserialize)]
pub struct UpdateComboInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub items: Option<Vec<ComboItemInput>>,
}

pub struct ComboService {
    pool: PgPool,
}

impl ComboService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        organization_id: Uuid,
        input: CreateComboInput,
    ) -> Result<(Combo, Vec<ComboItem>), ComboError> {
        validate_combo_name(&input.name)?;
        validate_price(input.price)?;
        validate_items(&input.items)?;
        self.ensure_products(organization_id, &input.items).await?;

        let mut tx = self.pool.begin().await?;

        let combo = sqlx::query_as::<_, Combo>(
            r#"
            INSERT INTO combos (id, organization_id, name, description, price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, organization_id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, ComboItem>(
                r#"
                INSERT INTO combo_items (id, combo_id, product_id, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, combo_id, product_id, quantity
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(combo.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        Ok((combo, items))
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Combo>, ComboError> {
        let combos = sqlx::query_as::<_, Combo>(
            r#"
            SELECT id, organization_id, name, description, price, created_at, updated_at
            FROM combos
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(combos)
    }

    pub async fn get(
        &self,
        organization_id: Uuid,
        combo_id: Uuid,
    ) -> Result<(Combo, Vec<ComboItem>), ComboError> {
        let combo = sqlx::query_as::<_, Combo>(
            r#"
            SELECT id, organization_id, name, description, price, created_at, updated_at
            FROM combos
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(combo_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ComboError::NotFound(combo_id.to_string()))?;

        let items = sqlx::query_as::<_, ComboItem>(
            r#"
            SELECT id, combo_id, product_id, quantity
            FROM combo_items
            WHERE combo_id = $1
            "#,
        )
        .bind(combo.id)
        .fetch_all(&self.pool)
        .await?;

        Ok((combo, items))
    }

    pub async fn update(
        &self,
        organization_id: Uuid,
        combo_id: Uuid,
        input: UpdateComboInput,
    ) -> Result<(Combo, Vec<ComboItem>), ComboError> {
        if let Some(name) = &input.name {
            validate_combo_name(name)?;
        }
        if let Some(price) = input.price {
            validate_price(price)?;
        }
        if let Some(items) = &input.items {
            validate_items(items)?;
            self.ensure_products(organization_id, items).await?;
        }

        let mut tx = self.pool.begin().await?;

        let combo = sqlx::query_as::<_, Combo>(
            r#"
            UPDATE combos
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                updated_at = $6
            WHERE id = $1 AND organization_id = $2
            RETURNING id, organization_id, name, description, price, created_at, updated_at
            "#,
        )
        .bind(combo_id)
        .bind(organization_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ComboError::NotFound(combo_id.to_string()))?;

        if let Some(new_items) = &input.items {
            sqlx::query("DELETE FROM combo_items WHERE combo_id = $1")
                .bind(combo.id)
                .execute(&mut *tx)
                .await?;

            for item in new_items {
                sqlx::query(
                    r#"
                    INSERT INTO combo_items (id, combo_id, product_id, quantity)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(combo.id)
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            }
        }

        let items = sqlx::query_as::<_, ComboItem>(
            r#"
            SELECT id, combo_id, product_id, quantity
            FROM combo_items
            WHERE combo_id = $1
            "#,
        )
        .bind(combo.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((combo, items))
    }

    pub async fn delete(&self, organization_id: Uuid, combo_id: Uuid) -> Result<(), ComboError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM combo_items WHERE combo_id = $1")
            .bind(combo_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM combos WHERE id = $1 AND organization_id = $2")
            .bind(combo_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ComboError::NotFound(combo_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Every referenced product must live in the same organization.
    async fn ensure_products(
        &self,
        organization_id: Uuid,
        items: &[ComboItemInput],
    ) -> Result<(), ComboError> {
        let mut product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        product_ids.sort();
        product_ids.dedup();

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM products WHERE organization_id = $1 AND id = ANY($2)",
        )
        .bind(organization_id)
        .bind(&product_ids)
        .fetch_one(&self.pool)
        .await?;

        if count.0 != product_ids.len() as i64 {
            return Err(ComboError::ForeignProduct(format!(
                "{} of {} products unknown",
                product_ids.len() as i64 - count.0,
                product_ids.len()
            )));
        }

        Ok(())
    }
}

fn validate_combo_name(name: &str) -> Result<(), ComboError> {
    if name.trim().is_empty() {
        return Err(ComboError::InvalidInput("Name cannot be empty".to_string()));
    }
    if name.len() > 200 {
        return Err(ComboError::InvalidInput(
            "Name must be less than 200 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ComboError> {
    if price < Decimal::ZERO {
        return Err(ComboError::InvalidInput(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_items(items: &[ComboItemInput]) -> Result<(), ComboError> {
    if items.is_empty() {
        return Err(ComboError::InvalidInput(
            "A combo needs at least one product".to_string(),
        ));
    }
    if items.iter().any(|i| i.quantity <= 0) {
        return Err(ComboError::InvalidInput(
            "Item quantities must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combos_require_items_with_positive_quantities() {
        assert!(validate_items(&[]).is_err());
        assert!(validate_items(&[ComboItemInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
        }])
        .is_err());
        assert!(validate_items(&[ComboItemInput {
            product_id: Uuid::new_v4(),
            quantity: 2,
        }])
        .is_ok());
    }
}
