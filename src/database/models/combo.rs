use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named bundle of products sold at its own price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Combo {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComboItem {
    pub id: Uuid,
    pub combo_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}
