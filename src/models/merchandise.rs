use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchandise {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub team: Option<String>,
    pub price: Money,
    pub sizes: Vec<String>,
    pub stock_quantity: u32,
}

impl Merchandise {
    // Карточка помечает товар как заканчивающийся при остатке < 10
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity < 10
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MerchandiseOrderRequest {
    #[validate(length(min = 1))]
    pub merchandise_id: String,
    #[validate(length(min = 1, max = 8))]
    pub size: String,
    #[validate(range(min = 1, max = 20))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchandiseOrder {
    pub id: Uuid,
    pub merchandise_id: String,
    pub size: String,
    pub quantity: u32,
    pub total_amount: Money,
    pub order_status: String,
    pub created_at: DateTime<Utc>,
}
