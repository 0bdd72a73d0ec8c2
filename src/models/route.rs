use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use super::{layout::LayoutSpec, money::Money};

/// Автобусный рейс из каталога.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub operator_name: String,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub bus_type: String,
    pub price: Money,
    pub original_price: Money,
    pub date: NaiveDate,
    pub layout: LayoutSpec,
}

impl Route {
    /// Скидка относительно исходной цены, в процентах (для карточки рейса).
    pub fn discount_percent(&self) -> u32 {
        if self.original_price <= self.price || self.original_price.is_zero() {
            return 0;
        }
        let saved = (self.original_price - self.price).minor();
        let original = self.original_price.minor();
        ((saved * 100 + original / 2) / original) as u32
    }
}
