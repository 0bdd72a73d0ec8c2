use serde::{Deserialize, Serialize};

use super::money::Money;

/// Вид скидки промокода.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    /// Фиксированная сумма.
    Fixed(Money),
    /// Доля подытога в базисных пунктах (2000 = 20%).
    Percentage(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRule {
    pub code: String,
    pub discount: Discount,
    /// Верхняя граница скидки, если задана.
    #[serde(default)]
    pub cap: Option<Money>,
    #[serde(default)]
    pub description: String,
}

impl PromoRule {
    pub fn fixed(code: &str, amount: Money, description: &str) -> Self {
        Self {
            code: code.to_string(),
            discount: Discount::Fixed(amount),
            cap: None,
            description: description.to_string(),
        }
    }

    pub fn percentage(code: &str, bps: u32, description: &str) -> Self {
        Self {
            code: code.to_string(),
            discount: Discount::Percentage(bps),
            cap: None,
            description: description.to_string(),
        }
    }

    pub fn capped_at(mut self, cap: Money) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Скидка по правилу до ограничения подытогом.
    pub fn raw_discount(&self, subtotal: Money) -> Money {
        let amount = match self.discount {
            Discount::Fixed(amount) => amount,
            Discount::Percentage(bps) => subtotal.percent_of(bps),
        };
        match self.cap {
            Some(cap) if amount > cap => cap,
            _ => amount,
        }
    }
}
