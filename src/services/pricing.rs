//! pricing.rs
//!
//! Расчёт стоимости: подытог -> скидка по промокоду -> сервисный сбор -> итог.
//!
//! Промокоды описаны декларативной таблицей правил (`PromoTable`), а не
//! ветками кода. Неизвестный код просто даёт нулевую скидку.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Money, PromoRule};

/// Таблица промокодов. Поиск точный, с обрезкой пробелов по краям.
#[derive(Debug, Clone, Default)]
pub struct PromoTable {
    rules: BTreeMap<String, PromoRule>,
}

impl PromoTable {
    pub fn new(rules: impl IntoIterator<Item = PromoRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| (r.code.trim().to_string(), r))
            .collect();
        Self { rules }
    }

    /// Встроенные коды из витрины предложений.
    pub fn defaults() -> Self {
        Self::new(vec![
            PromoRule::fixed("SAVE50", Money::from_major(50), "₹50 off"),
            PromoRule::percentage("FIRSTRIDE", 2_000, "20% off first booking")
                .capped_at(Money::from_major(100)),
            PromoRule::percentage("STUDENT10", 1_000, "10% off"),
            PromoRule::fixed("FIRST20", Money::from_major(20), "Up to 20 off on your first booking"),
            PromoRule::percentage("WEEKEND15", 1_500, "15% off on weekend bookings"),
        ])
    }

    pub fn lookup(&self, code: &str) -> Option<&PromoRule> {
        self.rules.get(code.trim())
    }

    pub fn rules(&self) -> impl Iterator<Item = &PromoRule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Скидка, ограниченная диапазоном [0, subtotal].
    pub fn discount_for(&self, code: Option<&str>, subtotal: Money) -> Money {
        code.and_then(|c| self.lookup(c))
            .map(|rule| rule.raw_discount(subtotal))
            .unwrap_or(Money::ZERO)
            .clamp_between(Money::ZERO, subtotal.max(Money::ZERO))
    }
}

/// Правила расчёта для конкретного сценария покупки.
#[derive(Debug, Clone)]
pub struct PricingRules {
    pub promos: Arc<PromoTable>,
    /// Сервисный сбор в базисных пунктах; `None` если сценарий без сбора.
    pub convenience_fee_bps: Option<u32>,
}

impl PricingRules {
    pub fn new(promos: Arc<PromoTable>, convenience_fee_bps: Option<u32>) -> Self {
        Self {
            promos,
            convenience_fee_bps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingResult {
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
    pub discount: Money,
    pub convenience_fee: Money,
    pub total: Money,
}

pub fn compute(
    unit_price: Money,
    selected_count: u32,
    promo_code: Option<&str>,
    rules: &PricingRules,
) -> PricingResult {
    let subtotal = if selected_count == 0 {
        Money::ZERO
    } else {
        (unit_price * selected_count).max(Money::ZERO)
    };

    let discount = rules.promos.discount_for(promo_code, subtotal);

    // сбор считается от подытога, до скидки
    let convenience_fee = rules
        .convenience_fee_bps
        .map(|bps| subtotal.percent_of(bps))
        .unwrap_or(Money::ZERO);

    let total = subtotal.saturating_sub(discount).max(Money::ZERO) + convenience_fee;

    PricingResult {
        unit_price,
        quantity: selected_count,
        subtotal,
        discount,
        convenience_fee,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_rules() -> PricingRules {
        PricingRules::new(Arc::new(PromoTable::defaults()), Some(500))
    }

    fn match_rules() -> PricingRules {
        PricingRules::new(Arc::new(PromoTable::defaults()), None)
    }

    #[test]
    fn bus_total_with_save50() {
        let r = compute(Money::from_major(450), 2, Some("SAVE50"), &bus_rules());
        assert_eq!(r.subtotal, Money::from_major(900));
        assert_eq!(r.discount, Money::from_major(50));
        assert_eq!(r.convenience_fee, Money::from_major(45));
        assert_eq!(r.total, Money::from_major(895));
    }

    #[test]
    fn firstride_is_twenty_percent_capped_at_hundred() {
        let rules = match_rules();
        assert_eq!(
            compute(Money::from_major(100), 1, Some("FIRSTRIDE"), &rules).discount,
            Money::from_major(20)
        );
        assert_eq!(
            compute(Money::from_major(1_000), 1, Some("FIRSTRIDE"), &rules).discount,
            Money::from_major(100)
        );
    }

    #[test]
    fn unknown_code_gives_no_discount() {
        let r = compute(Money::from_major(75), 2, Some("NOPE"), &bus_rules());
        assert_eq!(r.discount, Money::ZERO);
        assert_eq!(r.total, Money::from_major(150) + Money::from_major(150).percent_of(500));
    }

    #[test]
    fn codes_are_case_sensitive_but_trimmed() {
        let table = PromoTable::defaults();
        assert!(table.lookup("  SAVE50 ").is_some());
        assert!(table.lookup("save50").is_none());
    }

    #[test]
    fn fixed_discount_never_exceeds_subtotal() {
        let r = compute(Money::from_major(30), 1, Some("SAVE50"), &match_rules());
        assert_eq!(r.discount, Money::from_major(30));
        assert_eq!(r.total, Money::ZERO);
    }

    #[test]
    fn empty_selection_costs_nothing() {
        let r = compute(Money::from_major(450), 0, Some("SAVE50"), &bus_rules());
        assert_eq!(r, PricingResult { unit_price: Money::from_major(450), ..Default::default() });
    }

    #[test]
    fn match_flow_has_no_fee() {
        let r = compute(Money::from_major(2_500), 3, None, &match_rules());
        assert_eq!(r.convenience_fee, Money::ZERO);
        assert_eq!(r.total, Money::from_major(7_500));
    }
}
