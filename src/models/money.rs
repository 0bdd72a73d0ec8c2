use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Basis points per whole (100% = 10_000 bps).
pub const BPS_SCALE: i64 = 10_000;

/// Денежная сумма в минимальных единицах валюты (1/100 рупии).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Сумма в целых единицах валюты: `Money::from_major(450)` = 450.00.
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Доля суммы в базисных пунктах с округлением half-up до минимальной единицы.
    pub fn percent_of(self, bps: u32) -> Money {
        if self.0 <= 0 || bps == 0 {
            return Money::ZERO;
        }
        let scaled = self.0 as i128 * bps as i128;
        let half = (BPS_SCALE / 2) as i128;
        // вне диапазона i64 насыщаемся, как и остальная арифметика
        Money(i64::try_from((scaled + half) / BPS_SCALE as i128).unwrap_or(i64::MAX))
    }

    pub fn clamp_between(self, low: Money, high: Money) -> Money {
        if high < low {
            return low;
        }
        Money(self.0.clamp(low.0, high.0))
    }

    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money(self.0.saturating_mul(rhs as i64))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
