use serde::{Deserialize, Serialize};

use super::seat::SeatLabelScheme;

/// Схема салона: ряды × места в ряду.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub rows: u16,
    pub seats_per_row: u16,
    #[serde(default)]
    pub scheme: SeatLabelScheme,
    /// Номера мест, после которых идёт проход (только для отрисовки).
    #[serde(default)]
    pub aisles_after: Vec<u16>,
}

impl LayoutSpec {
    pub fn new(rows: u16, seats_per_row: u16) -> Self {
        Self {
            rows,
            seats_per_row,
            scheme: SeatLabelScheme::default(),
            aisles_after: Vec::new(),
        }
    }

    /// Стандартный автобус: 10 рядов по 10 мест, раскладка 2-4-4.
    pub fn standard_bus() -> Self {
        Self::new(10, 10).with_aisles(vec![2, 6])
    }

    pub fn with_scheme(mut self, scheme: SeatLabelScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_aisles(mut self, aisles_after: Vec<u16>) -> Self {
        self.aisles_after = aisles_after;
        self
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.seats_per_row as usize
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.seats_per_row == 0
    }
}
