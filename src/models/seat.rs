use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Канонический идентификатор места: ряд и позиция в ряду, оба с единицы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatId {
    pub row: u16,
    pub column: u16,
}

impl SeatId {
    pub const fn new(row: u16, column: u16) -> Self {
        Self { row, column }
    }
}

/// Схема отображения метки места.
///
/// `RowNumberLetter` печатает "1A" (номер ряда + буква позиции, автобусная схема),
/// `RowLetterNumber` печатает "A1" (буква ряда + номер позиции). Обе схемы
/// адресуют один и тот же `SeatId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatLabelScheme {
    #[default]
    RowNumberLetter,
    RowLetterNumber,
}

impl SeatLabelScheme {
    pub fn format(self, id: SeatId) -> String {
        match self {
            SeatLabelScheme::RowNumberLetter => format!("{}{}", id.row, index_to_letters(id.column)),
            SeatLabelScheme::RowLetterNumber => format!("{}{}", index_to_letters(id.row), id.column),
        }
    }

    /// Строгий разбор: только метки этой схемы.
    pub fn parse(self, label: &str) -> Option<SeatId> {
        let label = label.trim();
        match self {
            SeatLabelScheme::RowNumberLetter => {
                let (digits, letters) = split_prefix(label, |c| c.is_ascii_digit())?;
                let row = parse_number(digits)?;
                let column = letters_to_index(letters)?;
                Some(SeatId::new(row, column))
            }
            SeatLabelScheme::RowLetterNumber => {
                let (letters, digits) = split_prefix(label, |c| c.is_ascii_alphabetic())?;
                let row = letters_to_index(letters)?;
                let column = parse_number(digits)?;
                Some(SeatId::new(row, column))
            }
        }
    }

    /// Разбор с адаптером для старых меток: сначала своя схема, потом другая.
    pub fn parse_lenient(self, label: &str) -> Option<SeatId> {
        self.parse(label).or_else(|| self.other().parse(label))
    }

    pub fn other(self) -> SeatLabelScheme {
        match self {
            SeatLabelScheme::RowNumberLetter => SeatLabelScheme::RowLetterNumber,
            SeatLabelScheme::RowLetterNumber => SeatLabelScheme::RowNumberLetter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeatLabelScheme::RowNumberLetter => "row_number_letter",
            SeatLabelScheme::RowLetterNumber => "row_letter_number",
        }
    }
}

impl fmt::Display for SeatLabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatLabelScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "row_number_letter" | "number_letter" => Ok(SeatLabelScheme::RowNumberLetter),
            "row_letter_number" | "letter_number" => Ok(SeatLabelScheme::RowLetterNumber),
            other => Err(format!("unknown seat label scheme: {}", other)),
        }
    }
}

/// Место в схеме салона/трибуны. Статус брони неизменен в рамках сессии.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    pub id: SeatId,
    pub label: String,
    pub is_booked: bool,
}

/// Место для отрисовки: `is_selected` вычисляется по текущему выбору.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub label: String,
    pub row: u16,
    pub column: u16,
    pub is_booked: bool,
    pub is_selected: bool,
}

// 1 -> A, 26 -> Z, 27 -> AA (биективная 26-ричная запись)
pub fn index_to_letters(index: u16) -> String {
    let mut n = index as u32;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

pub fn letters_to_index(letters: &str) -> Option<u16> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n: u32 = 0;
    for c in letters.chars() {
        let v = (c.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        n = n.checked_mul(26)?.checked_add(v)?;
        if n > u16::MAX as u32 {
            return None;
        }
    }
    Some(n as u16)
}

fn parse_number(digits: &str) -> Option<u16> {
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

// Делит строку на непустой префикс из символов `pred` и непустой остаток другого класса.
fn split_prefix(label: &str, pred: impl Fn(char) -> bool) -> Option<(&str, &str)> {
    let split = label.find(|c: char| !pred(c))?;
    let (head, tail) = label.split_at(split);
    if head.is_empty() || tail.is_empty() || tail.chars().any(&pred) {
        return None;
    }
    Some((head, tail))
}
