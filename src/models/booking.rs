use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::money::Money;
use crate::services::pricing::PricingResult;

/// Данные пассажира (шаг 2 автобусного сценария).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PassengerDetails {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "phone must be 7-20 characters"))]
    pub phone: String,
    #[validate(range(min = 1, max = 120, message = "age must be between 1 and 120"))]
    pub age: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Upi,
    Card,
    Netbanking,
    Wallet,
}

/// Что именно куплено.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookedItem {
    Bus {
        route_id: String,
        seats: Vec<String>,
    },
    Match {
        match_id: String,
        ticket_category_id: String,
        quantity: u32,
    },
}

impl BookedItem {
    pub fn units(&self) -> u32 {
        match self {
            BookedItem::Bus { seats, .. } => seats.len() as u32,
            BookedItem::Match { quantity, .. } => *quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Завершённое бронирование.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_reference: String,
    pub session_id: Uuid,
    pub payment_id: Uuid,
    pub payment_method: PaymentMethod,
    pub item: BookedItem,
    pub passenger: Option<PassengerDetails>,
    pub pricing: PricingResult,
    pub total_amount: Money,
    pub booking_status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Ссылка на бронь: "BG" + 8 цифр для автобуса, "IPL" + 13 цифр для матча.
    pub fn reference_for(item: &BookedItem, payment_id: Uuid) -> String {
        let n = payment_id.as_u128();
        match item {
            BookedItem::Bus { .. } => format!("BG{:08}", n % 100_000_000),
            BookedItem::Match { .. } => format!("IPL{:013}", n % 10_000_000_000_000),
        }
    }
}
