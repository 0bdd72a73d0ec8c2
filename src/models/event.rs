use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::money::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub short_name: String,
    pub city: String,
    pub primary_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
    Cancelled,
}

/// Матч (fixture) с командами и стадионом.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub team1: Team,
    pub team2: Team,
    pub venue: Venue,
    pub match_type: String,
    pub match_date: DateTime<Utc>,
    pub base_price: Money,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    General,
    Premium,
    Vip,
    Hospitality,
}

/// Категория билетов на матч.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: String,
    pub match_id: String,
    pub category_name: String,
    pub section_name: Option<String>,
    pub ticket_type: TicketType,
    pub price: Money,
    pub total_seats: u32,
    pub available_seats: u32,
}
