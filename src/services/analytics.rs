//! analytics.rs
//!
//! Статистика продаж по маршруту: места (всего, занято, свободно), выручка и
//! число подтверждённых бронирований. Считается по каталогу на лету.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::models::{BookedItem, BookingStatus, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteAnalytics {
    pub route_id: String,
    pub total_seats: usize,
    pub booked_seats: usize,
    pub free_seats: usize,
    /// Места, проданные через сервис (без заранее занятых)
    pub sold_seats: usize,
    pub total_revenue: Money,
    pub bookings_count: usize,
}

pub fn route_analytics(catalog: &dyn Catalog, route_id: &str) -> Result<RouteAnalytics, AppError> {
    let route = catalog
        .route(route_id)
        .ok_or_else(|| AppError::RouteNotFound(route_id.to_string()))?;

    let layout = &route.layout;
    let total_seats = layout.capacity();
    // занятые метки вне схемы не считаем
    let booked_seats = catalog
        .booked_seats(route_id)
        .into_iter()
        .filter(|id| id.row >= 1 && id.row <= layout.rows && id.column >= 1 && id.column <= layout.seats_per_row)
        .count();

    let mut sold_seats = 0;
    let mut total_revenue = Money::ZERO;
    let mut bookings_count = 0;
    for record in catalog.bookings() {
        if record.booking_status != BookingStatus::Confirmed {
            continue;
        }
        if let BookedItem::Bus { route_id: id, .. } = &record.item {
            if id == route_id {
                sold_seats += record.item.units() as usize;
                total_revenue = total_revenue + record.total_amount;
                bookings_count += 1;
            }
        }
    }

    Ok(RouteAnalytics {
        route_id: route.id,
        total_seats,
        booked_seats,
        free_seats: total_seats.saturating_sub(booked_seats),
        sold_seats,
        total_revenue,
        bookings_count,
    })
}
