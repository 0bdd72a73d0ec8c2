//! sessions.rs
//!
//! HTTP-обёртка над сессиями бронирования.
//!
//! - Старт автобусной или матчевой сессии.
//! - Выбор мест, категории и количества, промокод, данные пассажира.
//! - Сброс сценария ("начать заново").
//!
//! Каждый ответ содержит актуальное представление сессии с расчётом цены.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PassengerDetails;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/bus", post(start_bus_session))
        .route("/sessions/match", post(start_match_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/seats/toggle", patch(toggle_seat))
        .route("/sessions/{id}/category", patch(select_category))
        .route("/sessions/{id}/quantity", patch(set_quantity))
        .route("/sessions/{id}/promo", patch(apply_promo))
        .route("/sessions/{id}/passenger", put(set_passenger))
        .route("/sessions/{id}/reset", post(reset_session))
}

/* ---------- старт ---------- */

// POST /api/sessions/bus
#[derive(Debug, Deserialize)]
struct StartBusRequest {
    pub route_id: String,
}

async fn start_bus_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartBusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.bookings.start_bus(req.route_id.trim()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

// POST /api/sessions/match
#[derive(Debug, Deserialize)]
struct StartMatchRequest {
    pub match_id: String,
}

async fn start_match_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartMatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.bookings.start_match(req.match_id.trim()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/sessions/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.view(id).await?))
}

/* ---------- выбор ---------- */

// PATCH /api/sessions/{id}/seats/toggle
#[derive(Debug, Deserialize)]
struct ToggleSeatRequest {
    pub seat: String,
}

async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleSeatRequest>,
) -> Result<impl IntoResponse, AppError> {
    // отказ (место занято, лимит) - это не ошибка запроса, а исход в ответе
    Ok(Json(state.bookings.toggle_seat(id, &req.seat).await?))
}

// PATCH /api/sessions/{id}/category
#[derive(Debug, Deserialize)]
struct CategoryRequest {
    pub category_id: String,
}

async fn select_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.select_category(id, req.category_id.trim()).await?))
}

// PATCH /api/sessions/{id}/quantity
#[derive(Debug, Deserialize)]
struct QuantityRequest {
    pub quantity: u32,
}

async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<QuantityRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.set_quantity(id, req.quantity).await?))
}

// PATCH /api/sessions/{id}/promo
#[derive(Debug, Deserialize)]
struct PromoRequest {
    #[serde(default)]
    pub code: String,
}

async fn apply_promo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PromoRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.apply_promo(id, &req.code).await?))
}

// PUT /api/sessions/{id}/passenger
async fn set_passenger(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(details): Json<PassengerDetails>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.set_passenger(id, details).await?))
}

// POST /api/sessions/{id}/reset
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.reset(id).await?))
}
