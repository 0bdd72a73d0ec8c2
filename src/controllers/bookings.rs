use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings))
        .route("/bookings/{reference}", get(get_booking))
}

/* ---------- BOOKINGS ---------- */

// GET /api/bookings
async fn list_bookings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.bookings())
}

// GET /api/bookings/{reference}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.booking(reference.trim())?))
}
