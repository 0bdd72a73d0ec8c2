use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::AppError, models::PaymentMethod, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/sessions/{id}/payment",
        post(initiate_payment).get(get_payment_status).delete(cancel_payment),
    )
}

// --- Request/Response структуры ---
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    #[serde(default)]
    pub method: PaymentMethod,
}

#[derive(Serialize)]
pub struct CancelPaymentResponse {
    success: bool,
    message: String,
}

// --- HTTP Handlers ---

/// POST /api/sessions/{id}/payment
///
/// Запускает имитацию оплаты. Сессия блокируется до завершения или отмены.
pub async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.bookings.start_payment(id, req.method).await?;
    tracing::info!("💳 Payment {} initiated for session {} ({})", payment.payment_id, id, payment.amount);
    Ok((StatusCode::ACCEPTED, Json(payment)))
}

/// GET /api/sessions/{id}/payment
pub async fn get_payment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.payment_status(id).await?))
}

/// DELETE /api/sessions/{id}/payment
pub async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let success = state.bookings.cancel_payment(id).await?;
    let message = if success {
        "Платёж отменён".to_string()
    } else {
        "Платёж уже завершён".to_string()
    };
    let status = if success { StatusCode::OK } else { StatusCode::CONFLICT };
    Ok((status, Json(CancelPaymentResponse { success, message })))
}
