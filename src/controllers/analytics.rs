//! analytics.rs
//!
//! Аналитика продаж по маршруту.
//!
//! - Статистика по местам (всего, занято, свободно, продано через сервис).
//! - Общая выручка и количество подтверждённых бронирований.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::analytics::route_analytics;
use crate::AppState;

/// Определяет маршруты, связанные с аналитикой.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_route_analytics))
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    pub route_id: String,
}

/// GET /api/analytics?route_id=
async fn get_route_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.features.enable_analytics {
        return Err(AppError::FeatureDisabled("analytics"));
    }
    let stats = route_analytics(state.catalog.as_ref(), params.route_id.trim())?;
    Ok(Json(stats))
}
