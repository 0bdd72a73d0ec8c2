use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::{MerchandiseOrderRequest, PromoRule, Route};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/routes", get(list_routes))
        .route("/routes/{id}", get(get_route))
        .route("/matches", get(list_matches))
        .route("/matches/{id}/categories", get(list_categories))
        .route("/merchandise", get(list_merchandise))
        .route("/merchandise/orders", post(order_merchandise))
        .route("/promos", get(list_promos))
}

/* ---------- ROUTES ---------- */

// GET /api/routes?from=&to=
#[derive(Debug, Deserialize)]
struct RoutesQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// Карточка рейса: сам рейс плюс процент скидки от исходной цены
#[derive(Debug, Serialize)]
struct RouteCard {
    #[serde(flatten)]
    pub route: Route,
    pub discount_percent: u32,
}

impl From<Route> for RouteCard {
    fn from(route: Route) -> Self {
        let discount_percent = route.discount_percent();
        Self { route, discount_percent }
    }
}

async fn list_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoutesQuery>,
) -> impl IntoResponse {
    let routes: Vec<RouteCard> = state
        .catalog
        .search_routes(params.from.as_deref(), params.to.as_deref())
        .into_iter()
        .map(RouteCard::from)
        .collect();
    Json(routes)
}

// GET /api/routes/{id}
async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let route = state.catalog.route(&id).ok_or(AppError::RouteNotFound(id))?;
    Ok(Json(RouteCard::from(route)))
}

/* ---------- MATCHES ---------- */

// GET /api/matches
async fn list_matches(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.fixtures())
}

// GET /api/matches/{id}/categories
async fn list_categories(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.catalog.fixture(&id).is_none() {
        return Err(AppError::MatchNotFound(id));
    }
    Ok(Json(state.catalog.ticket_categories(&id)))
}

/* ---------- MERCHANDISE ---------- */

fn ensure_merchandise(state: &AppState) -> Result<(), AppError> {
    if !state.config.features.enable_merchandise {
        return Err(AppError::FeatureDisabled("merchandise"));
    }
    Ok(())
}

// GET /api/merchandise
async fn list_merchandise(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    ensure_merchandise(&state)?;
    Ok(Json(state.catalog.merchandise()))
}

// POST /api/merchandise/orders
async fn order_merchandise(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MerchandiseOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_merchandise(&state)?;
    req.validate()?;
    let order = state.catalog.place_merchandise_order(&req)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/* ---------- PROMOS ---------- */

// GET /api/promos
async fn list_promos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rules: Vec<PromoRule> = if state.config.features.enable_promos {
        state.bookings.promos().rules().cloned().collect()
    } else {
        Vec::new()
    };
    Json(rules)
}
