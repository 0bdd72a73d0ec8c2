use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::services::session::{FlowKind, SessionStage};

/// Ошибки хранилища каталога (остатки, повторная фиксация).
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("route {0} not found")]
    UnknownRoute(String),
    #[error("ticket category {0} not found")]
    UnknownCategory(String),
    #[error("merchandise {0} not found")]
    UnknownMerchandise(String),
    #[error("seats already booked: {}", .0.join(", "))]
    SeatsTaken(Vec<String>),
    #[error("only {available} seats left, requested {requested}")]
    InsufficientSeats { available: u32, requested: u32 },
    #[error("only {available} items left in stock, requested {requested}")]
    OutOfStock { available: u32, requested: u32 },
    #[error("size {0} is not available")]
    UnknownSize(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("route {0} not found")]
    RouteNotFound(String),
    #[error("match {0} not found")]
    MatchNotFound(String),
    #[error("ticket category {0} not found")]
    CategoryNotFound(String),
    #[error("booking {0} not found")]
    BookingNotFound(String),
    #[error("operation requires a {0} session")]
    WrongFlow(FlowKind),
    #[error("please select at least one seat or ticket")]
    EmptySelection,
    #[error("please select a ticket category")]
    CategoryRequired,
    #[error("passenger details are required")]
    PassengerRequired,
    #[error("invalid input: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("session is {0} and cannot be changed")]
    SessionLocked(SessionStage),
    #[error("no payment in progress for this session")]
    PaymentNotFound,
    #[error("payment {0} does not belong to this session")]
    PaymentMismatch(Uuid),
    #[error("{0} is disabled")]
    FeatureDisabled(&'static str),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// 419 используется для конфликтов по остаткам, как и в остальном API
fn status_419() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::CONFLICT)
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_)
            | AppError::RouteNotFound(_)
            | AppError::MatchNotFound(_)
            | AppError::CategoryNotFound(_)
            | AppError::BookingNotFound(_)
            | AppError::PaymentNotFound => StatusCode::NOT_FOUND,
            AppError::WrongFlow(_)
            | AppError::EmptySelection
            | AppError::CategoryRequired
            | AppError::PassengerRequired
            | AppError::Validation(_)
            | AppError::PaymentMismatch(_) => StatusCode::BAD_REQUEST,
            AppError::SessionLocked(_) => StatusCode::CONFLICT,
            AppError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            AppError::Catalog(e) => match e {
                CatalogError::UnknownRoute(_)
                | CatalogError::UnknownCategory(_)
                | CatalogError::UnknownMerchandise(_) => StatusCode::NOT_FOUND,
                CatalogError::UnknownSize(_) => StatusCode::BAD_REQUEST,
                CatalogError::SeatsTaken(_)
                | CatalogError::InsufficientSeats { .. }
                | CatalogError::OutOfStock { .. } => status_419(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected ({}): {}", status, self);
        }
        (status, self.to_string()).into_response()
    }
}
