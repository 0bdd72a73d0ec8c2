pub mod analytics;
pub mod bookings;
pub mod catalog;
pub mod payment;
pub mod sessions;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(catalog::routes())
        .merge(sessions::routes())
        .merge(payment::routes())
        .merge(bookings::routes())
        .merge(analytics::routes())
}
