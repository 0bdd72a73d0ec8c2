pub mod config;
pub mod models;
pub mod error;
pub mod catalog;
pub mod cache;
pub mod services;
pub mod controllers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::Catalog;
use crate::services::notify::Notifier;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub catalog: Arc<dyn Catalog>,
    pub sessions: cache::SessionCache,
    pub payments: services::PaymentService,
    pub bookings: services::BookingService,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        config: config::Config,
        catalog: Arc<dyn Catalog>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Arc<Self>> {
        let promos = Arc::new(config.load_promo_table()?);
        tracing::info!("Loaded {} promo rules", promos.len());

        let sessions = cache::SessionCache::new();
        let payments = services::PaymentService::from_config(&config.payment);
        let bookings = services::BookingService::new(
            catalog.clone(),
            sessions.clone(),
            payments.clone(),
            notifier.clone(),
            promos,
            services::BookingSettings::from_config(&config),
        );

        Ok(Arc::new(Self {
            config,
            catalog,
            sessions,
            payments,
            bookings,
            notifier,
        }))
    }

    pub fn cleanup(&self) -> services::cleanup::CleanupService {
        services::cleanup::CleanupService::new(self.sessions.clone(), self.payments.clone(), &self.config.booking)
    }
}

/// Главный роутер: служебные маршруты в корне, API под `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
