use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booking_system::{
    app,
    catalog::InMemoryCatalog,
    config::Config,
    services::LogNotifier,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    if config.app.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting Booking API ({})", config.app.environment);

    // Каталог с демонстрационными данными
    let catalog = Arc::new(InMemoryCatalog::seeded());
    let app_state = AppState::new(config.clone(), catalog, Arc::new(LogNotifier))?;

    // --- Start background tasks ---

    // Очистка брошенных сессий и старых платежей
    let cleanup = app_state.cleanup();
    task::spawn(cleanup.run_forever());

    // --- Start the web server ---

    let app = app(app_state);

    let ip = config
        .app
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid HOST {}", config.app.host))?;
    let addr = SocketAddr::from((ip, config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
