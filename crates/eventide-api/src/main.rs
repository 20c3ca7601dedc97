//! Eventide API server entry point.

use std::sync::Arc;

use eventide_api::config::{AppConfig, LogFormat};
use eventide_api::error::AppError;
use eventide_api::state::AppState;
use eventide_core::bus::{EventBus, InProcessEventBus};
use eventide_core::clock::SystemClock;
use eventide_event_store::InMemoryEventStore;
use eventide_ordering::application::notifications::CustomerNotifier;
use eventide_ordering::wiring::{order_repository, subscribe_to_order_events};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting eventide API server");

    // Committed order events fan out to the customer notifier.
    let mut bus = InProcessEventBus::new();
    subscribe_to_order_events(&mut bus, Arc::new(CustomerNotifier::new()));
    let bus: Arc<dyn EventBus> = Arc::new(bus);

    let repository = order_repository(Arc::new(InMemoryEventStore::new()), Some(bus))?;
    let app_state = AppState::new(Arc::new(SystemClock), Arc::new(repository));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = eventide_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
