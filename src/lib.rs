pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod store;
pub mod services;
pub mod controllers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::StorageBackend;
use services::{BookingLedger, SeatInventory, VenueRegistry};
use store::{MemoryStore, PgStore, Store};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub venues: VenueRegistry,
    pub seats: SeatInventory,
    pub bookings: BookingLedger,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn Store> = match config.app.storage {
            StorageBackend::Postgres => {
                let db = database::Database::new(&config.database).await?;
                info!("Database connected");
                db.run_migrations().await?;
                Arc::new(PgStore::new(db.pool))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(config, store))
    }

    // Все три компонента работают поверх одного хранилища
    pub fn with_store(config: config::Config, store: Arc<dyn Store>) -> Arc<Self> {
        Arc::new(Self {
            config,
            venues: VenueRegistry::new(store.clone()),
            seats: SeatInventory::new(store.clone()),
            bookings: BookingLedger::new(store),
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Seat Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
