use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod config;
mod error;
mod handlers;
mod models;
mod store;
mod validation;

use crate::config::{Config, StoreBackend};
use crate::store::{JsonFileStore, MemoryStore, Store};

/// Shared application state — cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Held across every read-modify-write so concurrent mutations don't
    /// overwrite each other.
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,inventory_service=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Inventory Service  — Rust + Axum    ║");
    info!("║  JSON file store · /api/inventory    ║");
    info!("╚══════════════════════════════════════╝");

    info!("Opening inventory store...");
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::File => {
            let store = JsonFileStore::new(&config.inventory_file);
            let items = store.read().await.len();
            info!(path = %store.path().display(), items, "Using JSON file store");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; inventory is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };
    info!("Inventory store ready.");

    let app = build_router(AppState::new(store));

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Inventory CRUD ──────────────────────────────────────────────────
        .route(
            "/api/inventory",
            get(handlers::inventory::list_inventory).post(handlers::inventory::create_item),
        )
        .route(
            "/api/inventory/:id",
            put(handlers::inventory::update_item).delete(handlers::inventory::delete_item),
        )

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
