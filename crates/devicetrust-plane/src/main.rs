//! Device Trust Plane Server Binary
//!
//! Runs the HTTP server for device registration and intent proof checks.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use devicetrust_plane::{create_router, AppState, DeviceRegistrar, DeviceStore, MemoryStore, PlaneConfig};

#[tokio::main]
async fn main() {
    // Configuration
    let config = PlaneConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(2);
    });

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Initialize storage
    // TODO: add a persistent DeviceStore backend; records are lost on restart
    let store: Arc<dyn DeviceStore> = Arc::new(MemoryStore::new());
    let registrar = DeviceRegistrar::new(store);

    let addr = config.socket_addr();
    info!(
        addr = %addr,
        canonicalization = %config.canonicalization,
        duplicate_policy = %config.duplicate_policy,
        "Starting device trust plane"
    );

    // Create application state
    let state = Arc::new(AppState::new(registrar, &config));

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Device trust plane listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
