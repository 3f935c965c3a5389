//! HTTP server for the timesheet tracker.
//!
//! Usage: `timesheet-server [CONFIG_PATH]` (defaults to `config/tracker.yaml`).

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use timesheet_tracker::api::{AppState, create_router};
use timesheet_tracker::clock::SystemClock;
use timesheet_tracker::config::ConfigLoader;
use timesheet_tracker::report::SummaryView;
use timesheet_tracker::store::{EmployeeStore, refresh_on_change};

const DEFAULT_CONFIG_PATH: &str = "config/tracker.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let loader = ConfigLoader::load(&config_path)?;
    info!(path = %config_path, "Configuration loaded");

    let storage = loader.open_storage()?;
    let config = loader.into_config();
    let store = Arc::new(EmployeeStore::open(
        storage,
        Arc::new(SystemClock),
        config.store_options(),
    ));

    // Traces the totals after every change for the life of the process.
    let summary_store = store.clone();
    let events = store.subscribe();
    tokio::spawn(async move {
        let mut view = SummaryView::new(&summary_store);
        refresh_on_change(&summary_store, events, &mut view).await;
    });

    let bind_address = config.server.bind_address.clone();
    let router = create_router(AppState::new(store, config));

    let listener = TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Timesheet server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    Ok(())
}
