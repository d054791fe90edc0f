//! ==============================================================================
//! main.rs - weather station host entry point
//! ==============================================================================
//!
//! purpose:
//!     polls a weather sensor endpoint, keeps the latest reading plus a rolling
//!     history per metric, persists it across restarts and serves it to
//!     dashboards over a small read-only api.
//!
//! responsibilities:
//!     - load configuration (config.rs) and set up logging (logging.rs)
//!     - rehydrate the last saved state (persistence.rs)
//!     - own the history store and hand it to consumers (store.rs)
//!     - run the polling loop (poller.rs) against the endpoint or simulator (source.rs)
//!     - serve the dashboard api (server.rs)
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                     │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//!     │  │ poll loop   │  │ web server  │  │ persistence         │  │
//!     │  │ (10s cycle) │  │ (port 3000) │  │ (data/*.json)       │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//!     │         │ apply          │ snapshot           │ save/load   │
//!     │         └────────────────┼────────────────────┘             │
//!     │                    ┌─────┴─────┐                            │
//!     │                    │   store   │ <- store.rs                │
//!     │                    └───────────┘                            │
//!     └─────────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use weather_station::persistence::{FileStorage, MemoryStorage, StatePersistence, StateStorage};
use weather_station::poller::Poller;
use weather_station::source::{HttpSource, SimulatedSource};
use weather_station::store::HistoryStore;
use weather_station::{config, logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration and start logging
    let (config, origin) = config::StationConfig::load_or_default();
    logging::init(&config.logging)?;

    tracing::info!("===========================================================");
    tracing::info!("  Weather Station Host");
    tracing::info!("===========================================================");
    origin.log();
    config.print_summary();

    // step 2: rehydrate persisted state
    let storage: Arc<dyn StateStorage> = if config.storage.ephemeral {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(FileStorage::new(&config.storage.data_dir))
    };
    let persistence = StatePersistence::new(storage, config.storage.key.clone());
    let capacity = config.history.capacity;
    let saved = persistence.load(capacity);

    // step 3: the store owns the state from here on
    let store = HistoryStore::hydrate(saved, capacity, config.polling.ordering);

    // step 4: start the web server in background
    let shutdown = CancellationToken::new();
    let server_task = if config.server.enabled {
        let bind = config.server.bind.clone();
        let web_store = store.clone();
        let web_shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server::run_server(&bind, web_store, web_shutdown).await {
                tracing::error!("[SERVER] Web server error: {:#}", e);
            }
        }))
    } else {
        None
    };

    // step 5: polling loop
    let interval = config.polling.interval();
    let show_data = config.logging.show_sensor_data;
    let poller = if config.simulation.enabled {
        Poller::new(SimulatedSource::new(), store.clone(), persistence)
            .show_data(show_data)
            .spawn(interval)
    } else {
        Poller::new(HttpSource::new(config.polling.url.clone()), store.clone(), persistence)
            .show_data(show_data)
            .spawn(interval)
    };

    // step 6: run until ctrl-c, then tear down
    tokio::signal::ctrl_c().await?;
    tracing::info!("[SHUTDOWN] Stopping...");

    poller.shutdown().await;
    shutdown.cancel();
    if let Some(task) = server_task {
        task.await.ok();
    }

    let state = store.snapshot().await;
    tracing::info!(
        "[SHUTDOWN] ✓ Done ({} points of history kept)",
        state.temperature.len()
    );
    Ok(())
}
