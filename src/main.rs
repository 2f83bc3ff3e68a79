use std::sync::Arc;

use tracing::{error, info};

use pharmacast::auth::TokenAuthenticator;
use pharmacast::config::load_config;
use pharmacast::dispatch::InMemoryWatchlistIndex;
use pharmacast::engine::BroadcastEngine;
use pharmacast::{transport, utils};

#[tokio::main]
async fn main() {
    let settings = load_config().expect("Failed to load configuration");
    utils::logging::init(&settings.engine.log_level);

    // Real deployments wire the backend's token validator and the
    // favorites/watch-list index here.
    let authenticator = Arc::new(TokenAuthenticator::new());
    let watchlists = Arc::new(InMemoryWatchlistIndex::new());
    let engine = Arc::new(BroadcastEngine::new(
        authenticator,
        watchlists,
        settings.engine.outbound_queue_capacity,
    ));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tokio::select! {
        result = transport::serve(&addr, engine.clone()) => {
            if let Err(err) = result {
                error!(error = %err, "listener failed");
            }
        }
        _ = tokio::signal::ctrl_c() => info!("shutdown requested"),
    }

    engine.shutdown().await;
}
