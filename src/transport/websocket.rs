use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::engine::BroadcastEngine;

/// Binds `addr` and feeds every accepted connection to the engine. Admission
/// (handshake, authentication, loop startup) happens inside `accept`, so a
/// slow or hostile peer never stalls the listener.
pub async fn serve(addr: &str, engine: Arc<BroadcastEngine>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on ws://{addr}");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "incoming connection");
                engine.clone().accept(stream).await;
            }
            Err(err) => warn!(error = %err, "failed to accept connection"),
        }
    }
}
