//! The `engine` module is the public face of the broadcast subsystem. The
//! rest of the backend only ever calls [`BroadcastEngine::publish`] after a
//! successful mutation, [`BroadcastEngine::accept`] from the connection
//! accept loop, and [`BroadcastEngine::shutdown`] at process exit.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{info, warn};
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::CloseFrame;
use tungstenite::protocol::frame::coding::CloseCode;

use crate::auth::{Authenticator, Identity};
use crate::codec;
use crate::dispatch::{Dispatcher, DomainEvent, WatchlistIndex};
use crate::registry::TopicRegistry;
use crate::session::Session;
use crate::transport::message::{AUTHENTICATE_TAG, AuthRequest};
use crate::utils::error::{AuthError, SessionError};

/// Engine façade: owns the registry, the dispatcher and the set of running
/// session tasks.
pub struct BroadcastEngine {
    registry: Arc<TopicRegistry>,
    dispatcher: Dispatcher,
    authenticator: Arc<dyn Authenticator>,
    queue_capacity: usize,
    sessions: Mutex<JoinSet<()>>,
}

impl BroadcastEngine {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        watchlists: Arc<dyn WatchlistIndex>,
        queue_capacity: usize,
    ) -> Self {
        let registry = Arc::new(TopicRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone(), watchlists);
        Self {
            registry,
            dispatcher,
            authenticator,
            queue_capacity,
            sessions: Mutex::new(JoinSet::new()),
        }
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Pushes a committed state change to every interested session.
    pub async fn publish(&self, event: DomainEvent) {
        self.dispatcher.publish(event).await;
    }

    /// Takes over a freshly accepted TCP connection and returns immediately;
    /// handshake, authentication and the session loops all run in their own
    /// task.
    pub async fn accept(self: Arc<Self>, stream: TcpStream) {
        let engine = self.clone();
        let mut sessions = self.sessions.lock().await;
        // Reap finished session tasks here, not just at shutdown, so the set
        // tracks live connections instead of every connection ever accepted.
        while sessions.try_join_next().is_some() {}
        sessions.spawn(async move { engine.run_connection(stream).await });
    }

    /// Session tasks still tracked, live or finished but not yet reaped.
    pub async fn task_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Transitions every live session to `Closing` and waits for all session
    /// tasks to finish. Used only at process shutdown.
    pub async fn shutdown(&self) {
        for handle in self.registry.live_sessions() {
            handle.begin_close();
        }
        let mut sessions = self.sessions.lock().await;
        while sessions.join_next().await.is_some() {}
        info!("broadcast engine stopped");
    }

    /// Connecting -> Authenticating -> Active, or an immediate close. A
    /// session only exists (and is only registered) once authentication has
    /// succeeded.
    async fn run_connection(&self, stream: TcpStream) {
        let mut ws_stream = match accept_async(stream).await {
            Ok(ws_stream) => ws_stream,
            Err(err) => {
                warn!(error = %err, "websocket handshake failed");
                return;
            }
        };

        let identity = match self.authenticate(&mut ws_stream).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "closing unauthenticated connection");
                let _ = ws_stream
                    .close(Some(CloseFrame {
                        code: CloseCode::Policy,
                        reason: "authentication failure".into(),
                    }))
                    .await;
                return;
            }
        };

        let (handle, session) =
            Session::admit(identity, self.registry.clone(), self.queue_capacity);
        info!(session = %handle.id, identity = identity.id, "session active");
        session.run(ws_stream).await;
    }

    /// The first frame after the handshake must be an `authenticate`
    /// envelope carrying a bearer token for the external validator.
    async fn authenticate(
        &self,
        ws_stream: &mut WebSocketStream<TcpStream>,
    ) -> Result<Identity, SessionError> {
        let frame = match ws_stream.next().await {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(_)) | None => return Err(AuthError::MissingCredential.into()),
            Some(Err(err)) => {
                warn!(error = %err, "transport failed during authentication");
                return Err(AuthError::MissingCredential.into());
            }
        };

        let envelope = codec::decode(frame.as_str())?;
        if envelope.tag != AUTHENTICATE_TAG {
            return Err(AuthError::MissingCredential.into());
        }
        let request: AuthRequest = envelope.payload()?;
        Ok(self.authenticator.authenticate(&request.token).await?)
    }
}
