use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::auth::Identity;
use crate::codec;
use crate::registry::TopicRegistry;
use crate::session::handle::{SessionHandle, SessionState};
use crate::transport::message::{SUBSCRIBE_TAG, TopicDescriptor, UNSUBSCRIBE_TAG};
use crate::utils::error::SessionError;

/// A decoded client->server request. Anything else on the wire is a protocol
/// error handled without tearing the session down.
#[derive(Debug)]
enum InboundRequest {
    Subscribe(Vec<TopicDescriptor>),
    Unsubscribe(Vec<TopicDescriptor>),
}

/// One admitted connection, driving its reader and writer loops until the
/// transport closes or teardown is requested.
pub struct Session {
    handle: Arc<SessionHandle>,
    registry: Arc<TopicRegistry>,
    outbound_rx: mpsc::Receiver<WsMessage>,
}

impl Session {
    /// Creates the session for an authenticated connection and registers it
    /// with the topic registry. The returned handle is what the dispatcher
    /// and shutdown path see; the `Session` itself is consumed by [`run`].
    ///
    /// [`run`]: Session::run
    pub(crate) fn admit(
        identity: Identity,
        registry: Arc<TopicRegistry>,
        queue_capacity: usize,
    ) -> (Arc<SessionHandle>, Session) {
        let (outbound_tx, outbound_rx) = mpsc::channel(queue_capacity);
        let handle = Arc::new(SessionHandle::new(identity, outbound_tx));
        registry.add_session(handle.clone());
        handle.advance(SessionState::Active);
        let session = Session {
            handle: handle.clone(),
            registry,
            outbound_rx,
        };
        (handle, session)
    }

    /// Runs both loops to completion, then releases every resource the
    /// session holds: registry entries, the queue, and the transport.
    pub async fn run(self, ws_stream: WebSocketStream<TcpStream>) {
        let Session {
            handle,
            registry,
            outbound_rx,
        } = self;

        let (ws_sender, ws_receiver) = ws_stream.split();
        let writer = tokio::spawn(write_loop(handle.clone(), outbound_rx, ws_sender));
        read_loop(handle.clone(), registry.clone(), ws_receiver).await;

        handle.begin_close();
        let _ = writer.await;

        registry.remove_session(&handle.id);
        handle.advance(SessionState::Closed);
        info!(session = %handle.id, identity = handle.identity.id, "session closed");
    }

    fn apply(handle: &SessionHandle, registry: &TopicRegistry, request: InboundRequest) {
        match request {
            InboundRequest::Subscribe(descriptors) => {
                for descriptor in descriptors {
                    let topic = descriptor.into_topic();
                    registry.subscribe(topic, handle.id);
                    debug!(session = %handle.id, ?topic, "subscribed");
                }
            }
            InboundRequest::Unsubscribe(descriptors) => {
                for descriptor in descriptors {
                    let topic = descriptor.into_topic();
                    registry.unsubscribe(&topic, &handle.id);
                    debug!(session = %handle.id, ?topic, "unsubscribed");
                }
            }
        }
    }
}

/// Blocks on the transport, decoding inbound envelopes and applying
/// subscription changes. A malformed or unknown message is counted and
/// skipped; only transport-level failure or a close frame ends the loop.
async fn read_loop(
    handle: Arc<SessionHandle>,
    registry: Arc<TopicRegistry>,
    mut ws_receiver: SplitStream<WebSocketStream<TcpStream>>,
) {
    loop {
        tokio::select! {
            () = handle.wait_close() => break,
            frame = ws_receiver.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    match parse_inbound(text.as_str()) {
                        Ok(request) => Session::apply(&handle, &registry, request),
                        Err(err) => {
                            let count = handle.note_protocol_error();
                            warn!(session = %handle.id, error = %err, count, "dropping inbound message");
                        }
                    }
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    handle.begin_close();
                    break;
                }
                // Pings/pongs are answered by the transport library; binary
                // frames have no meaning in this protocol.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(session = %handle.id, error = %err, "transport read failed");
                    handle.begin_close();
                    break;
                }
            },
        }
    }
}

/// Drains the outbound queue onto the wire in enqueue order. Per-session
/// delivery is FIFO; a write failure means the connection is dead and tears
/// the session down.
async fn write_loop(
    handle: Arc<SessionHandle>,
    mut outbound_rx: mpsc::Receiver<WsMessage>,
    mut ws_sender: SplitSink<WebSocketStream<TcpStream>, WsMessage>,
) {
    loop {
        tokio::select! {
            () = handle.wait_close() => break,
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = ws_sender.send(frame).await {
                        let err = SessionError::TransportWriteFailure(err);
                        warn!(session = %handle.id, error = %err, "tearing session down");
                        handle.begin_close();
                        break;
                    }
                }
                None => break,
            },
        }
    }
    // Best-effort close frame; the peer may already be gone.
    let _ = ws_sender.close().await;
}

fn parse_inbound(raw: &str) -> Result<InboundRequest, SessionError> {
    let envelope = codec::decode(raw)?;
    match envelope.tag.as_str() {
        SUBSCRIBE_TAG => Ok(InboundRequest::Subscribe(envelope.payload()?)),
        UNSUBSCRIBE_TAG => Ok(InboundRequest::Unsubscribe(envelope.payload()?)),
        other => Err(SessionError::UnknownTopicTag(other.to_string())),
    }
}
