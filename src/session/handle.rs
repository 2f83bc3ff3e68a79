use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch};
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::auth::Identity;

pub type SessionId = Uuid;

/// Lifecycle of one connection.
///
/// `Connecting` and `Authenticating` cover admission, before the session is
/// registered anywhere. `Closing` is entered first-wins from either the
/// transport-error path or administrative shutdown; `Closed` only once both
/// loops have exited and the registry has been scrubbed. `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_advance_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Connecting, SessionState::Authenticating)
                | (SessionState::Authenticating, SessionState::Active)
                | (SessionState::Active, SessionState::Closing)
                | (SessionState::Closing, SessionState::Closed)
        )
    }
}

/// Shared handle to a live session.
///
/// The registry holds one per admitted session and the dispatcher enqueues
/// through it. The outbound queue is bounded: enqueueing never blocks, and a
/// full queue drops the update for this one session only, counted rather
/// than raised, since one stalled client must never hold up fan-out to the
/// rest.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: SessionId,
    pub identity: Identity,
    outbound: mpsc::Sender<WsMessage>,
    state: Mutex<SessionState>,
    close_tx: watch::Sender<bool>,
    dropped: AtomicU64,
    protocol_errors: AtomicU64,
}

impl SessionHandle {
    pub(crate) fn new(identity: Identity, outbound: mpsc::Sender<WsMessage>) -> Self {
        let (close_tx, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            identity,
            outbound,
            state: Mutex::new(SessionState::Authenticating),
            close_tx,
            dropped: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
        }
    }

    /// Non-blocking enqueue of one encoded envelope.
    ///
    /// Queue full drops the newest message and bumps the counter; a closed
    /// queue (session already tearing down) is a silent no-op.
    pub fn enqueue(&self, frame: WsMessage) {
        match self.outbound.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(session = %self.id, dropped = total, "outbound queue full, dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Updates on the floor so far, dropped to a saturated queue.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Counts a malformed/unknown inbound message. Input for future rate
    /// limiting; the session itself stays up.
    pub(crate) fn note_protocol_error(&self) -> u64 {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn protocol_error_count(&self) -> u64 {
        self.protocol_errors.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    pub(crate) fn advance(&self, next: SessionState) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.can_advance_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }

    /// Requests teardown. First caller wins and wakes both loops; later
    /// callers (the concurrent transport-error vs. shutdown race) are no-ops.
    pub fn begin_close(&self) -> bool {
        if self.advance(SessionState::Closing) {
            let _ = self.close_tx.send(true);
            true
        } else {
            false
        }
    }

    pub fn is_closing(&self) -> bool {
        self.state() >= SessionState::Closing
    }

    /// Resolves once teardown has been requested. Both loops select on this.
    pub(crate) async fn wait_close(&self) {
        let mut rx = self.close_tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
