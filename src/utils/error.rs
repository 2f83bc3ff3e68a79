//! Error taxonomy for the broadcast engine.
//!
//! Failures local to one session (malformed input, write failure) are
//! contained within that session's lifecycle and never affect the topic
//! registry or other sessions. A saturated outbound queue is deliberately
//! absent here: dropping an update for one slow session is a counted,
//! non-fatal degrade, not an error.

use thiserror::Error;

/// Failure while encoding or decoding the wire envelope or an inner payload.
#[derive(Debug, Error)]
#[error("malformed envelope: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// Connection admission failures. The transport is closed immediately and the
/// session is never registered with the topic registry.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid credential")]
    InvalidCredential,
}

/// Failures local to one session's traffic.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("authentication failure: {0}")]
    AuthenticationFailure(#[from] AuthError),

    #[error(transparent)]
    MalformedEnvelope(#[from] CodecError),

    /// The envelope decoded fine but its tag is not one the reader loop
    /// understands. The offending message is logged and discarded; the
    /// session stays up.
    #[error("unknown topic tag `{0}`")]
    UnknownTopicTag(String),

    /// The writer loop failed to put a frame on the wire. The connection is
    /// presumed dead and the session is torn down.
    #[error("transport write failure: {0}")]
    TransportWriteFailure(#[from] tungstenite::Error),
}

/// Failure in the favorites/watch-list collaborator during publish-time
/// fan-out. The affected fan-out step is skipped with a logged warning;
/// nothing propagates to the publisher.
#[derive(Debug, Error)]
#[error("watch-list lookup failed: {0}")]
pub struct LookupError(pub String);
