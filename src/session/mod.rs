//! The `session` module represents one live client connection: its identity,
//! its bounded outbound queue, and the reader/writer task pair that services
//! the transport for the session's lifetime.

mod handle;
mod session;

pub use handle::{SessionHandle, SessionId, SessionState};
pub use session::Session;
