//! The `transport` module owns the WebSocket listener: it accepts TCP
//! connections and hands each one to the engine for admission. Framing and
//! the handshake come from `tokio-tungstenite`; nothing here is redesigned.

pub mod message;
pub mod websocket;

pub use websocket::serve;
