//! # Pharmacast
//!
//! `pharmacast` is the real-time update broadcast engine of a pharmacy
//! locator backend. It pushes live state changes (pharmacy rating changes,
//! medicine stock changes, back-in-stock notifications) to many concurrently
//! connected clients over one bidirectional WebSocket per client, where each
//! client holds fine-grained, dynamically changing subscriptions.
//!
//! ## Core Modules
//!
//! - `codec`: the tagged `{type, data}` envelope carried in both directions.
//! - `registry`: thread-safe mapping from topic key to interested sessions,
//!   including the identity-scoped index.
//! - `session`: one live connection; bounded outbound queue plus the
//!   reader/writer loop pair.
//! - `dispatch`: classifies published events into topics and fans them out.
//! - `engine`: the façade the rest of the backend calls (`publish`,
//!   `accept`, `shutdown`).
//! - `auth`: the external authentication collaborator consumed at admission.
//! - `transport`: the WebSocket listener feeding the engine.
//! - `config` / `utils`: configuration loading, errors, logging.
//!
//! Events are fire-and-forget: there is no replay log and no delivery
//! guarantee across reconnects. A client that reconnects starts with empty
//! subscriptions and re-subscribes itself.

pub mod auth;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod registry;
pub mod session;
pub mod transport;
pub mod utils;
