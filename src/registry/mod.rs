//! The `registry` module maintains the mapping from topic key to the set of
//! interested sessions, including the implicit identity-scoped index used for
//! back-in-stock notifications.
//!
//! All subscription state lives behind the [`TopicRegistry`] contract; neither
//! the dispatcher nor session code touches interest sets directly.

pub mod registry;
pub mod topic;

pub use registry::TopicRegistry;
pub use topic::{IdentityId, MedicineId, PharmacyId, Topic};
