//! The `codec` module implements the tagged envelope wire format shared by
//! every message in both directions: subscription requests coming in and
//! published events going out.

mod envelope;

pub use envelope::{Envelope, decode, encode};
