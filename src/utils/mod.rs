//! The `utils` module provides shared definitions used across the
//! `pharmacast` application: the error taxonomy and logging setup.

pub mod error;
pub mod logging;
