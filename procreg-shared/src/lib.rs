//! Procreg shared - common types for the process registry and its tools
//!
//! This crate contains the error type and constants used by both the
//! library (procreg) and the operator CLI.

pub mod constants;
pub mod errors;

pub use errors::{ProcregError, ProcregResult};
