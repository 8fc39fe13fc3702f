//! tunnelhook core library.
//!
//! Shared building blocks for the relay:
//! - Payload types for events, webhook requests and tunnel descriptors
//! - Deterministic event canonicalization for audit logging
//! - Tracing subscriber initialisation

pub mod canonical;
pub mod error;
pub mod tracing_init;
pub mod types;

pub use error::{Error, Result};
