//! tunnelhook relay server library.
//!
//! - mTLS listener that attaches the client certificate's principal to
//!   each request and consults an access policy
//! - Tunnel discovery (routing table gateway + tunnel daemon API)
//! - Webhook relay to the upstream provider with callback URL substitution
//! - Event ingest with canonical audit logging

pub mod auth;
pub mod config;
pub mod relay;
pub mod server;
pub mod tls;
pub mod tunnel;
