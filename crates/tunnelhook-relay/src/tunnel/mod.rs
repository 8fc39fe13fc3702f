//! Tunnel discovery.
//!
//! The relay sits behind a NAT and a tunnel daemon whose public URL changes
//! whenever the daemon restarts, so the URL is looked up on every request:
//!
//! 1. find the default gateway from the host routing table,
//! 2. ask the tunnel daemon's management API on that host for the active
//!    public URL.

pub mod config;
pub mod error;
pub mod gateway;
pub mod resolver;

pub use config::{GatewaySource, ResolverConfig};
pub use error::ResolutionError;
pub use resolver::TunnelResolver;
