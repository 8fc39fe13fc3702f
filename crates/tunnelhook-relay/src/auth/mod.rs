//! Client identity and access policy.
//!
//! - [`Principal`]: identity derived from a TLS client certificate
//! - [`AccessPolicy`]: the authenticate/authorize hook consulted per
//!   connection and per request, with [`PassThroughPolicy`] as the default

pub mod policy;
pub mod principal;

pub use policy::{AccessPolicy, AuthError, PassThroughPolicy, PeerIdentity};
pub use principal::Principal;
