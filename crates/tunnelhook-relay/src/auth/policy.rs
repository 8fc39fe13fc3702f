//! Authentication and authorization hook.

use std::sync::Arc;

use rustls_pki_types::CertificateDer;
use tracing::{info, warn};
use tunnelhook_core::tracing_init::AUDIT_TARGET;

use super::principal::Principal;

/// Authentication/authorization errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid client certificate: {0}")]
    Certificate(String),

    #[error("Client certificate has no subject common name")]
    MissingCommonName,

    #[error("Policy evaluation failed: {0}")]
    Policy(String),
}

/// Identity attached to every request served on a connection.
///
/// `None` means the peer did not present a usable client certificate and the
/// request is anonymous.
#[derive(Debug, Clone, Default)]
pub struct PeerIdentity(pub Option<Arc<Principal>>);

impl PeerIdentity {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_deref()
    }
}

/// Policy hook consulted once per connection (`authenticate`) and once per
/// request (`authorize`).
pub trait AccessPolicy: Send + Sync {
    /// Derive the principal from the peer certificate chain.
    ///
    /// The first certificate is the peer's own. Chain validation already
    /// happened during the handshake.
    fn authenticate(&self, peer_certs: &[CertificateDer<'_>]) -> Option<Principal> {
        let cert = peer_certs.first()?;
        match Principal::from_certificate(cert) {
            Ok(principal) => {
                info!(
                    target: AUDIT_TARGET,
                    principal = %principal,
                    "Authenticated from TLS client cert"
                );
                Some(principal)
            }
            Err(e) => {
                warn!(
                    target: AUDIT_TARGET,
                    error = %e,
                    "Client certificate not usable as identity, treating peer as anonymous"
                );
                None
            }
        }
    }

    /// Decide whether `principal` may perform `action` on `resource`.
    fn authorize(
        &self,
        action: &str,
        resource: &str,
        principal: Option<&Principal>,
    ) -> Result<bool, AuthError>;
}

/// Permits everything and records what it would have decided on.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughPolicy;

impl AccessPolicy for PassThroughPolicy {
    fn authorize(
        &self,
        action: &str,
        resource: &str,
        principal: Option<&Principal>,
    ) -> Result<bool, AuthError> {
        let principal = principal.map_or("anonymous", Principal::yrn);
        info!(
            target: AUDIT_TARGET,
            principal,
            action,
            resource,
            allowed = true,
            "Authorize"
        );
        Ok(true)
    }
}
