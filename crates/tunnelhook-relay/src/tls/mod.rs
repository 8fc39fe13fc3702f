//! TLS configuration and certificate generation for the relay server.

pub mod certs;
pub mod config;

pub use certs::{CertBundle, CertError, generate_dev_bundle};
pub use config::{TlsConfigError, TlsMode, build_server_config, restricted_provider};

/// Install ring as the process-wide rustls provider for outbound clients
/// (reqwest is built with `rustls-no-provider`). The `Err` case just means a
/// provider was already installed.
pub fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
