//! TLS configuration for the relay server.
//!
//! The server config is built once at startup and shared by reference with
//! the listener. It requests client certificates but accepts connections
//! without one, pins TLS 1.2 as the floor, disables session resumption and
//! restricts the cipher suites to the AES-GCM allow-list.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::server::{NoServerSessionStorage, WebPkiClientVerifier};
use rustls::{CipherSuite, RootCertStore, ServerConfig};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tracing::{debug, info};

use super::certs::{CertError, generate_dev_bundle, write_dev_certs};

/// Cipher suites the relay negotiates. The TLS 1.2 entries are the ECDHE
/// AES-GCM suites with RSA or ECDSA authentication.
pub const ALLOWED_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS13_AES_128_GCM_SHA256,
    CipherSuite::TLS13_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
];

/// TLS configuration for the relay server.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// No TLS (plaintext). Every request is anonymous. Development only.
    Disabled,
    /// Auto-generated CA, server and client certificates for development.
    DevSelfSigned {
        /// Directory to store generated certs.
        cert_dir: PathBuf,
    },
    /// User-provided certificate files.
    Custom {
        /// CA bundle (PEM) that client certificates are verified against.
        ca_cert_path: PathBuf,
        /// Separate client CA bundle; falls back to `ca_cert_path`.
        client_ca_path: Option<PathBuf>,
        /// Server certificate chain (PEM).
        cert_path: PathBuf,
        /// Server private key (PEM).
        key_path: PathBuf,
    },
}

impl TlsMode {
    /// Build the rustls server configuration for this mode.
    ///
    /// Returns `None` if TLS is disabled.
    pub fn to_server_config(&self) -> Result<Option<Arc<ServerConfig>>, TlsConfigError> {
        match self {
            Self::Disabled => Ok(None),
            Self::DevSelfSigned { cert_dir } => {
                info!("Generating dev TLS certificates");
                let bundle = generate_dev_bundle(&["localhost", "127.0.0.1"])?;
                write_dev_certs(cert_dir, &bundle)?;

                let certs = parse_certs(bundle.server_cert_pem.as_bytes(), "dev server cert")?;
                let key = parse_private_key(bundle.server_key_pem.as_bytes(), "dev server key")?;
                let roots = parse_certs(bundle.ca_cert_pem.as_bytes(), "dev CA")?;

                let config = build_server_config(certs, key, &roots)?;
                info!(cert_dir = %cert_dir.display(), "Dev TLS enabled");
                Ok(Some(config))
            }
            Self::Custom {
                ca_cert_path,
                client_ca_path,
                cert_path,
                key_path,
            } => {
                // The CA bundle must load even when a separate client CA is given.
                let ca = load_certs(ca_cert_path)?;
                let roots = match client_ca_path {
                    Some(path) => load_certs(path)?,
                    None => ca,
                };
                let certs = load_certs(cert_path)?;
                let key = load_private_key(key_path)?;

                let config = build_server_config(certs, key, &roots)?;
                info!(
                    ca = %ca_cert_path.display(),
                    cert = %cert_path.display(),
                    key = %key_path.display(),
                    "Custom TLS enabled"
                );
                Ok(Some(config))
            }
        }
    }
}

/// The ring provider limited to [`ALLOWED_CIPHER_SUITES`].
pub fn restricted_provider() -> CryptoProvider {
    let mut provider = rustls::crypto::ring::default_provider();
    provider
        .cipher_suites
        .retain(|suite| ALLOWED_CIPHER_SUITES.contains(&suite.suite()));
    provider
}

/// Assemble the server config: optional client auth against `client_roots`,
/// TLS 1.2+, no resumption.
pub fn build_server_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    client_roots: &[CertificateDer<'static>],
) -> Result<Arc<ServerConfig>, TlsConfigError> {
    let provider = Arc::new(restricted_provider());

    let mut roots = RootCertStore::empty();
    for cert in client_roots {
        roots
            .add(cert.clone())
            .map_err(|e| TlsConfigError::Build(format!("failed to add CA cert: {e}")))?;
    }

    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
        .allow_unauthenticated()
        .build()
        .map_err(|e| TlsConfigError::Build(format!("failed to build client verifier: {e}")))?;

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|e| TlsConfigError::Build(format!("protocol versions: {e}")))?
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .map_err(|e| TlsConfigError::Build(format!("server config: {e}")))?;

    config.session_storage = Arc::new(NoServerSessionStorage {});
    config.send_tls13_tickets = 0;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Load certificates from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsConfigError> {
    let pem = std::fs::read(path).map_err(|e| {
        TlsConfigError::FileRead(format!("Failed to read cert {}: {e}", path.display()))
    })?;
    let certs = parse_certs(&pem, &path.display().to_string())?;
    debug!(count = certs.len(), path = %path.display(), "Loaded certificates");
    Ok(certs)
}

/// Load a private key (PKCS#8, PKCS#1 or SEC1) from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsConfigError> {
    let pem = std::fs::read(path).map_err(|e| {
        TlsConfigError::FileRead(format!("Failed to read key {}: {e}", path.display()))
    })?;
    parse_private_key(&pem, &path.display().to_string())
}

fn parse_certs(pem: &[u8], source: &str) -> Result<Vec<CertificateDer<'static>>, TlsConfigError> {
    let certs = CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsConfigError::FileRead(format!("Invalid PEM in {source}: {e}")))?;
    if certs.is_empty() {
        return Err(TlsConfigError::NoCertificates(source.to_string()));
    }
    Ok(certs)
}

fn parse_private_key(pem: &[u8], source: &str) -> Result<PrivateKeyDer<'static>, TlsConfigError> {
    match PrivateKeyDer::from_pem_slice(pem) {
        Ok(key) => Ok(key),
        Err(rustls_pki_types::pem::Error::NoItemsFound) => {
            Err(TlsConfigError::NoPrivateKey(source.to_string()))
        }
        Err(e) => Err(TlsConfigError::FileRead(format!(
            "Invalid key PEM in {source}: {e}"
        ))),
    }
}

/// TLS configuration errors. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    #[error("Certificate generation error: {0}")]
    CertGeneration(String),

    #[error("File read error: {0}")]
    FileRead(String),

    #[error("No certificates found in {0}")]
    NoCertificates(String),

    #[error("No private key found in {0}")]
    NoPrivateKey(String),

    #[error("Failed to build TLS config: {0}")]
    Build(String),
}

impl From<CertError> for TlsConfigError {
    fn from(e: CertError) -> Self {
        Self::CertGeneration(e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tls::certs::{generate_dev_bundle, write_dev_certs};

    #[test]
    fn disabled_returns_none() {
        assert!(TlsMode::Disabled.to_server_config().unwrap().is_none());
    }

    #[test]
    fn dev_self_signed_returns_config() {
        let dir = tempfile::tempdir().unwrap();
        let mode = TlsMode::DevSelfSigned {
            cert_dir: dir.path().to_path_buf(),
        };
        let config = mode.to_server_config().unwrap().unwrap();
        assert_eq!(config.send_tls13_tickets, 0);
        assert!(!config.session_storage.can_cache());
        assert!(dir.path().join("client.pem").exists());
    }

    #[test]
    fn custom_loads_written_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = generate_dev_bundle(&["localhost"]).unwrap();
        write_dev_certs(dir.path(), &bundle).unwrap();

        let mode = TlsMode::Custom {
            ca_cert_path: dir.path().join("ca.pem"),
            client_ca_path: None,
            cert_path: dir.path().join("server.pem"),
            key_path: dir.path().join("server-key.pem"),
        };
        assert!(mode.to_server_config().unwrap().is_some());
    }

    #[test]
    fn custom_missing_cert_returns_error() {
        let mode = TlsMode::Custom {
            ca_cert_path: PathBuf::from("/nonexistent/ca.cert"),
            client_ca_path: None,
            cert_path: PathBuf::from("/nonexistent/relay.cert"),
            key_path: PathBuf::from("/nonexistent/relay.key"),
        };
        assert!(matches!(
            mode.to_server_config(),
            Err(TlsConfigError::FileRead(_))
        ));
    }

    #[test]
    fn key_file_without_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = generate_dev_bundle(&["localhost"]).unwrap();
        write_dev_certs(dir.path(), &bundle).unwrap();

        let mode = TlsMode::Custom {
            ca_cert_path: dir.path().join("ca.pem"),
            client_ca_path: None,
            cert_path: dir.path().join("server.pem"),
            key_path: dir.path().join("server.pem"),
        };
        assert!(matches!(
            mode.to_server_config(),
            Err(TlsConfigError::NoPrivateKey(_))
        ));
    }

    #[test]
    fn provider_only_offers_allowed_suites() {
        let provider = restricted_provider();
        assert!(!provider.cipher_suites.is_empty());
        for suite in &provider.cipher_suites {
            assert!(
                ALLOWED_CIPHER_SUITES.contains(&suite.suite()),
                "unexpected suite {:?}",
                suite.suite()
            );
        }
        assert!(
            !provider
                .cipher_suites
                .iter()
                .any(|s| s.suite() == CipherSuite::TLS13_CHACHA20_POLY1305_SHA256)
        );
    }
}
