//! Development certificate generation using rcgen.
//!
//! Generates a self-signed CA plus server and client certificates for local
//! development and testing. NOT suitable for production use.

use std::path::Path;

use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair,
    KeyUsagePurpose,
};
use tracing::info;

/// Common name of the client certificate written in dev mode.
pub const DEV_CLIENT_CN: &str = "dev.tunnelhook";

/// Generated certificate bundle (PEM-encoded).
pub struct CertBundle {
    /// CA certificate PEM.
    pub ca_cert_pem: String,
    /// Server certificate PEM.
    pub server_cert_pem: String,
    /// Server private key PEM.
    pub server_key_pem: String,
    /// Client certificate PEM.
    pub client_cert_pem: String,
    /// Client private key PEM.
    pub client_key_pem: String,
}

/// CA material kept around for signing leaf certificates.
pub struct DevCa {
    params: CertificateParams,
    key_pair: KeyPair,
    /// PEM-encoded CA certificate.
    pub cert_pem: String,
}

/// Generate a self-signed CA.
pub fn generate_ca(org_name: &str) -> Result<DevCa, CertError> {
    let mut params = CertificateParams::default();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::CommonName, format!("{org_name} CA"));
    params
        .distinguished_name
        .push(DnType::OrganizationName, org_name);
    params.key_usages.push(KeyUsagePurpose::KeyCertSign);
    params.key_usages.push(KeyUsagePurpose::CrlSign);

    let key_pair = KeyPair::generate().map_err(|e| CertError::Generation(e.to_string()))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| CertError::Generation(e.to_string()))?;

    Ok(DevCa {
        cert_pem: cert.pem(),
        params,
        key_pair,
    })
}

/// Generate a server certificate signed by the given CA.
pub fn generate_server_cert(
    ca: &DevCa,
    server_names: &[&str],
) -> Result<(String, String), CertError> {
    let issuer = Issuer::from_params(&ca.params, &ca.key_pair);

    let mut params = CertificateParams::new(
        server_names
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
    )
    .map_err(|e| CertError::Generation(e.to_string()))?;

    params
        .distinguished_name
        .push(DnType::CommonName, "tunnelhook relay");
    params
        .extended_key_usages
        .push(ExtendedKeyUsagePurpose::ServerAuth);

    let key = KeyPair::generate().map_err(|e| CertError::Generation(e.to_string()))?;
    let cert = params
        .signed_by(&key, &issuer)
        .map_err(|e| CertError::Generation(e.to_string()))?;

    Ok((cert.pem(), key.serialize_pem()))
}

/// Generate a client certificate signed by the given CA, with `common_name`
/// as the subject CN.
pub fn generate_client_cert(ca: &DevCa, common_name: &str) -> Result<(String, String), CertError> {
    let issuer = Issuer::from_params(&ca.params, &ca.key_pair);

    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params
        .extended_key_usages
        .push(ExtendedKeyUsagePurpose::ClientAuth);

    let key = KeyPair::generate().map_err(|e| CertError::Generation(e.to_string()))?;
    let cert = params
        .signed_by(&key, &issuer)
        .map_err(|e| CertError::Generation(e.to_string()))?;

    Ok((cert.pem(), key.serialize_pem()))
}

/// Generate a full dev certificate bundle (CA + server + client).
pub fn generate_dev_bundle(server_names: &[&str]) -> Result<CertBundle, CertError> {
    let ca = generate_ca("tunnelhook Dev")?;
    let (server_cert_pem, server_key_pem) = generate_server_cert(&ca, server_names)?;
    let (client_cert_pem, client_key_pem) = generate_client_cert(&ca, DEV_CLIENT_CN)?;

    Ok(CertBundle {
        ca_cert_pem: ca.cert_pem,
        server_cert_pem,
        server_key_pem,
        client_cert_pem,
        client_key_pem,
    })
}

/// Write a dev certificate bundle to disk.
pub fn write_dev_certs(dir: &Path, bundle: &CertBundle) -> Result<(), CertError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CertError::Io(format!("Failed to create cert dir: {e}")))?;

    let files = [
        ("ca.pem", &bundle.ca_cert_pem),
        ("server.pem", &bundle.server_cert_pem),
        ("server-key.pem", &bundle.server_key_pem),
        ("client.pem", &bundle.client_cert_pem),
        ("client-key.pem", &bundle.client_key_pem),
    ];
    for (name, pem) in files {
        std::fs::write(dir.join(name), pem)
            .map_err(|e| CertError::Io(format!("Failed to write {name}: {e}")))?;
    }

    info!(
        dir = %dir.display(),
        client_cn = DEV_CLIENT_CN,
        "Dev certificates written"
    );

    Ok(())
}

/// Certificate generation errors.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Certificate generation error: {0}")]
    Generation(String),

    #[error("I/O error: {0}")]
    Io(String),
}
