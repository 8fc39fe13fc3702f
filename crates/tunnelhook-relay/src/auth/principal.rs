//! Principal identity extracted from a client certificate.

use rustls_pki_types::CertificateDer;

use super::policy::AuthError;

/// Identity of a peer that presented a client certificate.
///
/// The subject common name is the full identifier (the YRN). It splits at the
/// last `.` into a domain and a name, e.g. `svc.myapp` has domain `svc` and
/// name `myapp`. A common name without a dot is all domain with an empty
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    yrn: String,
    domain: String,
    name: String,
}

impl Principal {
    /// Build a principal from a certificate subject common name.
    pub fn from_common_name(cn: impl Into<String>) -> Self {
        let yrn = cn.into();
        let (domain, name) = match yrn.rfind('.') {
            Some(i) => (yrn[..i].to_string(), yrn[i + 1..].to_string()),
            None => (yrn.clone(), String::new()),
        };
        Self { yrn, domain, name }
    }

    /// Parse a DER-encoded certificate and derive the principal from its
    /// subject common name.
    pub fn from_certificate(cert_der: &CertificateDer<'_>) -> Result<Self, AuthError> {
        let (_, cert) = x509_parser::parse_x509_certificate(cert_der.as_ref())
            .map_err(|e| AuthError::Certificate(e.to_string()))?;

        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .ok_or(AuthError::MissingCommonName)?
            .as_str()
            .map_err(|e| AuthError::Certificate(e.to_string()))?;

        Ok(Self::from_common_name(cn))
    }

    /// Full common name.
    pub fn yrn(&self) -> &str {
        &self.yrn
    }

    /// Everything before the last `.`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Everything after the last `.`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.yrn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, KeyPair};

    fn cert_with_cn(cn: Option<&str>) -> CertificateDer<'static> {
        let mut params = CertificateParams::default();
        params.distinguished_name = rcgen::DistinguishedName::new();
        if let Some(cn) = cn {
            params.distinguished_name.push(DnType::CommonName, cn);
        }
        params
            .distinguished_name
            .push(DnType::OrganizationName, "tunnelhook");
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().clone()
    }

    #[test]
    fn splits_at_last_dot() {
        let p = Principal::from_common_name("svc.myapp");
        assert_eq!(p.yrn(), "svc.myapp");
        assert_eq!(p.domain(), "svc");
        assert_eq!(p.name(), "myapp");
    }

    #[test]
    fn nested_domain_keeps_inner_dots() {
        let p = Principal::from_common_name("prod.payments.billing");
        assert_eq!(p.domain(), "prod.payments");
        assert_eq!(p.name(), "billing");
        assert_eq!(format!("{}.{}", p.domain(), p.name()), p.yrn());
    }

    #[test]
    fn no_dot_is_all_domain() {
        let p = Principal::from_common_name("standalone");
        assert_eq!(p.domain(), "standalone");
        assert_eq!(p.name(), "");
    }

    #[test]
    fn trailing_dot_gives_empty_name() {
        let p = Principal::from_common_name("svc.");
        assert_eq!(p.domain(), "svc");
        assert_eq!(p.name(), "");
    }

    #[test]
    fn display_is_yrn() {
        assert_eq!(Principal::from_common_name("a.b").to_string(), "a.b");
    }

    #[test]
    fn from_certificate_reads_common_name() {
        let der = cert_with_cn(Some("svc.myapp"));
        let p = Principal::from_certificate(&der).unwrap();
        assert_eq!(p.domain(), "svc");
        assert_eq!(p.name(), "myapp");
    }

    #[test]
    fn certificate_without_common_name_is_rejected() {
        let der = cert_with_cn(None);
        let err = Principal::from_certificate(&der).unwrap_err();
        assert!(matches!(err, AuthError::MissingCommonName), "got {err}");
    }

    #[test]
    fn garbage_der_is_rejected() {
        let der = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x01, 0xff]);
        assert!(matches!(
            Principal::from_certificate(&der),
            Err(AuthError::Certificate(_))
        ));
    }
}
