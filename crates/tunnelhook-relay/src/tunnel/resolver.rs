//! Public URL lookup through the tunnel daemon's management API.

use serde::Deserialize;
use tracing::{info, warn};
use tunnelhook_core::types::TunnelInterface;

use super::config::ResolverConfig;
use super::error::ResolutionError;
use super::gateway;

/// Management API body: either one tunnel or the list of all tunnels.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TunnelApiResponse {
    List { tunnels: Vec<TunnelRecord> },
    Single(TunnelRecord),
}

#[derive(Debug, Deserialize)]
struct TunnelRecord {
    public_url: String,
    #[serde(default)]
    proto: Option<String>,
}

/// Discovers the tunnel's current public URL. Nothing is cached: every call
/// re-reads the routing table and re-queries the daemon.
#[derive(Debug, Clone)]
pub struct TunnelResolver {
    config: ResolverConfig,
    http: reqwest::Client,
}

impl TunnelResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolutionError> {
        crate::tls::ensure_crypto_provider();

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .no_proxy()
            .build()
            .map_err(|e| ResolutionError::Client(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Find the host the tunnel daemon runs on.
    pub async fn resolve_gateway(&self) -> Result<String, ResolutionError> {
        let gw = gateway::resolve_gateway(&self.config.gateway, self.config.command_timeout).await;
        match &gw {
            Ok(host) => info!(gateway = %host, "Resolved gateway"),
            Err(e) => warn!(error = %e, "Gateway resolution failed"),
        }
        gw
    }

    /// Ask the daemon on `gateway` for the active public URL.
    pub async fn resolve_public_url(
        &self,
        gateway: &str,
    ) -> Result<TunnelInterface, ResolutionError> {
        let url = self.config.api_url(gateway);
        let result = self.fetch(&url).await;
        match &result {
            Ok(tunnel) => info!(api = %url, public_url = %tunnel.public_url, "Resolved tunnel"),
            Err(e) => warn!(api = %url, error = %e, "Tunnel API query failed"),
        }
        result
    }

    /// Gateway lookup followed by the public URL query.
    pub async fn resolve(&self) -> Result<TunnelInterface, ResolutionError> {
        let gateway = self.resolve_gateway().await?;
        self.resolve_public_url(&gateway).await
    }

    async fn fetch(&self, url: &str) -> Result<TunnelInterface, ResolutionError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ResolutionError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        parse_tunnel_response(&body)
    }
}

/// Pick the public URL out of a management API body.
///
/// From a tunnel list the first `https` tunnel wins, otherwise the first
/// tunnel.
pub fn parse_tunnel_response(body: &[u8]) -> Result<TunnelInterface, ResolutionError> {
    let parsed: TunnelApiResponse =
        serde_json::from_slice(body).map_err(|e| ResolutionError::Parse(e.to_string()))?;

    let record = match parsed {
        TunnelApiResponse::Single(record) => record,
        TunnelApiResponse::List { mut tunnels } => {
            let idx = tunnels
                .iter()
                .position(|t| t.proto.as_deref() == Some("https"))
                .unwrap_or(0);
            if tunnels.is_empty() {
                return Err(ResolutionError::NoTunnels);
            }
            tunnels.swap_remove(idx)
        }
    };

    if record.public_url.trim().is_empty() {
        return Err(ResolutionError::Parse("empty public_url".into()));
    }

    Ok(TunnelInterface {
        public_url: record.public_url,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_descriptor() {
        let t = parse_tunnel_response(
            br#"{"name":"command_line","public_url":"https://abc.ngrok.io","proto":"https"}"#,
        )
        .unwrap();
        assert_eq!(t.public_url, "https://abc.ngrok.io");
    }

    #[test]
    fn list_prefers_https() {
        let t = parse_tunnel_response(
            br#"{"tunnels":[
                {"public_url":"http://abc.ngrok.io","proto":"http"},
                {"public_url":"https://abc.ngrok.io","proto":"https"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(t.public_url, "https://abc.ngrok.io");
    }

    #[test]
    fn list_without_https_takes_first() {
        let t = parse_tunnel_response(
            br#"{"tunnels":[{"public_url":"tcp://0.tcp.ngrok.io:1234","proto":"tcp"}]}"#,
        )
        .unwrap();
        assert_eq!(t.public_url, "tcp://0.tcp.ngrok.io:1234");
    }

    #[test]
    fn empty_list_is_an_error() {
        let err = parse_tunnel_response(br#"{"tunnels":[]}"#).unwrap_err();
        assert!(matches!(err, ResolutionError::NoTunnels));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            parse_tunnel_response(b"<html>502</html>"),
            Err(ResolutionError::Parse(_))
        ));
        assert!(matches!(
            parse_tunnel_response(br#"{"public_url":""}"#),
            Err(ResolutionError::Parse(_))
        ));
        assert!(matches!(
            parse_tunnel_response(br#"{"status":"ok"}"#),
            Err(ResolutionError::Parse(_))
        ));
    }
}
