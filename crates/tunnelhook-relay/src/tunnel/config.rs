//! Tunnel discovery configuration.

use std::time::Duration;

/// Default port of the tunnel daemon's management API.
pub const DEFAULT_API_PORT: u16 = 4040;

/// Default management API path describing the active tunnel.
pub const DEFAULT_API_PATH: &str = "/api/tunnels/command_line";

/// Where the tunnel daemon's host address comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewaySource {
    /// Run a routing table command and take the gateway column of its
    /// third line (the default route in `route -n` output).
    RouteTable { program: String, args: Vec<String> },
    /// Use a fixed host and skip the routing table.
    Fixed(String),
}

impl Default for GatewaySource {
    fn default() -> Self {
        Self::RouteTable {
            program: "route".into(),
            args: vec!["-n".into()],
        }
    }
}

/// Configuration for [`TunnelResolver`](super::TunnelResolver).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub gateway: GatewaySource,
    /// Management API port on the gateway host.
    pub api_port: u16,
    /// Management API path.
    pub api_path: String,
    /// Upper bound for the routing table command.
    pub command_timeout: Duration,
    /// Upper bound for the management API call.
    pub request_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gateway: GatewaySource::default(),
            api_port: DEFAULT_API_PORT,
            api_path: DEFAULT_API_PATH.into(),
            command_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverConfig {
    /// Management API URL on `gateway`. IPv6 literals are bracketed.
    pub fn api_url(&self, gateway: &str) -> String {
        let host = if gateway.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("[{gateway}]")
        } else {
            gateway.to_string()
        };
        let path = if self.api_path.starts_with('/') {
            self.api_path.clone()
        } else {
            format!("/{}", self.api_path)
        };
        format!("http://{host}:{}{path}", self.api_port)
    }
}
