//! Relay configuration.

use std::time::Duration;

use crate::relay::UpstreamConfig;
use crate::tls::TlsMode;
use crate::tunnel::ResolverConfig;

/// Default bind host (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 4080;

/// Everything the relay needs to start.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub resolver: ResolverConfig,
    pub upstream: UpstreamConfig,
    pub handshake_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            tls: TlsMode::Disabled,
            resolver: ResolverConfig::default(),
            upstream: UpstreamConfig::default(),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

/// Split a command line such as `"route -n"` into program and arguments.
pub fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(ToString::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces() {
        let config = RelayConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 4080);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[test]
    fn split_command_line() {
        assert_eq!(
            split_command("route -n"),
            Some(("route".to_string(), vec!["-n".to_string()]))
        );
        assert_eq!(split_command("  ip  "), Some(("ip".to_string(), vec![])));
        assert_eq!(split_command("   "), None);
    }
}
