//! tunnelhook relay server
//!
//! Accepts events and webhook requests over mutual TLS and forwards webhooks
//! to the upstream provider with a callback URL discovered through the local
//! tunnel daemon.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use tunnelhook_relay::auth::PassThroughPolicy;
use tunnelhook_relay::config::{DEFAULT_HOST, DEFAULT_PORT, RelayConfig, split_command};
use tunnelhook_relay::relay::UpstreamConfig;
use tunnelhook_relay::relay::config::DEFAULT_UPSTREAM_URL;
use tunnelhook_relay::tls::TlsMode;
use tunnelhook_relay::tunnel::config::{DEFAULT_API_PATH, DEFAULT_API_PORT};
use tunnelhook_relay::tunnel::{GatewaySource, ResolverConfig};

#[derive(Parser, Debug)]
#[command(name = "tunnelhook-relay")]
#[command(
    version,
    about = "tunnelhook relay - mTLS webhook relay with tunnel discovery"
)]
#[allow(clippy::struct_excessive_bools)]
struct Args {
    /// Host to bind.
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Serve plaintext HTTP. All requests are anonymous.
    #[arg(long, conflicts_with = "dev_tls")]
    plaintext: bool,

    /// Enable dev TLS with auto-generated CA, server and client certificates.
    #[arg(long)]
    dev_tls: bool,

    /// CA bundle (PEM) used to verify client certificates.
    #[arg(long, default_value = "certs/ca.cert")]
    ca_cert: PathBuf,

    /// Separate client CA bundle (PEM). Defaults to --ca-cert.
    #[arg(long)]
    client_ca: Option<PathBuf>,

    /// Server certificate (PEM).
    #[arg(long, default_value = "certs/relay.cert")]
    tls_cert: PathBuf,

    /// Server private key (PEM).
    #[arg(long, default_value = "keys/relay.key")]
    tls_key: PathBuf,

    /// TLS handshake timeout in seconds.
    #[arg(long, default_value_t = 10)]
    handshake_timeout: u64,

    /// Fixed tunnel daemon host. Skips routing table discovery.
    #[arg(long, env = "TUNNELHOOK_TUNNEL_HOST")]
    tunnel_host: Option<String>,

    /// Command printing the routing table; the gateway is field 2 of line 3.
    #[arg(long, default_value = "route -n")]
    route_command: String,

    /// Route command timeout in seconds.
    #[arg(long, default_value_t = 5)]
    route_timeout: u64,

    /// Tunnel daemon management API port.
    #[arg(long, default_value_t = DEFAULT_API_PORT)]
    tunnel_api_port: u16,

    /// Tunnel daemon management API path.
    #[arg(long, default_value = DEFAULT_API_PATH)]
    tunnel_api_path: String,

    /// Tunnel daemon API timeout in seconds.
    #[arg(long, default_value_t = 5)]
    tunnel_timeout: u64,

    /// Upstream webhook provider base URL.
    #[arg(long, env = "TUNNELHOOK_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Skip certificate verification for the upstream provider.
    #[arg(long)]
    insecure_upstream: bool,

    /// Upstream request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    upstream_timeout: u64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn tls_mode(&self) -> anyhow::Result<TlsMode> {
        if self.plaintext {
            return Ok(TlsMode::Disabled);
        }
        if self.dev_tls {
            let cert_dir = dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?
                .join(".tunnelhook")
                .join("certs");
            return Ok(TlsMode::DevSelfSigned { cert_dir });
        }
        Ok(TlsMode::Custom {
            ca_cert_path: self.ca_cert.clone(),
            client_ca_path: self.client_ca.clone(),
            cert_path: self.tls_cert.clone(),
            key_path: self.tls_key.clone(),
        })
    }

    fn gateway_source(&self) -> anyhow::Result<GatewaySource> {
        if let Some(host) = &self.tunnel_host {
            return Ok(GatewaySource::Fixed(host.clone()));
        }
        let (program, args) = split_command(&self.route_command)
            .ok_or_else(|| anyhow::anyhow!("--route-command is empty"))?;
        Ok(GatewaySource::RouteTable { program, args })
    }

    fn into_config(self) -> anyhow::Result<RelayConfig> {
        Ok(RelayConfig {
            tls: self.tls_mode()?,
            resolver: ResolverConfig {
                gateway: self.gateway_source()?,
                api_port: self.tunnel_api_port,
                api_path: self.tunnel_api_path,
                command_timeout: Duration::from_secs(self.route_timeout),
                request_timeout: Duration::from_secs(self.tunnel_timeout),
            },
            upstream: UpstreamConfig {
                base_url: self.upstream_url,
                insecure: self.insecure_upstream,
                timeout: Duration::from_secs(self.upstream_timeout),
            },
            handshake_timeout: Duration::from_secs(self.handshake_timeout),
            host: self.host,
            port: self.port,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tunnelhook_core::tracing_init::init_tracing(
        "tunnelhook_relay=info,tunnelhook_core=info,audit=info",
        args.log_json,
    );

    let config = args.into_config()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        upstream = %config.upstream.base_url,
        "Starting tunnelhook-relay"
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
        }
    };

    tunnelhook_relay::server::run(config, Arc::new(PassThroughPolicy), shutdown).await
}
