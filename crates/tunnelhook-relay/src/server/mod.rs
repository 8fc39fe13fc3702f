//! HTTP(S) server for the relay.

pub mod error;
pub mod listener;
pub mod middleware;
pub mod routes;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

pub use error::ApiError;
pub use listener::{ConnectionError, ListenerConfig, serve};
pub use routes::{AppState, build_router};

use crate::auth::AccessPolicy;
use crate::config::RelayConfig;
use crate::relay::WebhookRelay;
use crate::tunnel::TunnelResolver;

/// Build every component from `config`, bind and serve until `shutdown`.
///
/// The TLS server config is built once here and shared by all connections.
pub async fn run(
    config: RelayConfig,
    policy: Arc<dyn AccessPolicy>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let tls = config.tls.to_server_config()?;

    let resolver = TunnelResolver::new(config.resolver)?;
    let relay = WebhookRelay::new(resolver, config.upstream)?;
    let router = build_router(AppState::new(relay, Arc::clone(&policy)));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(addr = %listener.local_addr()?, tls = tls.is_some(), "Relay listening");

    serve(
        listener,
        router,
        ListenerConfig {
            tls,
            handshake_timeout: config.handshake_timeout,
        },
        policy,
        shutdown,
    )
    .await?;

    info!("Relay stopped");
    Ok(())
}
