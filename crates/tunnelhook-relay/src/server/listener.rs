//! Connection listener.
//!
//! With TLS, each accepted connection gets its own task: the handshake runs
//! under a timeout, the peer certificate is turned into a [`PeerIdentity`]
//! once, and every request on the connection carries that identity as an
//! extension. Without TLS, axum serves the router directly and all requests
//! are anonymous.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::auth::{AccessPolicy, PeerIdentity};

/// Per-connection failures. Logged at debug level, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("TLS handshake timed out")]
    HandshakeTimeout,

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Listener settings.
#[derive(Clone)]
pub struct ListenerConfig {
    /// Shared server TLS config; `None` serves plaintext.
    pub tls: Option<Arc<rustls::ServerConfig>>,
    pub handshake_timeout: Duration,
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    config: ListenerConfig,
    policy: Arc<dyn AccessPolicy>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let Some(tls) = config.tls else {
        info!(addr = ?listener.local_addr().ok(), "Serving plaintext HTTP");
        return axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;
    };

    info!(addr = ?listener.local_addr().ok(), "Serving HTTPS");
    let acceptor = TlsAcceptor::from(tls);
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (tcp, peer_addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };

                let acceptor = acceptor.clone();
                let router = router.clone();
                let policy = Arc::clone(&policy);
                let handshake_timeout = config.handshake_timeout;
                tokio::spawn(async move {
                    if let Err(e) = serve_tls_connection(
                        tcp,
                        peer_addr,
                        acceptor,
                        router,
                        policy,
                        handshake_timeout,
                    )
                    .await
                    {
                        debug!(peer_addr = %peer_addr, error = %e, "Connection ended with error");
                    }
                });
            }
            () = &mut shutdown => {
                info!("Listener received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}

async fn serve_tls_connection(
    tcp: TcpStream,
    peer_addr: SocketAddr,
    acceptor: TlsAcceptor,
    router: Router,
    policy: Arc<dyn AccessPolicy>,
    handshake_timeout: Duration,
) -> Result<(), ConnectionError> {
    let stream = timeout(handshake_timeout, acceptor.accept(tcp))
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout)?
        .map_err(ConnectionError::Handshake)?;

    let peer_certs = stream.get_ref().1.peer_certificates().unwrap_or(&[]);
    let identity = PeerIdentity(policy.authenticate(peer_certs).map(Arc::new));
    if identity.principal().is_none() {
        debug!(peer_addr = %peer_addr, "No client certificate, connection is anonymous");
    }

    let service = hyper::service::service_fn(move |mut req: hyper::Request<Incoming>| {
        req.extensions_mut().insert(identity.clone());
        router.clone().oneshot(req)
    });

    auto::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(stream), service)
        .await
        .map_err(|e| ConnectionError::Http(e.to_string()))
}
