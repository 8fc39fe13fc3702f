//! Relay pipeline: resolve the tunnel, stamp the callback URL into the
//! request and post it to the upstream provider.

use tracing::{info, warn};
use tunnelhook_core::types::{WebhookRequest, WebhookResponse, WebhookUrl};

use super::config::{HookPath, UpstreamConfig};
use crate::tunnel::{ResolutionError, TunnelResolver};

/// Path on the public tunnel URL that the upstream provider calls back.
pub const CALLBACK_PATH_PREFIX: &str = "/api/v1/services";

/// Failure talking to the upstream provider. Logged, never returned to the
/// relay's caller.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Result of one relay pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Callback URL written into the forwarded request.
    pub callback_url: WebhookUrl,
    /// Upstream body, or the caller's original text if forwarding failed.
    pub response: WebhookResponse,
}

/// Build the callback URL for `path` on the tunnel's public URL.
pub fn callback_url(public_url: &str, path: &HookPath) -> WebhookUrl {
    WebhookUrl(format!(
        "{}{CALLBACK_PATH_PREFIX}/{}",
        public_url.trim_end_matches('/'),
        path.joined()
    ))
}

/// Forwards webhook requests to the upstream provider with the tunnel's
/// callback URL substituted in.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    resolver: TunnelResolver,
    upstream: UpstreamConfig,
    http: reqwest::Client,
}

impl WebhookRelay {
    pub fn new(resolver: TunnelResolver, upstream: UpstreamConfig) -> Result<Self, ForwardError> {
        crate::tls::ensure_crypto_provider();

        if upstream.insecure {
            warn!(
                upstream = %upstream.base_url,
                "Upstream certificate verification disabled"
            );
        }

        #[allow(deprecated)]
        let http = reqwest::Client::builder()
            .timeout(upstream.timeout)
            .danger_accept_invalid_certs(upstream.insecure)
            .build()
            .map_err(|e| ForwardError::Client(e.to_string()))?;

        Ok(Self {
            resolver,
            upstream,
            http,
        })
    }

    pub fn resolver(&self) -> &TunnelResolver {
        &self.resolver
    }

    /// Relay `request` and return the upstream response.
    ///
    /// Tunnel discovery failures are returned. Upstream failures are only
    /// logged; the caller then gets its own original text back.
    pub async fn relay(
        &self,
        path: &HookPath,
        request: WebhookRequest,
    ) -> Result<WebhookResponse, ResolutionError> {
        Ok(self.forward(path, request).await?.response)
    }

    /// Relay an empty request and return the callback URL it was given.
    pub async fn webhook_url(&self, path: &HookPath) -> Result<WebhookUrl, ResolutionError> {
        Ok(self
            .forward(path, WebhookRequest::default())
            .await?
            .callback_url)
    }

    /// Full relay pass, reporting both the callback URL and the response.
    pub async fn forward(
        &self,
        path: &HookPath,
        mut request: WebhookRequest,
    ) -> Result<RelayOutcome, ResolutionError> {
        let tunnel = self.resolver.resolve().await.inspect_err(|e| {
            warn!(hook = %path.joined(), error = %e, "Tunnel discovery failed, not relaying");
        })?;

        let callback = callback_url(&tunnel.public_url, path);
        let original_text = std::mem::replace(&mut request.text, callback.0.clone());
        info!(callback_url = %callback, "Relaying webhook");

        let response = match self.post_upstream(path, &request).await {
            Ok(body) => WebhookResponse(body),
            Err(e) => {
                warn!(
                    upstream = %self.upstream.base_url,
                    error = %e,
                    "Upstream webhook call failed, answering with original text"
                );
                WebhookResponse(original_text)
            }
        };

        Ok(RelayOutcome {
            callback_url: callback,
            response,
        })
    }

    async fn post_upstream(
        &self,
        path: &HookPath,
        request: &WebhookRequest,
    ) -> Result<String, ForwardError> {
        let resp = self
            .http
            .post(self.upstream.hook_url(path))
            .json(request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
