//! Tunnel discovery error types.

/// Errors raised while discovering the tunnel's public URL. None of them are
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Unable to execute route command: {0}")]
    Command(String),

    #[error("Route command timed out after {0:?}")]
    CommandTimeout(std::time::Duration),

    #[error("No gateway in route command output")]
    EmptyOutput,

    #[error("Tunnel API unreachable: {0}")]
    Unreachable(String),

    #[error("Tunnel API timed out")]
    Timeout,

    #[error("Tunnel API returned status {0}")]
    Status(u16),

    #[error("Unparsable tunnel API response: {0}")]
    Parse(String),

    #[error("Tunnel API reports no active tunnels")]
    NoTunnels,

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ResolutionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}
