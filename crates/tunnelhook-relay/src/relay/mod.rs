//! Webhook forwarding through the discovered tunnel.

pub mod config;
pub mod forwarder;

pub use config::{HookPath, UpstreamConfig};
pub use forwarder::{ForwardError, RelayOutcome, WebhookRelay, callback_url};
