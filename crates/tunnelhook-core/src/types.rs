//! Payload types exchanged with callers, the tunnel daemon and the upstream
//! webhook provider.
//!
//! Every payload keeps the fields the relay does not understand so that
//! forwarding and echoing never drop data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Inbound event delivered to the ingest endpoint.
///
/// The payload is opaque: every field, including explicit `null`s, is kept
/// as received so the echo and the canonical form match the caller's event.
/// The nested `event.text` is read on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncomingEvent {
    pub fields: Map<String, Value>,
}

impl IncomingEvent {
    /// The event text, if the payload carries a non-empty string at
    /// `event.text`.
    pub fn text(&self) -> Option<&str> {
        self.fields
            .get("event")
            .and_then(|event| event.get("text"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// Request body forwarded to the upstream webhook provider.
///
/// `text` doubles as a routing side-channel: the relay overwrites it with the
/// callback URL it resolved through the tunnel before forwarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookRequest {
    /// An explicit `null` reads as empty text.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response returned by the upstream webhook provider (a bare string body).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookResponse(pub String);

/// Callback URL the relay hands to the upstream provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookUrl(pub String);

impl std::fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Public endpoint descriptor reported by the tunnel daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelInterface {
    /// Internet-reachable base URL (scheme and host).
    pub public_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incoming_event_preserves_unknown_fields() {
        let raw = json!({
            "token": "abc",
            "event": { "type": "message", "text": "hello" }
        });
        let ev: IncomingEvent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ev.text(), Some("hello"));
        assert_eq!(ev.fields["token"], "abc");
        assert_eq!(serde_json::to_value(&ev).unwrap(), raw);
    }

    #[test]
    fn empty_text_is_treated_as_absent() {
        let ev: IncomingEvent = serde_json::from_value(json!({"event": {"text": ""}})).unwrap();
        assert_eq!(ev.text(), None);

        let ev: IncomingEvent = serde_json::from_value(json!({})).unwrap();
        assert_eq!(ev.text(), None);

        let ev: IncomingEvent = serde_json::from_value(json!({"event": {"text": 42}})).unwrap();
        assert_eq!(ev.text(), None);
    }

    #[test]
    fn incoming_event_keeps_nulls() {
        for raw in [
            json!({"event": {"type": "message", "text": null}}),
            json!({"token": "a", "event": null}),
        ] {
            let ev: IncomingEvent = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(ev.text(), None);
            assert_eq!(serde_json::to_value(&ev).unwrap(), raw);
        }
    }

    #[test]
    fn webhook_request_defaults_text() {
        let req: WebhookRequest =
            serde_json::from_value(json!({"channel": "#general"})).unwrap();
        assert_eq!(req.text, "");
        assert_eq!(req.extra["channel"], "#general");
    }

    #[test]
    fn webhook_request_null_text_is_empty() {
        let req: WebhookRequest =
            serde_json::from_value(json!({"text": null, "channel": "#ops"})).unwrap();
        assert_eq!(req.text, "");
        assert_eq!(req.extra["channel"], "#ops");
    }

    #[test]
    fn webhook_response_is_a_bare_string() {
        let resp = WebhookResponse("ok".into());
        assert_eq!(serde_json::to_string(&resp).unwrap(), "\"ok\"");
    }

    #[test]
    fn tunnel_interface_uses_snake_case_field() {
        let t: TunnelInterface =
            serde_json::from_value(json!({"public_url": "https://abc.ngrok.io", "proto": "https"}))
                .unwrap();
        assert_eq!(t.public_url, "https://abc.ngrok.io");
    }
}
