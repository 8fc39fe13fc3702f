//! Deterministic canonical form for inbound events.
//!
//! The canonical form is compact JSON with every object's keys in
//! lexicographic order, so two payloads that differ only in key order
//! canonicalize to the same bytes. It is what the relay writes to the audit
//! log for each ingested event.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::tracing_init::AUDIT_TARGET;
use crate::types::IncomingEvent;

/// `<target|label>` link markup. Captures the link target; `<`, `>` and `|`
/// cannot appear inside it.
#[allow(clippy::expect_used)]
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>|]+)\|").expect("static regex is valid"));

/// Turns an ingested event into the bytes written to the audit log.
///
/// The ingest endpoint holds an `Arc<dyn Canonicalize>`; [`EventCanonicalizer`]
/// is the implementation the relay runs with.
pub trait Canonicalize: Send + Sync {
    fn canonicalize(&self, event: &IncomingEvent) -> Result<Vec<u8>>;
}

/// Normalizes events to their canonical byte form and records link
/// references found in their text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventCanonicalizer;

impl EventCanonicalizer {
    pub const fn new() -> Self {
        Self
    }
}

impl Canonicalize for EventCanonicalizer {
    /// Canonicalize an event and write the result to the audit log.
    ///
    /// If the event carries text with a `<url|label>` reference, the first
    /// such URL is logged as well. A missing reference is not an error.
    fn canonicalize(&self, event: &IncomingEvent) -> Result<Vec<u8>> {
        if let Some(url) = event.text().and_then(link_reference) {
            info!(target: AUDIT_TARGET, link = %url, "Event references link");
        }

        let canonical = canonical_bytes(event)?;
        info!(
            target: AUDIT_TARGET,
            canonical = %String::from_utf8_lossy(&canonical),
            "Event canonicalized"
        );
        Ok(canonical)
    }
}

/// Return the target of the first `<url|label>` reference in `text`.
///
/// Only the first occurrence is considered even when several are present.
pub fn link_reference(text: &str) -> Option<&str> {
    LINK_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Serialize any value to compact JSON with sorted object keys.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value).map_err(Error::Serialization)?;
    serde_json::to_vec(&sort_keys(value)).map_err(Error::Serialization)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
