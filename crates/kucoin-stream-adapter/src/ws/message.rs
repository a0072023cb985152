/*
[INPUT]:  Outbound frame parameters and raw inbound JSON values
[OUTPUT]: Wire-format frames (ping, subscribe) and inbound classification
[POS]:    WebSocket layer - message construction and classification
[UPDATE]: When the exchange wire protocol changes
*/

use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Frame types the exchange uses for protocol bookkeeping. These are
/// consumed by the dispatch loop and never reach the consumer callback.
const CONTROL_TYPES: &[&str] = &["welcome", "ack", "pong", "subscribe", "unsubscribe", "error"];

static LAST_REQUEST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a unique, ms-epoch-derived request id.
///
/// Strictly increasing within the process so two requests issued in the
/// same millisecond never share an id.
pub(crate) fn next_request_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST_REQUEST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_REQUEST_ID.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next.to_string(),
            Err(actual) => prev = actual,
        }
    }
}

/// Keepalive ping frame, sent by the client only
#[derive(Debug, Serialize)]
pub struct PingFrame {
    pub id: String,
    #[serde(rename = "type")]
    pub frame_type: &'static str,
}

impl PingFrame {
    pub fn new() -> Self {
        Self { id: next_request_id(), frame_type: "ping" }
    }
}

impl Default for PingFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Topic subscription request frame
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeFrame {
    pub id: String,
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub topic: String,
    #[serde(rename = "privateChannel", skip_serializing_if = "Option::is_none")]
    pub private_channel: Option<bool>,
    pub response: bool,
}

impl SubscribeFrame {
    /// Build a subscribe frame with a fresh unique id
    pub fn new(topic: impl Into<String>, private: bool) -> Self {
        Self {
            id: next_request_id(),
            frame_type: "subscribe",
            topic: topic.into(),
            private_channel: private.then_some(true),
            response: true,
        }
    }
}

/// Classify an inbound frame as protocol bookkeeping, if it is one.
///
/// Returns the control type for welcome/ack/pong/subscribe/unsubscribe/error
/// frames; data frames (no `type`, or an unrecognized one) return `None`.
pub(crate) fn control_type(value: &serde_json::Value) -> Option<&str> {
    value
        .get("type")
        .and_then(|v| v.as_str())
        .filter(|t| CONTROL_TYPES.contains(t))
}
