//! Pre-built records and metric sets for common testing scenarios.
//!
//! The message fixtures mirror a test-framework message log: each record has a
//! `direction`, a `sessionId`, and a `body` that is either an object or a
//! one-element list, with the message type under `metadata.messageType`.
//! The event fixtures carry an `eventType` and a `successful` flag.

use crate::metric::Metric;
use serde_json::{Value as JsonValue, json};

/// JSON pointers tried, in order, to find a message's type.
pub const MESSAGE_TYPE_POINTERS: [&str; 2] = [
    "/body/0/metadata/messageType",
    "/body/metadata/messageType",
];

/// Metrics for [`sample_messages`]: `direction`, `session` (from
/// `sessionId`) and `messageType`.
#[must_use]
pub fn message_metrics() -> Vec<Metric<JsonValue>> {
    vec![
        Metric::field("direction", "direction"),
        Metric::field("session", "sessionId"),
        Metric::first_pointer("messageType", MESSAGE_TYPE_POINTERS),
    ]
}

fn message(direction: &str, session: &str, message_type: &str, listed: bool) -> JsonValue {
    let mut body = json!({ "metadata": { "messageType": message_type } });
    if listed {
        body = JsonValue::Array(vec![body]);
    }
    json!({
        "direction": direction,
        "sessionId": session,
        "body": body,
    })
}

/// Six messages over two sessions.
///
/// | direction | session | messageType     |
/// |-----------|---------|-----------------|
/// | IN        | s1      | NewOrderSingle  |
/// | OUT       | s1      | ExecutionReport |
/// | IN        | s2      | NewOrderSingle  |
/// | OUT       | s1      | ExecutionReport |
/// | IN        | s1      | NewOrderSingle  |
/// | OUT       | s2      | Reject          |
///
/// # Example
///
/// ```
/// use crosstally::testing::sample_messages;
///
/// let msgs = sample_messages();
/// assert_eq!(msgs.len(), 6);
/// ```
#[must_use]
pub fn sample_messages() -> Vec<JsonValue> {
    vec![
        message("IN", "s1", "NewOrderSingle", true),
        message("OUT", "s1", "ExecutionReport", false),
        message("IN", "s2", "NewOrderSingle", false),
        message("OUT", "s1", "ExecutionReport", true),
        message("IN", "s1", "NewOrderSingle", true),
        message("OUT", "s2", "Reject", false),
    ]
}

/// A message with no `sessionId`, for exercising extraction failures.
#[must_use]
pub fn message_without_session() -> JsonValue {
    json!({
        "direction": "IN",
        "body": { "metadata": { "messageType": "Heartbeat" } },
    })
}

/// Metrics for [`sample_events`]: `type` (from `eventType`) and `successful`.
#[must_use]
pub fn event_metrics() -> Vec<Metric<JsonValue>> {
    vec![
        Metric::field("type", "eventType"),
        Metric::field("successful", "successful"),
    ]
}

/// Five events: three `Verification` (one failed) and two `Send message`.
#[must_use]
pub fn sample_events() -> Vec<JsonValue> {
    vec![
        json!({"eventType": "Verification", "successful": true}),
        json!({"eventType": "Verification", "successful": false}),
        json!({"eventType": "Send message", "successful": true}),
        json!({"eventType": "Verification", "successful": true}),
        json!({"eventType": "Send message", "successful": true}),
    ]
}
