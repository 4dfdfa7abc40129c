//! Subscribe response body parsing.
//!
//! Long-poll response is a JSON array:
//! `[messages, timetoken, subscriptions?, channels?]` where `subscriptions` and
//! `channels` are comma-separated names. An empty body or `[]` is the idle
//! heartbeat.

use serde::Deserialize;
use serde_json::Value;

use crate::{core::PubNubError, dx::subscribe::types::Presence};

/// Decoded subscribe response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubscribeResponseBody {
    /// Service kept connection alive without new data.
    Heartbeat,

    /// Batch of updates with the next time token.
    Envelope(Envelope),
}

/// One decoded long-poll response.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Envelope {
    /// Received payloads in service order.
    pub messages: Vec<Value>,

    /// Time token for the next request.
    pub timetoken: String,

    /// Subscription name per message (or one name for all of them).
    pub subscriptions: Vec<String>,

    /// Actual channel per message when messages arrive through groups.
    pub channels: Vec<String>,
}

/// Decode raw long-poll response `body`.
pub(crate) fn parse_response(body: &[u8]) -> Result<SubscribeResponseBody, PubNubError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SubscribeResponseBody::Heartbeat);
    }

    let elements: Vec<Value> =
        serde_json::from_slice(body).map_err(|err| PubNubError::Deserialization {
            details: err.to_string(),
        })?;

    let mut elements = elements.into_iter();
    let Some(messages) = elements.next() else {
        return Ok(SubscribeResponseBody::Heartbeat);
    };

    let Value::Array(messages) = messages else {
        return Err(malformed("messages should be an array"));
    };

    let timetoken = match elements.next() {
        Some(Value::String(timetoken)) if !timetoken.is_empty() => timetoken,
        Some(Value::Number(timetoken)) => timetoken.to_string(),
        _ => return Err(malformed("time token is missing")),
    };

    Ok(SubscribeResponseBody::Envelope(Envelope {
        messages,
        timetoken,
        subscriptions: names(elements.next())?,
        channels: names(elements.next())?,
    }))
}

fn names(value: Option<Value>) -> Result<Vec<String>, PubNubError> {
    match value {
        None | Some(Value::Null) => Ok(vec![]),
        Some(Value::String(names)) => Ok(names
            .split(',')
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()),
        Some(_) => Err(malformed("subscription names should be a string")),
    }
}

fn malformed(details: &str) -> PubNubError {
    PubNubError::Deserialization {
        details: format!("Unexpected subscribe response: {details}"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct PresencePayload {
    action: Option<String>,
    timestamp: Option<u64>,
    uuid: Option<String>,
    occupancy: Option<usize>,
    join: Option<Vec<String>>,
    leave: Option<Vec<String>>,
    timeout: Option<Vec<String>>,
    data: Option<Value>,
}

/// Interpret presence event `payload` received on `channel`.
pub(crate) fn parse_presence(payload: &Value, channel: &str, subscription: &str) -> Presence {
    let unknown = || Presence::Unknown {
        channel: channel.to_string(),
        subscription: subscription.to_string(),
        data: serde_json::to_vec(payload).unwrap_or_default(),
    };

    let Ok(event) = PresencePayload::deserialize(payload) else {
        return unknown();
    };

    let channel = channel.to_string();
    let subscription = subscription.to_string();
    let timestamp = event.timestamp.unwrap_or_default();
    let occupancy = event.occupancy.unwrap_or_default();

    match (event.action.as_deref(), event.uuid) {
        (Some("join"), Some(uuid)) => Presence::Join {
            timestamp,
            uuid,
            channel,
            subscription,
            occupancy,
        },
        (Some("leave"), Some(uuid)) => Presence::Leave {
            timestamp,
            uuid,
            channel,
            subscription,
            occupancy,
        },
        (Some("timeout"), Some(uuid)) => Presence::Timeout {
            timestamp,
            uuid,
            channel,
            subscription,
            occupancy,
        },
        (Some("state-change"), Some(uuid)) => Presence::StateChange {
            timestamp,
            uuid,
            channel,
            subscription,
            data: event.data.and_then(|data| serde_json::to_vec(&data).ok()),
        },
        (Some("interval"), _) => Presence::Interval {
            timestamp,
            channel,
            subscription,
            occupancy,
            join: event.join,
            leave: event.leave,
            timeout: event.timeout,
        },
        _ => unknown(),
    }
}
