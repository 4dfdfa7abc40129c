//! Envelope demultiplexer.
//!
//! Splits decoded long-poll response into per-subscription updates.

use base64::{engine::general_purpose, Engine};
use log::warn;
use serde_json::Value;

use crate::{
    core::{Cryptor, PubNubError},
    dx::subscribe::{
        result::{parse_presence, Envelope},
        types::{Message, TopicKind, Update},
    },
};

/// Update with information required to find its stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DemultiplexedUpdate {
    /// Base name of subscription through which update has been received.
    pub subscription: String,

    /// Whether update has been received through presence subscription.
    pub kind: TopicKind,

    /// Processed update.
    pub update: Update,
}

/// Split `envelope` into updates.
///
/// Each message is matched with the subscription name at the same position in
/// the envelope, or in `subscribed` when the envelope doesn't list names. If
/// there are fewer names than messages, the extra messages are attributed to
/// the first name.
///
/// The positional match is how the service reports a mixed batch without
/// names. It isn't reliable when more than one topic is subscribed, but it is
/// kept to stay compatible with what the service sends.
pub(crate) fn split(
    envelope: &Envelope,
    subscribed: &[String],
    cryptor: Option<&dyn Cryptor>,
) -> Vec<DemultiplexedUpdate> {
    let targets = if envelope.subscriptions.is_empty() {
        subscribed
    } else {
        envelope.subscriptions.as_slice()
    };

    envelope
        .messages
        .iter()
        .enumerate()
        .filter_map(|(idx, payload)| {
            let Some(target) = targets.get(idx).or_else(|| targets.first()) else {
                warn!("Dropping update #{idx}: no subscription to attribute it to");
                return None;
            };

            let (subscription, kind) = TopicKind::from_wire_name(target);
            let channel = envelope
                .channels
                .get(idx)
                .map(|channel| TopicKind::from_wire_name(channel).0)
                .unwrap_or(subscription);

            let update = match kind {
                TopicKind::Presence => {
                    Update::Presence(parse_presence(payload, channel, subscription))
                }
                TopicKind::Normal => {
                    let (data, decryption_error) = message_data(payload, cryptor);
                    if let Some(error) = &decryption_error {
                        warn!("Unable to decrypt message for '{channel}': {error}");
                    }

                    Update::Message(Message {
                        channel: channel.to_string(),
                        subscription: subscription.to_string(),
                        data,
                        timetoken: envelope.timetoken.clone(),
                        decryption_error,
                    })
                }
            };

            Some(DemultiplexedUpdate {
                subscription: subscription.to_string(),
                kind,
                update,
            })
        })
        .collect()
}

fn message_data(payload: &Value, cryptor: Option<&dyn Cryptor>) -> (Vec<u8>, Option<PubNubError>) {
    let raw = || serde_json::to_vec(payload).unwrap_or_default();

    let Some(cryptor) = cryptor else {
        return (raw(), None);
    };

    match decrypt(payload, cryptor) {
        Ok(data) => (data, None),
        Err(error) => (raw(), Some(error)),
    }
}

fn decrypt(payload: &Value, cryptor: &dyn Cryptor) -> Result<Vec<u8>, PubNubError> {
    let Value::String(ciphertext) = payload else {
        return Err(PubNubError::Decryption {
            details: "Encrypted payload should be a string".into(),
        });
    };

    let ciphertext =
        general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|err| PubNubError::Decryption {
                details: err.to_string(),
            })?;

    cryptor.decrypt(ciphertext)
}
