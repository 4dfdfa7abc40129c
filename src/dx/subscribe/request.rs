//! Long-poll subscribe request construction.

use std::collections::BTreeMap;

use crate::{
    core::{
        utils::encoding::{join_url_encoded, url_encode, EMPTY_LIST_PLACEHOLDER},
        TransportMethod, TransportRequest,
    },
    dx::{pubnub_client::PubNubConfig, subscribe::registry::RegistrySnapshot},
};

/// Create long-poll request for `snapshot` which continues from `timetoken`.
pub(crate) fn subscribe_request(
    config: &PubNubConfig,
    snapshot: &RegistrySnapshot,
    timetoken: &str,
) -> TransportRequest {
    let channels =
        join_url_encoded(&snapshot.channels).unwrap_or_else(|| EMPTY_LIST_PLACEHOLDER.into());

    let mut query_parameters = BTreeMap::new();
    query_parameters.insert("uuid".to_string(), url_encode(config.user_id.as_bytes()));

    if let Some(groups) = join_url_encoded(&snapshot.channel_groups) {
        query_parameters.insert("channel-group".to_string(), groups);
    }

    if let Some(heartbeat) = config.heartbeat {
        query_parameters.insert("heartbeat".to_string(), heartbeat.to_string());
    }

    TransportRequest {
        path: format!(
            "/subscribe/{sub_key}/{channels}/0/{timetoken}",
            sub_key = url_encode(config.subscribe_key.as_bytes()),
        ),
        query_parameters,
        method: TransportMethod::Get,
        timeout: config.subscribe_timeout,
        ..Default::default()
    }
}
