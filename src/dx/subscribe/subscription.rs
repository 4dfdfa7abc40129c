//! Subscription module.
//!
//! This module contains the [`Subscription`] handle returned by subscribe
//! call.

use uuid::Uuid;

use crate::{core::DataStream, dx::subscribe::types::Update};

/// Subscription to a set of channels and channel groups.
///
/// Real-time updates for the channels and groups which have been added by
/// the subscribe call are delivered through [`Subscription::stream`]. Topics
/// which already were subscribed keep delivering to the stream of their
/// original subscription.
///
/// The stream completes when all topics added by the call have been
/// unsubscribed.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub(crate) id: String,

    /// Requested channels.
    pub(crate) channels: Vec<String>,

    /// Requested channel groups.
    pub(crate) channel_groups: Vec<String>,

    /// Updates stream.
    pub(crate) stream: DataStream<Update>,
}

impl Subscription {
    pub(crate) fn new(
        channels: Vec<String>,
        channel_groups: Vec<String>,
        stream: DataStream<Update>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channels,
            channel_groups,
            stream,
        }
    }

    /// Unique subscription identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Channels requested by subscribe call.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Channel groups requested by subscribe call.
    pub fn channel_groups(&self) -> &[String] {
        &self.channel_groups
    }

    /// Stream of real-time updates.
    pub fn stream(&self) -> DataStream<Update> {
        self.stream.clone()
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
