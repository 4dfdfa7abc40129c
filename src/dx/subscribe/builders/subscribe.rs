//! # PubNub subscribe module.
//!
//! This module has all the builders for subscription to real-time updates from
//! a list of channels and channel groups.

use derive_builder::Builder;

use crate::{
    core::{PubNubError, Runtime, Transport},
    dx::subscribe::{subscription::Subscription, subscription_manager::SubscriptionManager},
};

/// Subscription request.
///
/// It should not be created directly, but via [`PubNubClientInstance::subscribe`]
/// and executed with [`SubscribeRequestBuilder::execute`].
///
/// [`PubNubClientInstance::subscribe`]: crate::PubNubClientInstance::subscribe
#[derive(Builder)]
#[builder(
    pattern = "owned",
    name = "SubscribeRequestBuilder",
    build_fn(private, name = "build_internal", validate = "Self::validate")
)]
pub struct SubscribeRequest<T, R> {
    /// Subscription engine which will receive updates.
    #[builder(field(vis = "pub(in crate::dx::subscribe)"), setter(custom))]
    pub(in crate::dx::subscribe) manager: SubscriptionManager<T, R>,

    /// Channels from which real-time updates should be received.
    #[builder(
        field(vis = "pub(in crate::dx::subscribe)"),
        setter(custom),
        default = "Vec::new()"
    )]
    pub(in crate::dx::subscribe) channels: Vec<String>,

    /// Channel groups from which real-time updates should be received.
    #[builder(
        field(vis = "pub(in crate::dx::subscribe)"),
        setter(custom),
        default = "Vec::new()"
    )]
    pub(in crate::dx::subscribe) channel_groups: Vec<String>,

    /// Whether presence events should be received as well.
    ///
    /// Presence companion of each channel and group is subscribed.
    #[builder(field(vis = "pub(in crate::dx::subscribe)"), default = "false")]
    pub(in crate::dx::subscribe) with_presence: bool,

    /// Time token from which subscription should continue.
    ///
    /// When subscription is already running, it continues from this time
    /// token with the next request.
    #[builder(
        field(vis = "pub(in crate::dx::subscribe)"),
        setter(strip_option, into),
        default = "None"
    )]
    pub(in crate::dx::subscribe) timetoken: Option<String>,
}

impl<T, R> SubscribeRequestBuilder<T, R> {
    /// Channels from which real-time updates should be received.
    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Channel groups from which real-time updates should be received.
    pub fn channel_groups<I, S>(mut self, channel_groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channel_groups = Some(channel_groups.into_iter().map(Into::into).collect());
        self
    }

    /// Validate user-provided data for request builder.
    ///
    /// Validator ensure that list of provided data is enough to build valid
    /// request instance.
    fn validate(&self) -> Result<(), String> {
        let groups_len = self.channel_groups.as_ref().map_or(0, Vec::len);
        let channels_len = self.channels.as_ref().map_or(0, Vec::len);

        if channels_len == 0 && groups_len == 0 {
            Err("Either channels or channel groups should be provided".into())
        } else {
            Ok(())
        }
    }
}

impl<T, R> SubscribeRequestBuilder<T, R>
where
    T: Transport + 'static,
    R: Runtime + 'static,
{
    /// Register channels and groups and start receiving updates.
    ///
    /// The call doesn't wait for the subscribe loop: connection state changes
    /// are reported through the client's status stream.
    pub fn execute(self) -> Result<Subscription, PubNubError> {
        let request = self
            .build_internal()
            .map_err(|err| PubNubError::InvalidInput {
                details: err.to_string(),
            })?;

        request.manager.subscribe(
            request.channels,
            request.channel_groups,
            request.with_presence,
            request.timetoken,
        )
    }
}
