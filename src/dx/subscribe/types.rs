//! Subscription types module.

use crate::core::PubNubError;

/// Suffix which turns channel or group name into its presence companion.
pub const PRESENCE_SUFFIX: &str = "-pnpres";

/// What kind of entity subscription targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopicTarget {
    /// Single channel.
    Channel,

    /// Channel group which aggregates channels on the service side.
    ChannelGroup,
}

/// Kind of updates delivered through subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopicKind {
    /// Application messages.
    Normal,

    /// Join / leave / state change events of the base topic.
    Presence,
}

impl TopicKind {
    /// Name used on the wire for `name` of this kind.
    pub fn wire_name(&self, name: &str) -> String {
        match self {
            Self::Normal => name.to_string(),
            Self::Presence => format!("{name}{PRESENCE_SUFFIX}"),
        }
    }

    /// Split wire name into base name and kind.
    pub fn from_wire_name(name: &str) -> (&str, Self) {
        match name.strip_suffix(PRESENCE_SUFFIX) {
            Some(base) if !base.is_empty() => (base, Self::Presence),
            _ => (name, Self::Normal),
        }
    }
}

/// Subscription statuses.
///
/// Connection state changes and the outcome of subscribe / unsubscribe calls
/// are reported with these statuses. Channel and group names are wire names
/// (presence names carry [`PRESENCE_SUFFIX`]).
#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeStatus {
    /// Requested channels or groups already were part of subscription.
    AlreadySubscribed {
        /// Channels which already were subscribed.
        channels: Vec<String>,

        /// Channel groups which already were subscribed.
        channel_groups: Vec<String>,
    },

    /// Successfully connected and receiving real-time updates.
    ///
    /// Emitted once for the channels and groups which have been added since
    /// the previous successful round trip.
    Connected {
        /// Newly connected channels.
        channels: Vec<String>,

        /// Newly connected channel groups.
        channel_groups: Vec<String>,
    },

    /// Successfully reconnected after real-time updates receive has been
    /// interrupted by network issues.
    Reconnected,

    /// Real-time updates receive interrupted, subscribe loop will retry.
    Disconnected {
        /// Number of consecutive failed attempts.
        attempt: u8,

        /// Why the last attempt failed.
        reason: PubNubError,
    },

    /// Long-poll request didn't complete in time.
    TimedOut {
        /// Number of consecutive failed attempts.
        attempt: u8,
    },

    /// Channels and groups have been removed from subscription.
    Unsubscribed {
        /// Removed channels.
        channels: Vec<String>,

        /// Removed channel groups.
        channel_groups: Vec<String>,
    },

    /// Channels and groups requested for unsubscribe weren't subscribed.
    NotSubscribed {
        /// Unknown channels.
        channels: Vec<String>,

        /// Unknown channel groups.
        channel_groups: Vec<String>,
    },

    /// Subscription stopped because all retry attempts failed.
    ///
    /// Subscription has been cleared and should be started again.
    MaxRetryAborted {
        /// Channels which have been subscribed.
        channels: Vec<String>,

        /// Channel groups which have been subscribed.
        channel_groups: Vec<String>,
    },

    /// Service rejected subscribe request (for example access denied).
    ///
    /// Subscription has been cleared and should be started again.
    AccessDenied {
        /// Service response status code.
        status: u16,

        /// Rejection details.
        reason: PubNubError,
    },
}

/// Real-time update received for one of subscribed channels or groups.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Application message.
    Message(Message),

    /// Presence event.
    Presence(Presence),
}

impl Update {
    /// Name of channel for which update has been delivered.
    pub fn channel(&self) -> &str {
        match self {
            Self::Message(message) => &message.channel,
            Self::Presence(presence) => presence.channel(),
        }
    }

    /// Name of subscription (channel or group) through which update has been
    /// delivered.
    pub fn subscription(&self) -> &str {
        match self {
            Self::Message(message) => &message.subscription,
            Self::Presence(presence) => presence.subscription(),
        }
    }
}

/// Application message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Name of channel where message has been published.
    pub channel: String,

    /// Actual name of subscription through which message has been delivered
    /// (same as `channel` or name of channel group).
    pub subscription: String,

    /// Message payload.
    ///
    /// Serialized JSON as it has been received, or decrypted bytes when
    /// cryptor has been configured.
    pub data: Vec<u8>,

    /// Time token of the response which delivered message.
    pub timetoken: String,

    /// Decryption error details.
    ///
    /// Set when cryptor has been configured but wasn't able to decrypt
    /// [`data`]; in this case [`data`] contains the raw payload.
    ///
    /// [`data`]: Message::data
    pub decryption_error: Option<PubNubError>,
}

/// Presence update information.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Remote user `join` update.
    Join {
        /// Unix timestamp when the user joined the channel.
        timestamp: u64,

        /// Unique identification of the user which joined the channel.
        uuid: String,

        /// Name of channel to which user joined.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Current channel occupancy after user joined.
        occupancy: usize,
    },

    /// Remote user `leave` update.
    Leave {
        /// Unix timestamp when the user left the channel.
        timestamp: u64,

        /// Unique identification of the user which left the channel.
        uuid: String,

        /// Name of channel which user left.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Current channel occupancy after user left.
        occupancy: usize,
    },

    /// Remote user `timeout` update.
    Timeout {
        /// Unix timestamp when event has been triggered.
        timestamp: u64,

        /// Unique identification of the user which timed out.
        uuid: String,

        /// Name of channel where user timed out.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Current channel occupancy after user timed out.
        occupancy: usize,
    },

    /// Channel `interval` presence update.
    Interval {
        /// Unix timestamp when event has been triggered.
        timestamp: u64,

        /// Name of channel.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Current channel occupancy.
        occupancy: usize,

        /// Users which joined since previous interval update.
        join: Option<Vec<String>>,

        /// Users which left since previous interval update.
        leave: Option<Vec<String>>,

        /// Users which timed out since previous interval update.
        timeout: Option<Vec<String>>,
    },

    /// Remote user `state` change update.
    StateChange {
        /// Unix timestamp when event has been triggered.
        timestamp: u64,

        /// Unique identification of the user for which state has been changed.
        uuid: String,

        /// Name of channel.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Serialized user's state.
        data: Option<Vec<u8>>,
    },

    /// Presence event with unknown action.
    Unknown {
        /// Name of channel.
        channel: String,

        /// Actual name of subscription through which update has been
        /// delivered.
        subscription: String,

        /// Raw event payload.
        data: Vec<u8>,
    },
}

impl Presence {
    /// Name of channel for which presence event has been delivered.
    pub fn channel(&self) -> &str {
        match self {
            Self::Join { channel, .. }
            | Self::Leave { channel, .. }
            | Self::Timeout { channel, .. }
            | Self::Interval { channel, .. }
            | Self::StateChange { channel, .. }
            | Self::Unknown { channel, .. } => channel,
        }
    }

    /// Name of subscription through which presence event has been delivered.
    pub fn subscription(&self) -> &str {
        match self {
            Self::Join { subscription, .. }
            | Self::Leave { subscription, .. }
            | Self::Timeout { subscription, .. }
            | Self::Interval { subscription, .. }
            | Self::StateChange { subscription, .. }
            | Self::Unknown { subscription, .. } => subscription,
        }
    }
}

/// States of the subscribe loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubscribeLoopState {
    /// Nothing subscribed and loop not running.
    #[default]
    Idle,

    /// Long-poll request is in flight.
    Connecting,

    /// Received updates are processed.
    Delivering,

    /// Waiting before next attempt after failure.
    Backoff,

    /// Loop stopped because of retry budget exhaustion or service rejection.
    Aborted,
}
