//! Subscribed topics registry.
//!
//! Registry keeps the list of channels and channel groups the subscribe loop
//! should listen to, together with the stream where updates for each of them
//! should be delivered.

use crate::{
    core::DataStream,
    dx::subscribe::types::{TopicKind, TopicTarget, Update},
};

/// Registered subscription target.
#[derive(Debug)]
pub(crate) struct Topic {
    /// Base name of channel or group (without presence suffix).
    pub name: String,

    /// Whether topic is channel or channel group.
    pub target: TopicTarget,

    /// Whether topic delivers messages or presence events.
    pub kind: TopicKind,

    /// Where updates for topic should be delivered.
    pub sink: DataStream<Update>,

    /// Whether `connected` status has been emitted for topic.
    pub connected: bool,
}

impl Topic {
    fn wire_name(&self) -> String {
        self.kind.wire_name(&self.name)
    }
}

/// Result of topics registration.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct AddOutcome {
    /// Whether at least one new topic has been registered.
    pub changed: bool,

    /// Wire names of topics which already were registered.
    pub already_present: Vec<String>,
}

/// Result of topics removal.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct RemoveOutcome {
    /// Wire names of removed topics.
    pub removed: Vec<String>,

    /// Requested names which weren't registered.
    pub not_found: Vec<String>,
}

impl RemoveOutcome {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Consistent view on registry used to build a subscribe request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RegistrySnapshot {
    /// Channel wire names in registration order.
    pub channels: Vec<String>,

    /// Channel group wire names in registration order.
    pub channel_groups: Vec<String>,

    /// Number of registered topics.
    pub topic_count: usize,
}

impl RegistrySnapshot {
    /// All subscribed wire names: channels first, then channel groups.
    pub fn subscriptions(&self) -> Vec<String> {
        self.channels
            .iter()
            .chain(self.channel_groups.iter())
            .cloned()
            .collect()
    }

    /// Compare subscribed names ignoring registration order.
    pub fn same_membership(&self, other: &Self) -> bool {
        let sorted = |names: &[String]| {
            let mut names = names.to_vec();
            names.sort();
            names
        };

        sorted(&self.channels) == sorted(&other.channels)
            && sorted(&self.channel_groups) == sorted(&other.channel_groups)
    }
}

/// Channels and channel groups subscription registry.
#[derive(Debug, Default)]
pub(crate) struct TopicRegistry {
    topics: Vec<Topic>,
}

impl TopicRegistry {
    /// Register `names` of `target` type.
    ///
    /// When `with_presence` is set, presence companion of each name is
    /// registered as well. All newly registered topics deliver to `sink`.
    pub fn add<S>(
        &mut self,
        names: &[S],
        target: TopicTarget,
        with_presence: bool,
        sink: &DataStream<Update>,
    ) -> AddOutcome
    where
        S: AsRef<str>,
    {
        let kinds: &[TopicKind] = if with_presence {
            &[TopicKind::Normal, TopicKind::Presence]
        } else {
            &[TopicKind::Normal]
        };
        let mut outcome = AddOutcome::default();

        for name in names.iter().map(AsRef::as_ref) {
            // Explicitly requested presence name registers only presence topic.
            let (base, requested_kind) = TopicKind::from_wire_name(name);
            let kinds: &[TopicKind] = match requested_kind {
                TopicKind::Presence => &[TopicKind::Presence],
                TopicKind::Normal => kinds,
            };

            for kind in kinds {
                if self.position(base, target, *kind).is_some() {
                    outcome.already_present.push(kind.wire_name(base));
                    continue;
                }

                self.topics.push(Topic {
                    name: base.to_string(),
                    target,
                    kind: *kind,
                    sink: sink.clone(),
                    connected: false,
                });
                outcome.changed = true;
            }
        }

        outcome
    }

    /// Remove `names` of `target` type.
    ///
    /// Base name removes both normal and presence topics, presence wire name
    /// removes only presence topic. Streams which have no topics left are
    /// closed.
    pub fn remove<S>(&mut self, names: &[S], target: TopicTarget) -> RemoveOutcome
    where
        S: AsRef<str>,
    {
        let mut outcome = RemoveOutcome::default();
        let mut released = Vec::new();

        for name in names.iter().map(AsRef::as_ref) {
            let (base, requested_kind) = TopicKind::from_wire_name(name);
            let kinds: &[TopicKind] = match requested_kind {
                TopicKind::Presence => &[TopicKind::Presence],
                TopicKind::Normal => &[TopicKind::Normal, TopicKind::Presence],
            };
            let mut found = false;

            for kind in kinds {
                if let Some(idx) = self.position(base, target, *kind) {
                    let topic = self.topics.remove(idx);
                    outcome.removed.push(topic.wire_name());
                    released.push(topic.sink);
                    found = true;
                }
            }

            if !found {
                outcome.not_found.push(name.to_string());
            }
        }

        released
            .into_iter()
            .filter(|sink| !self.topics.iter().any(|t| t.sink.same_stream(sink)))
            .for_each(|sink| sink.invalidate());

        outcome
    }

    /// Remove all topics and close their streams.
    ///
    /// Returns what has been subscribed before the call.
    pub fn clear(&mut self) -> RegistrySnapshot {
        let snapshot = self.snapshot().unwrap_or_default();
        self.topics
            .drain(..)
            .for_each(|topic| topic.sink.invalidate());

        snapshot
    }

    /// Current registry state or `None` if nothing subscribed.
    pub fn snapshot(&self) -> Option<RegistrySnapshot> {
        if self.topics.is_empty() {
            return None;
        }

        let names = |target: TopicTarget| {
            self.topics
                .iter()
                .filter(|topic| topic.target == target)
                .map(Topic::wire_name)
                .collect::<Vec<String>>()
        };

        Some(RegistrySnapshot {
            channels: names(TopicTarget::Channel),
            channel_groups: names(TopicTarget::ChannelGroup),
            topic_count: self.topics.len(),
        })
    }

    /// Stream for updates delivered through subscription `name` of `kind`.
    ///
    /// Channels take precedence over channel groups with the same name.
    pub fn sink(&self, name: &str, kind: TopicKind) -> Option<DataStream<Update>> {
        [TopicTarget::Channel, TopicTarget::ChannelGroup]
            .into_iter()
            .find_map(|target| self.position(name, target, kind))
            .map(|idx| self.topics[idx].sink.clone())
    }

    /// Mark all topics as connected.
    ///
    /// Returns channel and channel group wire names which haven't been
    /// connected before.
    pub fn mark_connected(&mut self) -> (Vec<String>, Vec<String>) {
        let mut channels = Vec::new();
        let mut channel_groups = Vec::new();

        self.topics
            .iter_mut()
            .filter(|topic| !topic.connected)
            .for_each(|topic| {
                topic.connected = true;
                match topic.target {
                    TopicTarget::Channel => channels.push(topic.wire_name()),
                    TopicTarget::ChannelGroup => channel_groups.push(topic.wire_name()),
                }
            });

        (channels, channel_groups)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn position(&self, name: &str, target: TopicTarget, kind: TopicKind) -> Option<usize> {
        self.topics
            .iter()
            .position(|topic| topic.name == name && topic.target == target && topic.kind == kind)
    }
}
