//! Subscriptions' manager.
//!
//! This module contains manager which is responsible for tracking subscribed
//! channels and groups and for running the subscribe loop which receives
//! real-time updates for them.
//!
//! Only one subscribe loop (session) runs at a time. A session starts when the
//! first topic is registered and ends when the registry becomes empty, when
//! the retry budget is exhausted, or when the subscription is aborted.

use async_channel::Sender;
use log::{debug, info};
use spin::{Mutex, RwLock};
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    core::{DataStream, PubNubError, Runtime, Transport},
    dx::{
        pubnub_client::PubNubConfig,
        subscribe::{
            cursor::SubscribeCursor,
            demultiplexer::DemultiplexedUpdate,
            event_dispatcher::EventDispatcher,
            registry::{RegistrySnapshot, TopicRegistry},
            subscribe_loop::SubscribeLoop,
            subscription::Subscription,
            types::{SubscribeLoopState, SubscribeStatus, TopicTarget},
        },
    },
};

/// Signals sent to the running subscribe loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoopControl {
    /// Cancel in-flight request and start new one with fresh registry
    /// snapshot.
    ///
    /// With `reset` the next request starts from "now". When `timetoken` is
    /// set, the next request continues from it.
    Restart {
        timetoken: Option<String>,
        reset: bool,
    },

    /// Cancel in-flight request and stop the loop.
    Stop,
}

impl LoopControl {
    /// Combine two pending signals into one.
    pub fn merge(self, next: Self) -> Self {
        match (self, next) {
            (Self::Stop, _) | (_, Self::Stop) => Self::Stop,
            (
                Self::Restart {
                    timetoken: previous,
                    reset: previous_reset,
                },
                Self::Restart { timetoken, reset },
            ) => {
                if reset || timetoken.is_some() {
                    // Later position request replaces the earlier one.
                    Self::Restart { timetoken, reset }
                } else {
                    Self::Restart {
                        timetoken: previous,
                        reset: previous_reset,
                    }
                }
            }
        }
    }
}

/// Running subscribe loop handle.
#[derive(Debug)]
pub(crate) struct SessionHandle {
    /// Unique session identifier.
    pub id: u64,

    /// Channel used to interrupt the loop.
    control_tx: Sender<LoopControl>,
}

impl SessionHandle {
    fn signal(&self, control: LoopControl) {
        if self.control_tx.try_send(control).is_err() {
            debug!("Subscribe loop #{} already stopped", self.id);
        }
    }
}

/// Subscription engine.
///
/// Manager owns subscribed topics registry and the handle of running
/// subscribe loop. Registry mutations may be called from any thread, the loop
/// reads a consistent registry snapshot at the beginning of each iteration.
///
/// Lock order: `session` before `registry`.
#[derive(Debug)]
pub(crate) struct SubscriptionManager<T, R> {
    inner: Arc<SubscriptionManagerRef<T, R>>,
}

impl<T, R> Deref for SubscriptionManager<T, R> {
    type Target = SubscriptionManagerRef<T, R>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T, R> Clone for SubscriptionManager<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Subscription engine state.
#[derive(Debug)]
pub(crate) struct SubscriptionManagerRef<T, R> {
    /// Transport used to perform long-poll requests.
    pub(crate) transport: T,

    /// Runtime used to spawn the loop and wait between attempts.
    pub(crate) runtime: R,

    /// Client configuration.
    pub(crate) config: PubNubConfig,

    /// Subscribed channels and groups.
    registry: RwLock<TopicRegistry>,

    /// Currently running subscribe loop.
    session: Mutex<Option<SessionHandle>>,

    /// Statuses and updates dispatcher.
    pub(crate) dispatcher: EventDispatcher,

    /// Identifier for the next session.
    next_session_id: AtomicU64,

    /// Subscribe loop state.
    loop_state: RwLock<SubscribeLoopState>,

    /// The latest cursor published by the subscribe loop.
    cursor: RwLock<Option<SubscribeCursor>>,
}

impl<T, R> SubscriptionManager<T, R> {
    pub fn new(transport: T, runtime: R, config: PubNubConfig) -> Self {
        Self {
            inner: Arc::new(SubscriptionManagerRef {
                transport,
                runtime,
                dispatcher: EventDispatcher::new(config.sink_capacity),
                config,
                registry: Default::default(),
                session: Default::default(),
                next_session_id: AtomicU64::new(1),
                loop_state: Default::default(),
                cursor: Default::default(),
            }),
        }
    }

    /// Remove `channels` and `channel_groups` from subscription.
    ///
    /// Running subscribe loop restarts its request with the remaining topics
    /// or stops when nothing left.
    pub fn unsubscribe(
        &self,
        channels: &[String],
        channel_groups: &[String],
    ) -> Result<(), PubNubError> {
        validate_names(channels, channel_groups)?;

        let session = self.session.lock();
        let (channels, groups) = {
            let mut registry = self.registry.write();
            (
                registry.remove(channels, TopicTarget::Channel),
                registry.remove(channel_groups, TopicTarget::ChannelGroup),
            )
        };

        if channels.changed() || groups.changed() {
            self.dispatcher.handle_status(SubscribeStatus::Unsubscribed {
                channels: channels.removed,
                channel_groups: groups.removed,
            });

            if let Some(session) = session.as_ref() {
                session.signal(LoopControl::Restart {
                    timetoken: None,
                    reset: false,
                });
            }
        }

        if !channels.not_found.is_empty() || !groups.not_found.is_empty() {
            self.dispatcher.handle_status(SubscribeStatus::NotSubscribed {
                channels: channels.not_found,
                channel_groups: groups.not_found,
            });
        }

        Ok(())
    }

    /// Remove all topics from subscription.
    pub fn unsubscribe_all(&self) {
        let session = self.session.lock();
        let cleared = self.registry.write().clear();

        if cleared.topic_count == 0 {
            return;
        }

        self.dispatcher.handle_status(SubscribeStatus::Unsubscribed {
            channels: cleared.channels,
            channel_groups: cleared.channel_groups,
        });

        if let Some(session) = session.as_ref() {
            session.signal(LoopControl::Restart {
                timetoken: None,
                reset: false,
            });
        }
    }

    /// Stop subscribe loop and forget all subscribed topics.
    ///
    /// Safe to call when nothing is subscribed.
    pub fn abort(&self) {
        let mut session = self.session.lock();
        if let Some(session) = session.take() {
            info!("Aborting subscribe loop #{}", session.id);
            session.signal(LoopControl::Stop);
        }

        self.registry.write().clear();
        *self.loop_state.write() = SubscribeLoopState::Idle;
    }

    /// Abort subscription and close all status streams.
    pub fn terminate(&self) {
        self.abort();
        self.dispatcher.invalidate();
    }

    /// Create new status listener stream.
    pub fn status_stream(&self) -> DataStream<SubscribeStatus> {
        self.dispatcher.status_stream()
    }

    /// Current subscribe loop state.
    pub fn loop_state(&self) -> SubscribeLoopState {
        *self.loop_state.read()
    }

    /// The latest time token applied by the subscribe loop.
    pub fn timetoken(&self) -> Option<String> {
        self.cursor
            .read()
            .as_ref()
            .map(|cursor| cursor.timetoken().to_string())
    }

    /// Registry snapshot for session `id`.
    ///
    /// Returns `None` when session `id` isn't current anymore or when nothing
    /// is subscribed; in the latter case session is released and the loop
    /// should exit.
    pub(crate) fn session_snapshot(&self, id: u64) -> Option<RegistrySnapshot> {
        let mut session = self.session.lock();
        if !is_current(&session, id) {
            return None;
        }

        let snapshot = self.registry.read().snapshot();
        if snapshot.is_none() {
            debug!("Nothing subscribed, releasing subscribe loop #{id}");
            *session = None;
            *self.loop_state.write() = SubscribeLoopState::Idle;
        }

        snapshot
    }

    /// Release session `id` if it is still current.
    pub(crate) fn release_session(&self, id: u64) {
        let mut session = self.session.lock();
        if is_current(&session, id) {
            *session = None;
            *self.loop_state.write() = SubscribeLoopState::Idle;
        }
    }

    /// Stop session `id` because of unrecoverable failure.
    ///
    /// Registry is cleared and `status` built from what has been subscribed is
    /// emitted.
    pub(crate) fn terminate_session<F>(&self, id: u64, status: F)
    where
        F: FnOnce(RegistrySnapshot) -> SubscribeStatus,
    {
        let mut session = self.session.lock();
        if !is_current(&session, id) {
            return;
        }

        *session = None;
        let cleared = self.registry.write().clear();
        *self.loop_state.write() = SubscribeLoopState::Aborted;
        drop(session);

        self.dispatcher.handle_status(status(cleared));
    }

    /// Update loop state on behalf of session `id`.
    pub(crate) fn set_loop_state(&self, id: u64, state: SubscribeLoopState) {
        let session = self.session.lock();
        if is_current(&session, id) {
            *self.loop_state.write() = state;
        }
    }

    /// Emit `status` on behalf of session `id`.
    ///
    /// Statuses of a session which has been stopped or replaced are dropped.
    pub(crate) fn emit_status(&self, id: u64, status: SubscribeStatus) {
        let session = self.session.lock();
        if !is_current(&session, id) {
            debug!("Dropping status of stale subscribe loop #{id}: {status:?}");
            return;
        }
        drop(session);

        self.dispatcher.handle_status(status);
    }

    /// Emit `connected` status for topics which have been added since
    /// previous successful request.
    pub(crate) fn announce_connected(&self, id: u64) {
        let session = self.session.lock();
        if !is_current(&session, id) {
            return;
        }

        let (channels, channel_groups) = self.registry.write().mark_connected();
        drop(session);

        if !channels.is_empty() || !channel_groups.is_empty() {
            self.dispatcher.handle_status(SubscribeStatus::Connected {
                channels,
                channel_groups,
            });
        }
    }

    /// Deliver `updates` received by session `id` and publish its `cursor`.
    pub(crate) fn deliver(&self, id: u64, updates: Vec<DemultiplexedUpdate>, cursor: &SubscribeCursor) {
        let session = self.session.lock();
        if !is_current(&session, id) {
            debug!("Dropping updates received by stale subscribe loop #{id}");
            return;
        }

        self.dispatcher
            .dispatch_updates(&self.registry.read(), updates);
        *self.cursor.write() = Some(cursor.clone());
    }
}

impl<T, R> SubscriptionManager<T, R>
where
    T: Transport + 'static,
    R: Runtime + 'static,
{
    /// Add `channels` and `channel_groups` to subscription.
    ///
    /// Starts subscribe loop if it isn't running, or restarts the in-flight
    /// request when the set of topics changed. Previously received time token
    /// is kept unless `timetoken` is provided.
    pub fn subscribe(
        &self,
        channels: Vec<String>,
        channel_groups: Vec<String>,
        with_presence: bool,
        timetoken: Option<String>,
    ) -> Result<Subscription, PubNubError> {
        validate_names(&channels, &channel_groups)?;

        let sink = DataStream::with_queue_size(self.config.sink_capacity);
        let mut session = self.session.lock();
        let (added_channels, added_groups, was_empty, is_empty) = {
            let mut registry = self.registry.write();
            let was_empty = registry.is_empty();
            let added_channels = registry.add(&channels, TopicTarget::Channel, with_presence, &sink);
            let added_groups =
                registry.add(&channel_groups, TopicTarget::ChannelGroup, with_presence, &sink);
            (added_channels, added_groups, was_empty, registry.is_empty())
        };
        let changed = added_channels.changed || added_groups.changed;

        if !changed {
            // Nothing registered with this stream.
            sink.invalidate();
        }

        if !added_channels.already_present.is_empty() || !added_groups.already_present.is_empty() {
            self.dispatcher
                .handle_status(SubscribeStatus::AlreadySubscribed {
                    channels: added_channels.already_present,
                    channel_groups: added_groups.already_present,
                });
        }

        match session.as_ref() {
            Some(handle) if changed || timetoken.is_some() => {
                debug!("Subscription changed, restarting subscribe loop #{}", handle.id);
                // Topics registered after everything has been removed start
                // from "now" even if the loop hasn't noticed empty registry.
                let reset = was_empty && timetoken.is_none();
                handle.signal(LoopControl::Restart { timetoken, reset });
            }
            Some(_) => {}
            None if !is_empty => {
                let cursor = timetoken
                    .map(SubscribeCursor::with_timetoken)
                    .unwrap_or_default();
                self.start_session(&mut session, cursor);
            }
            None => {}
        }

        Ok(Subscription::new(channels, channel_groups, sink))
    }

    fn start_session(&self, slot: &mut Option<SessionHandle>, cursor: SubscribeCursor) {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (control_tx, control_rx) = async_channel::unbounded();

        info!(
            "Starting subscribe loop #{id} from time token '{}'",
            cursor.timetoken()
        );

        *slot = Some(SessionHandle { id, control_tx });
        *self.loop_state.write() = SubscribeLoopState::Connecting;
        *self.cursor.write() = Some(cursor.clone());

        let subscribe_loop = SubscribeLoop::new(id, self.clone(), control_rx, cursor);
        self.runtime.spawn(subscribe_loop.run());
    }
}

fn is_current(session: &Option<SessionHandle>, id: u64) -> bool {
    matches!(session, Some(handle) if handle.id == id)
}

fn validate_names(channels: &[String], channel_groups: &[String]) -> Result<(), PubNubError> {
    if channels.is_empty() && channel_groups.is_empty() {
        return Err(PubNubError::InvalidInput {
            details: "Either channels or channel groups should be provided".into(),
        });
    }

    if channels.iter().chain(channel_groups).any(|name| name.is_empty()) {
        return Err(PubNubError::InvalidInput {
            details: "Channel and channel group names can't be empty".into(),
        });
    }

    Ok(())
}
