//! # Event dispatcher module
//!
//! This module contains the [`EventDispatcher`] type, which is used by the
//! subscription manager and subscribe loop to deliver statuses to status
//! listeners and updates to the streams of subscribed topics.

use log::debug;
use spin::RwLock;
use std::collections::VecDeque;

use crate::{
    core::DataStream,
    dx::subscribe::{
        demultiplexer::DemultiplexedUpdate, registry::TopicRegistry, types::SubscribeStatus,
    },
};

#[derive(Debug)]
pub(crate) struct EventDispatcher {
    /// A collection of data streams for connection status change events.
    ///
    /// This struct holds a vector of `DataStream<SubscribeStatus>` instances,
    /// which provide a way to handle connection status change events in a
    /// streaming fashion.
    status_streams: RwLock<Vec<DataStream<SubscribeStatus>>>,

    /// Statuses received before first listener has been attached.
    pending_statuses: RwLock<VecDeque<SubscribeStatus>>,

    /// Maximum number of entries in each queue.
    capacity: usize,
}

impl EventDispatcher {
    /// Create event dispatcher instance.
    ///
    /// Internal status queue prevents situations when statuses have been
    /// emitted before any listener has been attached (as soon as there is at
    /// least one listener, the queue won't be filled). The queue keeps only
    /// the latest `capacity` statuses.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            status_streams: Default::default(),
            pending_statuses: Default::default(),
            capacity: capacity.max(1),
        }
    }

    /// Create new status listener stream.
    ///
    /// The first listener receives statuses which have been queued before it
    /// has been created.
    pub fn status_stream(&self) -> DataStream<SubscribeStatus> {
        let mut streams = self.status_streams.write();
        let pending = std::mem::take(&mut *self.pending_statuses.write());
        let stream = DataStream::with_queue_data(pending, self.capacity);
        streams.push(stream.clone());

        stream
    }

    /// Dispatch connection status change to all status listeners.
    pub fn handle_status(&self, status: SubscribeStatus) {
        debug!("Subscription status: {status:?}");

        let mut streams = self.status_streams.write();
        // Listeners which have been dropped.
        streams.retain(DataStream::is_shared);

        if streams.is_empty() {
            let mut pending = self.pending_statuses.write();
            if pending.len() >= self.capacity {
                pending.pop_front();
            }
            pending.push_back(status);
            return;
        }

        streams
            .iter()
            .for_each(|stream| stream.push_data(status.clone()));
    }

    /// Deliver `updates` to the streams of topics through which they have been
    /// received.
    ///
    /// Updates for topics which have been removed in the meantime are dropped.
    pub fn dispatch_updates(&self, registry: &TopicRegistry, updates: Vec<DemultiplexedUpdate>) {
        updates.into_iter().for_each(|update| {
            match registry.sink(&update.subscription, update.kind) {
                Some(sink) => sink.push_data(update.update),
                None => debug!(
                    "Dropping update for '{}' ({:?}): not subscribed anymore",
                    update.subscription, update.kind
                ),
            }
        });
    }

    /// Close all status listener streams.
    pub fn invalidate(&self) {
        self.status_streams
            .write()
            .drain(..)
            .for_each(|stream| stream.invalidate());
    }
}
