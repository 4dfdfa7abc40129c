//! # Data stream module
//!
//! This module contains the [`DataStream`] struct.

use futures::Stream;
use spin::RwLock;
use std::{
    collections::VecDeque,
    ops::Deref,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll, Waker},
};

/// Default maximum number of entries which can wait for the stream listener.
pub const DEFAULT_QUEUE_SIZE: usize = 100;

/// A generic data stream.
///
/// [`DataStream`] provides functionality which allows to `poll` any new data
/// which has been pushed into data queue.
///
/// The queue is bounded: when a listener can't keep up, the earliest entries
/// are dropped to make room for new ones, so the producer never waits for the
/// consumer. The number of dropped entries is available through
/// [`DataStreamRef::dropped`].
#[derive(Debug)]
pub struct DataStream<D> {
    inner: Arc<DataStreamRef<D>>,
}

impl<D> Deref for DataStream<D> {
    type Target = DataStreamRef<D>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<D> Clone for DataStream<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> Default for DataStream<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// A generic data stream reference.
///
/// This struct contains the actual data stream state.
/// It is wrapped in an `Arc` by [`DataStream`] and uses interior mutability for
/// its internal state.
///
/// Not intended to be used directly. Use [`DataStream`] instead.
#[derive(Debug)]
pub struct DataStreamRef<D> {
    /// Queue with data for stream listener.
    queue: RwLock<VecDeque<D>>,

    /// Maximum number of entries in [`queue`].
    capacity: usize,

    /// Number of entries dropped because of queue overflow.
    dropped: AtomicUsize,

    /// Data stream waker.
    ///
    /// Handler used each time when new data available for a stream listener.
    waker: RwLock<Option<Waker>>,

    /// Whether data stream still valid or not.
    is_valid: RwLock<bool>,
}

impl<D> DataStream<D> {
    /// Creates a new `DataStream` with a default queue size of 100.
    ///
    /// # Example
    ///
    /// ```
    /// use pubnub_subscriber::core::DataStream;
    ///
    /// let stream: DataStream<i32> = DataStream::new();
    /// ```
    pub fn new() -> DataStream<D> {
        Self::with_queue_size(DEFAULT_QUEUE_SIZE)
    }

    /// Creates a new `DataStream` with a specified queue size.
    ///
    /// The `size` parameter determines the maximum number of elements that can
    /// be stored in the queue before old elements are dropped to make room
    /// for new ones. Zero size is treated as a queue for one element.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pubnub_subscriber::core::DataStream;
    ///
    /// let data_stream = DataStream::<usize>::with_queue_size(10);
    /// ```
    pub fn with_queue_size(size: usize) -> DataStream<D> {
        Self::with_queue_data(VecDeque::new(), size)
    }

    /// Creates a new `DataStream` with a given queue `data` and `size`.
    ///
    /// Only the latest `size` entries of `data` are kept.
    ///
    /// # Examples
    /// ```
    /// use std::collections::VecDeque;
    /// use pubnub_subscriber::core::DataStream;
    ///
    /// let data: VecDeque<i32> = VecDeque::from(vec![1, 2, 3]);
    /// let stream: DataStream<i32> = DataStream::with_queue_data(data, 5);
    /// ```
    pub fn with_queue_data(mut data: VecDeque<D>, size: usize) -> DataStream<D> {
        let capacity = size.max(1);
        let overflow = data.len().saturating_sub(capacity);
        data.drain(..overflow);

        Self {
            inner: Arc::new(DataStreamRef {
                queue: RwLock::new(data),
                capacity,
                dropped: AtomicUsize::new(overflow),
                waker: RwLock::new(None),
                is_valid: RwLock::new(true),
            }),
        }
    }

    pub(crate) fn push_data(&self, data: D) {
        if !*self.is_valid.read() {
            return;
        }

        {
            let mut queue_data_slot = self.queue.write();

            // Dropping the earliest entry to prevent the queue from growing too large.
            if queue_data_slot.len() >= self.capacity {
                queue_data_slot.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }

            queue_data_slot.push_back(data);
        }

        self.wake_stream();
    }

    pub(crate) fn invalidate(&self) {
        {
            let mut is_valid = self.is_valid.write();
            *is_valid = false;
        }
        self.wake_stream();
    }

    /// Whether both handles refer to the same stream.
    pub(crate) fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether somebody besides this handle still holds the stream.
    pub(crate) fn is_shared(&self) -> bool {
        Arc::strong_count(&self.inner) > 1
    }

    fn wake_stream(&self) {
        if let Some(waker) = self.waker.write().take() {
            waker.wake();
        }
    }
}

impl<D> DataStreamRef<D> {
    /// Number of entries dropped because listener didn't keep up.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of entries waiting for the listener.
    pub fn len(&self) -> usize {
        self.queue.read().len()
    }

    /// Whether there is nothing waiting for the listener.
    pub fn is_empty(&self) -> bool {
        self.queue.read().is_empty()
    }

    /// Whether stream still may receive new data.
    pub fn is_valid(&self) -> bool {
        *self.is_valid.read()
    }
}

impl<D> Stream for DataStream<D> {
    type Item = D;

    fn poll_next(self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(data) = self.queue.write().pop_front() {
            return Poll::Ready(Some(data));
        }

        if !*self.is_valid.read() {
            return Poll::Ready(None);
        }

        let mut waker_slot = self.waker.write();
        *waker_slot = Some(ctx.waker().clone());
        drop(waker_slot);

        // Data could be pushed between the queue check and waker registration.
        if let Some(data) = self.queue.write().pop_front() {
            Poll::Ready(Some(data))
        } else if !*self.is_valid.read() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
