//! # Runtime module
//!
//! This module contains the [`Runtime`] trait used by the subscribe loop to
//! spawn its task and to wait between retry attempts.

use std::{future::Future, time::Duration};

/// PubNub runtime trait.
///
/// This trait is used to spawn async tasks and to suspend them for some time.
/// The subscribe loop runs in a task spawned with this runtime.
///
/// # Examples
/// ```
/// use pubnub_subscriber::core::Runtime;
/// use std::{future::Future, time::Duration};
///
/// #[derive(Clone)]
/// struct MyRuntime;
///
/// #[async_trait::async_trait]
/// impl Runtime for MyRuntime {
///     fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
///     where
///         R: Send + 'static,
///     {
///         // spawn the Future
///         // e.g. tokio::spawn(future);
///     }
///
///     async fn sleep(self, delay: Duration) {
///         // e.g. tokio::time::sleep(delay).await
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Spawn a task.
    ///
    /// This method is used to spawn a task.
    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
    where
        R: Send + 'static;

    /// Put current task to "sleep".
    ///
    /// Sleep current task for specified amount of time.
    async fn sleep(self, delay: Duration);
}
