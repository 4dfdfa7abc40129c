//! # Tokio runtime
//!
//! This module contains [`RuntimeTokio`] type which runs the subscribe loop
//! on the [`tokio`] runtime.
//!
//! It requires the [`tokio` feature] to be enabled.
//!
//! [`tokio`]: https://docs.rs/tokio
//! [`tokio` feature]: ../index.html#features

use std::{future::Future, time::Duration};

use crate::core::Runtime;

/// Tokio-based `async` tasks runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeTokio;

#[async_trait::async_trait]
impl Runtime for RuntimeTokio {
    fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
    where
        R: Send + 'static,
    {
        tokio::spawn(future);
    }

    async fn sleep(self, delay: Duration) {
        tokio::time::sleep(delay).await
    }
}
