//! PubNub client module
//!
//! This module contains the [`PubNubClientInstance`] struct and its
//! configuration.
//! It's used to maintain subscription to the [`PubNub API`] real-time
//! network.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs

use derive_builder::Builder;
use log::info;
use std::{ops::Deref, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    core::{Cryptor, PubNubError, RequestRetryPolicy, Runtime, Transport},
    dx::subscribe::subscription_manager::SubscriptionManager,
};

#[cfg(all(feature = "reqwest", feature = "tokio"))]
use crate::{providers::futures_tokio::RuntimeTokio, transport::TransportReqwest};

/// Default long-poll request timeout.
///
/// Service holds subscribe request for up to 280 seconds.
pub const DEFAULT_SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(310);

/// Default pause before next request after idle heartbeat response.
pub const DEFAULT_IDLE_HEARTBEAT_DELAY: Duration = Duration::from_secs(1);

/// Default maximum number of entries queued for a stream listener.
pub const DEFAULT_SINK_CAPACITY: usize = crate::core::data_stream::DEFAULT_QUEUE_SIZE;

/// PubNub configuration
///
/// Configuration for [`PubNubClientInstance`].
///
/// # Examples
/// ```
/// use pubnub_subscriber::{PubNubConfigBuilder, RequestRetryPolicy};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), pubnub_subscriber::core::PubNubError> {
/// let config = PubNubConfigBuilder::default()
///     .subscribe_key("sub-c-abc123")
///     .user_id("my-user-id")
///     .retry_policy(RequestRetryPolicy::Linear {
///         delay: Duration::from_secs(1),
///         max_delay: Duration::from_secs(10),
///         max_retry: 5,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Debug, Clone)]
#[builder(
    pattern = "owned",
    build_fn(private, name = "build_internal", validate = "Self::validate")
)]
pub struct PubNubConfig {
    /// Subscribe key
    #[builder(setter(into))]
    pub(crate) subscribe_key: String,

    /// User ID
    ///
    /// Random identifier is generated when not provided.
    #[builder(setter(into), default = "Uuid::new_v4().to_string()")]
    pub(crate) user_id: String,

    /// How long long-poll request may stay in flight.
    #[builder(default = "DEFAULT_SUBSCRIBE_TIMEOUT")]
    pub(crate) subscribe_timeout: Duration,

    /// Presence heartbeat value (in seconds) announced with subscribe request.
    #[builder(setter(strip_option), default)]
    pub(crate) heartbeat: Option<u32>,

    /// Policy used to retry failed subscribe requests.
    #[builder(default)]
    pub(crate) retry_policy: RequestRetryPolicy,

    /// Whether subscription should continue from the last received time token
    /// after network issues.
    ///
    /// When disabled, updates published while client has been disconnected
    /// are skipped.
    #[builder(default = "true")]
    pub(crate) resume_on_reconnect: bool,

    /// Pause before next request after service responded without updates.
    #[builder(default = "DEFAULT_IDLE_HEARTBEAT_DELAY")]
    pub(crate) idle_heartbeat_delay: Duration,

    /// Maximum number of updates queued for each stream listener.
    ///
    /// The earliest updates are dropped when listener doesn't keep up.
    #[builder(default = "DEFAULT_SINK_CAPACITY")]
    pub(crate) sink_capacity: usize,

    /// Received messages decryptor.
    #[builder(setter(custom), default)]
    pub(crate) cryptor: Option<Arc<dyn Cryptor>>,
}

impl PubNubConfigBuilder {
    /// Data cryptor.
    ///
    /// Cryptor used to decrypt received messages. Messages which can't be
    /// decrypted are delivered as received, with decryption error attached.
    pub fn cryptor<C>(mut self, cryptor: C) -> Self
    where
        C: Cryptor + 'static,
    {
        self.cryptor = Some(Some(Arc::new(cryptor)));
        self
    }

    /// Build [`PubNubConfig`] from provided values.
    pub fn build(self) -> Result<PubNubConfig, PubNubError> {
        self.build_internal()
            .map_err(|err| PubNubError::ClientInitialization {
                details: err.to_string(),
            })
    }

    fn validate(&self) -> Result<(), String> {
        if matches!(&self.subscribe_key, Some(key) if key.is_empty()) {
            return Err("Subscribe key can't be empty".into());
        }

        if matches!(&self.user_id, Some(user_id) if user_id.is_empty()) {
            return Err("User ID can't be empty".into());
        }

        Ok(())
    }
}

/// PubNub client
///
/// Client for PubNub real-time network. The client is transport-layer-agnostic
/// and runtime-agnostic, so you can use any transport layer that implements
/// the [`Transport`] trait and any runtime which implements [`Runtime`].
///
/// Cloned instances share the same subscription. Subscription is stopped when
/// the last instance is dropped.
///
/// # Examples
/// ```no_run
/// use futures::StreamExt;
/// use pubnub_subscriber::{PubNubClientInstance, PubNubConfigBuilder};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), pubnub_subscriber::core::PubNubError> {
/// let client = PubNubClientInstance::with_reqwest_transport(
///     PubNubConfigBuilder::default()
///         .subscribe_key("demo")
///         .build()?,
/// );
///
/// let subscription = client.subscribe().channels(["room1"]).execute()?;
/// let mut updates = subscription.stream();
/// while let Some(update) = updates.next().await {
///     println!("{update:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PubNubClientInstance<T, R> {
    pub(crate) inner: Arc<PubNubClientRef<T, R>>,
}

impl<T, R> Deref for PubNubClientInstance<T, R> {
    type Target = PubNubClientRef<T, R>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T, R> Clone for PubNubClientInstance<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Client reference
///
/// This struct contains the actual client state.
/// It's wrapped in `Arc` by [`PubNubClientInstance`].
///
/// Not intended to be used directly. Use [`PubNubClientInstance`] instead.
#[derive(Debug)]
pub struct PubNubClientRef<T, R> {
    /// Client configuration.
    pub(crate) config: PubNubConfig,

    /// Subscription engine.
    pub(crate) subscription: SubscriptionManager<T, R>,
}

impl<T, R> PubNubClientRef<T, R> {
    /// Client configuration.
    pub fn config(&self) -> &PubNubConfig {
        &self.config
    }
}

impl<T, R> Drop for PubNubClientRef<T, R> {
    fn drop(&mut self) {
        self.subscription.terminate();
    }
}

impl<T, R> PubNubClientInstance<T, R>
where
    T: Transport + 'static,
    R: Runtime + 'static,
{
    /// Create client which uses provided `transport` and `runtime`.
    pub fn new(transport: T, runtime: R, config: PubNubConfig) -> Self {
        info!(
            "Creating PubNub client for '{}' with user id '{}'",
            config.subscribe_key, config.user_id
        );

        Self {
            inner: Arc::new(PubNubClientRef {
                subscription: SubscriptionManager::new(transport, runtime, config.clone()),
                config,
            }),
        }
    }
}

#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl PubNubClientInstance<TransportReqwest, RuntimeTokio> {
    /// Create client with [`reqwest`] transport and [`tokio`] runtime.
    ///
    /// [`reqwest`]: https://docs.rs/reqwest
    /// [`tokio`]: https://docs.rs/tokio
    pub fn with_reqwest_transport(config: PubNubConfig) -> Self {
        Self::new(TransportReqwest::new(), RuntimeTokio, config)
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn use_defaults_for_optional_fields() {
        let config = PubNubConfigBuilder::default()
            .subscribe_key("demo")
            .build()
            .expect("valid configuration");

        assert_eq!(config.subscribe_timeout, DEFAULT_SUBSCRIBE_TIMEOUT);
        assert_eq!(config.retry_policy, RequestRetryPolicy::default());
        assert!(config.resume_on_reconnect);
        assert!(config.heartbeat.is_none());
        assert!(config.cryptor.is_none());
        assert!(!config.user_id.is_empty());
    }

    #[test]
    fn generate_different_user_ids() {
        let first = PubNubConfigBuilder::default()
            .subscribe_key("demo")
            .build()
            .expect("valid configuration");
        let second = PubNubConfigBuilder::default()
            .subscribe_key("demo")
            .build()
            .expect("valid configuration");

        assert_ne!(first.user_id, second.user_id);
    }

    #[test]
    fn require_subscribe_key() {
        let result = PubNubConfigBuilder::default().user_id("user-1").build();

        assert!(matches!(
            result,
            Err(PubNubError::ClientInitialization { .. })
        ));
    }

    #[test]
    fn reject_empty_keys() {
        let empty_key = PubNubConfigBuilder::default().subscribe_key("").build();
        let empty_user = PubNubConfigBuilder::default()
            .subscribe_key("demo")
            .user_id("")
            .build();

        assert!(matches!(
            empty_key,
            Err(PubNubError::ClientInitialization { .. })
        ));
        assert!(matches!(
            empty_user,
            Err(PubNubError::ClientInitialization { .. })
        ));
    }
}
