//! # PubNub Subscriber
//!
//! Resumable long-poll subscription engine for PubNub channels and channel
//! groups.
//!
//! - Fully `async`/`await` ready.
//! - Modular, bring your own [`Transport`] and [`Runtime`].
//! - Multiplexes subscription polling for all channels and groups over a
//!   single long-poll request and demultiplexes received updates back to the
//!   streams of their subscriptions.
//! - Continues from the last received time token after failures and
//!   subscription changes.
//!
//! ## Features
//! - `reqwest` (default) - [`transport::TransportReqwest`] transport.
//! - `tokio` (default) - [`providers::futures_tokio::RuntimeTokio`] runtime.
//! - `crypto` - [`providers::crypto_aescbc::LegacyCryptor`] message
//!   decryption.
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use pubnub_subscriber::{PubNubClientInstance, PubNubConfigBuilder, Update};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), pubnub_subscriber::core::PubNubError> {
//! let client = PubNubClientInstance::with_reqwest_transport(
//!     PubNubConfigBuilder::default()
//!         .subscribe_key("demo")
//!         .user_id("user-123")
//!         .build()?,
//! );
//!
//! let subscription = client.subscribe().channels(["room1"]).execute()?;
//! let mut updates = subscription.stream();
//!
//! while let Some(Update::Message(message)) = updates.next().await {
//!     println!("{}: {}", message.channel, String::from_utf8_lossy(&message.data));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Transport`]: crate::core::Transport
//! [`Runtime`]: crate::core::Runtime

#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[doc(inline)]
pub use dx::subscribe::{
    Message, Presence, SubscribeLoopState, SubscribeStatus, Subscription, TopicKind,
    TopicTarget, Update,
};

#[doc(inline)]
pub use dx::pubnub_client::{PubNubClientInstance, PubNubConfig, PubNubConfigBuilder};

#[doc(inline)]
pub use crate::core::RequestRetryPolicy;

pub mod core;
pub mod dx;
pub mod providers;
pub mod transport;
