//! Developer experience module.
//!
//! This module contains the client and the subscribe API built on top of the
//! [`core`] types.
//!
//! [`core`]: crate::core

#[doc(inline)]
pub use pubnub_client::{PubNubClientInstance, PubNubConfig, PubNubConfigBuilder};
pub mod pubnub_client;

pub mod subscribe;
