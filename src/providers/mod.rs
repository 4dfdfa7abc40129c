//! # Providers module
//!
//! This module contains the providers that can be used by
//! [`PubNubClientInstance`].
//!
//! [`PubNubClientInstance`]: crate::PubNubClientInstance

#[cfg(feature = "tokio")]
pub mod futures_tokio;

#[cfg(feature = "crypto")]
pub mod crypto_aescbc;
