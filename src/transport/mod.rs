//! # Transport Providers Module
//!
//! This module contains the transport providers that can be used by
//! [`PubNubClientInstance`].
//!
//! [`PubNubClientInstance`]: crate::PubNubClientInstance

#[cfg(feature = "reqwest")]
pub use self::reqwest::TransportReqwest;
#[cfg(feature = "reqwest")]
pub mod reqwest;
