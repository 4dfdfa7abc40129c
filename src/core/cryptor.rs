//! Cryptor module
//!
//! This module contains the [`Cryptor`] trait which is used to implement
//! decryption of received messages (and encryption of published ones).

use crate::core::error::PubNubError;
use std::fmt::Debug;

/// This trait is used to encrypt and decrypt messages sent to the
/// [`PubNub API`].
///
/// The subscribe loop uses [`Cryptor::decrypt`] for regular messages when the
/// cryptor has been configured for the client. Presence events are never
/// encrypted.
///
/// When you use this trait to make your own crypto, make sure that other SDKs
/// use the same encryption and decryption algorithms.
///
/// # Examples
/// ```
/// use pubnub_subscriber::core::{Cryptor, PubNubError};
///
/// #[derive(Debug)]
/// struct MyCryptor;
///
/// impl Cryptor for MyCryptor {
///     fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
///         // Encrypt provided data here
///         Ok(vec![])
///     }
///
///     fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
///         // Decrypt provided data here
///         Ok(vec![])
///     }
/// }
/// ```
///
/// [`PubNub API`]: https://www.pubnub.com/docs
pub trait Cryptor: Debug + Send + Sync {
    /// Encrypt provided data.
    ///
    /// # Errors
    /// Should return an [`PubNubError::Encryption`] if provided data can't
    /// be encrypted or underlying cryptor misconfigured.
    fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError>;

    /// Decrypt provided data.
    ///
    /// # Errors
    /// Should return an [`PubNubError::Decryption`] if provided data can't
    /// be decrypted or underlying cryptor misconfigured.
    fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError>;
}
