//! # Transport module
//!
//! This module contains the [`Transport`] trait which is used by the subscribe
//! loop to perform long-poll requests.
//!
//! You can implement this trait for your own types, or use one of the provided
//! features to use a transport library.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs

use super::{transport_response::TransportResponse, PubNubError, TransportRequest};

/// This trait is used to send requests to the [`PubNub API`].
///
/// You can implement this trait for your own types, or use one of the provided
/// features to use a transport library.
///
/// Implementations should respect [`TransportRequest::timeout`] and report
/// failures as [`PubNubError::Transport`] with the most precise
/// [`TransportErrorKind`] they can tell. Dropping the returned future must
/// cancel the request (close the connection).
///
/// # Examples
/// ```
/// use pubnub_subscriber::core::{Transport, TransportRequest, TransportResponse, PubNubError};
///
/// struct MyTransport;
///
/// #[async_trait::async_trait]
/// impl Transport for MyTransport {
///    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError> {
///         // Send your request here
///
///         Ok(TransportResponse::default())
///    }
/// }
/// ```
///
/// [`PubNub API`]: https://www.pubnub.com/docs
/// [`TransportErrorKind`]: crate::core::TransportErrorKind
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a request to the [`PubNub API`].
    ///
    /// # Errors
    /// Should return an [`PubNubError::Transport`] if the request cannot be sent.
    ///
    /// [`PubNub API`]: https://www.pubnub.com/docs
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError>;
}
