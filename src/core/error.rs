//! # Error types
//!
//! This module contains the error types for the [`pubnub_subscriber`] crate.
//!
//! [`pubnub_subscriber`]: ../index.html

use snafu::Snafu;

use crate::core::TransportResponse;

/// PubNub error type
///
/// This type is used to represent errors that can occur while maintaining
/// subscription with the PubNub network.
/// It is used as the error type for the [`Result`] type.
///
/// # Examples
/// ```
/// use pubnub_subscriber::core::PubNubError;
///
/// fn foo() -> Result<(), PubNubError> {
///   Ok(())
/// }
///
/// foo().map_err(|e| match e {
///   PubNubError::Transport { .. } => println!("Transport error"),
///   PubNubError::Deserialization { .. } => println!("Malformed response"),
///   _ => println!("Other error"),
/// });
/// ```
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
#[derive(Snafu, Debug, Clone, PartialEq)]
pub enum PubNubError {
    /// this error is returned when the transport layer fails
    #[snafu(display("Transport error: {details}"))]
    Transport {
        /// error details
        details: String,

        /// Failure classification reported by transport provider.
        ///
        /// Providers which can't tell the exact reason should use
        /// [`TransportErrorKind::Other`] and [`PubNubError::transport_kind`]
        /// will try to classify failure using error `details`.
        kind: TransportErrorKind,

        /// Failed request HTTP response (if any).
        response: Option<Box<TransportResponse>>,
    },

    /// this error is returned when the deserialization of the response fails
    #[snafu(display("Deserialization error: {details}"))]
    Deserialization {
        /// error details
        details: String,
    },

    /// this error is returned when the crypto provider fails to encrypt data
    #[snafu(display("Data encryption error: {details}"))]
    Encryption {
        /// error details
        details: String,
    },

    /// this error is returned when the crypto provider fails to decrypt data
    #[snafu(display("Data decryption error: {details}"))]
    Decryption {
        /// error details
        details: String,
    },

    /// this error is returned when the crypto provider can't be configured
    #[snafu(display("Crypto initialization error: {details}"))]
    CryptoInitialization {
        /// error details
        details: String,
    },

    /// this error is returned when a request has been called with malformed
    /// arguments (for example an empty list of channels)
    #[snafu(display("Invalid input error: {details}"))]
    InvalidInput {
        /// error details
        details: String,
    },

    /// this error is returned when the initialization of client fails
    #[snafu(display("Client initialization error: {details}"))]
    ClientInitialization {
        /// error details
        details: String,
    },

    /// this error is returned when the PubNub network responded with a non
    /// successful status code
    #[snafu(display("REST API error: {message}"))]
    API {
        /// Operation status (HTTP) code.
        status: u16,

        /// A message explaining what went wrong.
        message: String,

        /// Service response.
        response: Option<Box<TransportResponse>>,
    },
}

/// Classification of transport-level failures.
///
/// The subscribe loop decides whether a failed round trip should be retried
/// with backoff or restarted right away using this classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Request didn't complete in time.
    Timeout,

    /// Connection has been closed on purpose (request cancelled).
    ConnectionAborted,

    /// Remote host can't be resolved or reached.
    HostUnreachable,

    /// Any other transport failure (connection reset, TLS issues, etc.).
    Other,
}

impl TransportErrorKind {
    /// Classify transport failure by its textual description.
    ///
    /// Used for providers which can't report typed failure reason.
    pub fn classify(details: &str) -> Self {
        let details = details.to_lowercase();

        if ["timed out", "timeout", "deadline has elapsed"]
            .iter()
            .any(|needle| details.contains(needle))
        {
            Self::Timeout
        } else if ["connection aborted", "operation canceled", "cancelled", "canceled"]
            .iter()
            .any(|needle| details.contains(needle))
        {
            Self::ConnectionAborted
        } else if [
            "dns error",
            "failed to lookup",
            "no such host",
            "host unreachable",
            "network is unreachable",
            "connection refused",
        ]
        .iter()
        .any(|needle| details.contains(needle))
        {
            Self::HostUnreachable
        } else {
            Self::Other
        }
    }
}

impl PubNubError {
    /// Create transport error with known failure `kind`.
    pub fn transport<S>(details: S, kind: TransportErrorKind) -> Self
    where
        S: Into<String>,
    {
        Self::Transport {
            details: details.into(),
            kind,
            response: None,
        }
    }

    /// Create API error from service response.
    pub(crate) fn api_error(status: u16, response: Option<Box<TransportResponse>>) -> Self {
        let message = response
            .as_ref()
            .and_then(|response| response.body.as_ref())
            .map(|body| String::from_utf8_lossy(body).to_string())
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| format!("Unexpected response status: {status}"));

        Self::API {
            status,
            message,
            response,
        }
    }

    /// Transport failure classification.
    ///
    /// Returns `None` for errors which didn't happen on the transport level.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport {
                kind: TransportErrorKind::Other,
                details,
                ..
            } => Some(TransportErrorKind::classify(details)),
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Retrieve attached service response.
    pub fn transport_response(&self) -> Option<&TransportResponse> {
        match self {
            Self::Transport {
                response: Some(response),
                ..
            }
            | Self::API {
                response: Some(response),
                ..
            } => Some(response),
            _ => None,
        }
    }
}
