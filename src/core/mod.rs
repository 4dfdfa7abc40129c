//! # PubNub Core
//!
//! Core functionality of the PubNub subscriber.
//!
//! The `core` module contains the contracts of external collaborators
//! ([`Transport`], [`Runtime`], [`Cryptor`]) and the building blocks used by
//! the subscribe loop (errors, retry policy and data streams).

#[doc(inline)]
pub use error::{PubNubError, TransportErrorKind};
pub mod error;

#[doc(inline)]
pub use transport::Transport;
pub mod transport;

#[doc(inline)]
pub use transport_request::{TransportMethod, TransportRequest};
pub mod transport_request;

#[doc(inline)]
pub use transport_response::TransportResponse;
pub mod transport_response;

#[doc(inline)]
pub use retry_policy::RequestRetryPolicy;
pub mod retry_policy;

#[doc(inline)]
pub use cryptor::Cryptor;
pub mod cryptor;

#[doc(inline)]
pub use runtime::Runtime;
pub mod runtime;

#[doc(inline)]
pub use data_stream::{DataStream, DataStreamRef};
pub mod data_stream;

pub(crate) mod utils;
