//! # Reqwest Transport Implementation
//!
//! This module contains the [`TransportReqwest`] struct.
//! It is used to send long-poll requests to the [`PubNub API`] using the
//! [`reqwest`] crate.
//!
//! It requires the [`reqwest` feature] to be enabled.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs
//! [`reqwest`]: https://docs.rs/reqwest
//! [`reqwest` feature]: ../index.html#features

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};
use std::collections::{BTreeMap, HashMap};

use crate::core::{
    PubNubError, Transport, TransportErrorKind, TransportMethod, TransportRequest,
    TransportResponse,
};

/// Default origin for requests.
pub const DEFAULT_HOSTNAME: &str = "https://ps.pndsn.com";

/// This struct is used to send requests to the [`PubNub API`] using the
/// [`reqwest`] crate.
///
/// Request timeout is taken from [`TransportRequest::timeout`]. Dropping the
/// future returned by [`Transport::send`] closes the connection.
///
/// [`PubNub API`]: https://www.pubnub.com/docs
/// [`reqwest`]: https://docs.rs/reqwest
#[derive(Clone, Debug)]
pub struct TransportReqwest {
    reqwest_client: reqwest::Client,

    /// The hostname to use for requests.
    /// It is used as the base URL for all requests.
    ///
    /// It defaults to `https://ps.pndsn.com`.
    /// # Examples
    /// ```
    /// use pubnub_subscriber::transport::TransportReqwest;
    ///
    /// let transport = {
    ///    let mut transport = TransportReqwest::default();
    ///    transport.hostname = "https://wherever.you.want.com".into();
    ///    transport
    /// };
    /// ```
    pub hostname: String,
}

#[async_trait::async_trait]
impl Transport for TransportReqwest {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, PubNubError> {
        let request_url = format!("{}{}", self.hostname, request.path_and_query());
        debug!("{} {request_url}", request.method);

        let headers = prepare_headers(&request.headers)?;
        let builder = match request.method {
            TransportMethod::Get => self.reqwest_client.get(request_url),
            TransportMethod::Post => self
                .reqwest_client
                .post(request_url)
                .body(request.body.unwrap_or_default()),
        };

        let result = builder
            .headers(headers)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = result.status();
        let response_headers = collect_headers(result.headers());
        result
            .bytes()
            .await
            .map_err(transport_error)
            .map(|body| create_result(status, response_headers, body.to_vec()))
    }
}

impl Default for TransportReqwest {
    fn default() -> Self {
        Self {
            reqwest_client: reqwest::Client::default(),
            hostname: DEFAULT_HOSTNAME.into(),
        }
    }
}

impl TransportReqwest {
    /// Create a new [`TransportReqwest`] instance.
    ///
    /// It provides a default [`reqwest`] client using
    /// [`reqwest::Client::default()`] and a default hostname of
    /// `https://ps.pndsn.com`.
    ///
    /// # Example
    /// ```
    /// use pubnub_subscriber::transport::TransportReqwest;
    ///
    /// let transport = TransportReqwest::new();
    /// ```
    ///
    /// [`reqwest`]: https://docs.rs/reqwest
    pub fn new() -> Self {
        Self::default()
    }

    /// Create transport which sends requests to `hostname`.
    pub fn with_hostname<S>(hostname: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }
}

fn prepare_headers(request_headers: &BTreeMap<String, String>) -> Result<HeaderMap, PubNubError> {
    request_headers
        .iter()
        .map(|(name, value)| {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| PubNubError::transport(err.to_string(), TransportErrorKind::Other))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| PubNubError::transport(err.to_string(), TransportErrorKind::Other))?;
            Ok((name, value))
        })
        .collect()
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}

fn transport_error(error: reqwest::Error) -> PubNubError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::HostUnreachable
    } else {
        TransportErrorKind::classify(&error.to_string())
    };

    PubNubError::transport(error.to_string(), kind)
}

fn create_result(
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
) -> TransportResponse {
    TransportResponse {
        status: status.as_u16(),
        headers,
        body: (!body.is_empty()).then_some(body),
    }
}
