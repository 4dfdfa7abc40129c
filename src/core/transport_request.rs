//! # Transport Request
//!
//! This module contains the [`TransportRequest`] struct and related types.
//!
//! Requests are prepared by the subscribe loop and handed over to the
//! [`Transport`] implementation which knows how to reach the PubNub network.
//!
//! [`Transport`]: ../transport/trait.Transport.html

use std::{collections::BTreeMap, fmt::Display, time::Duration};

/// Default time after which an in-flight request is considered as timed out.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The method to use for a request.
///
/// This enum represents the method to use for a request. It is used by the
/// [`TransportRequest`] struct.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub enum TransportMethod {
    /// Fetch resource.
    #[default]
    Get,

    /// Send data to the resource.
    Post,
}

impl Display for TransportMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransportMethod::Get => "GET",
                TransportMethod::Post => "POST",
            }
        )
    }
}

/// This struct represents a request to be sent to the PubNub API.
///
/// All fields are representing certain parts of the request that can be used
/// to prepare one. Path segments and query values are already percent-encoded.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TransportRequest {
    /// path to the resource
    pub path: String,

    /// query parameters to be sent with the request
    pub query_parameters: BTreeMap<String, String>,

    /// method to use for the request
    pub method: TransportMethod,

    /// headers to be sent with the request
    pub headers: BTreeMap<String, String>,

    /// body to be sent with the request
    pub body: Option<Vec<u8>>,

    /// How long transport should wait for the response.
    ///
    /// Long-poll requests use much bigger value than regular requests because
    /// the service holds the connection until there is something to deliver.
    pub timeout: Duration,
}

impl Default for TransportRequest {
    fn default() -> Self {
        Self {
            path: String::new(),
            query_parameters: BTreeMap::new(),
            method: TransportMethod::default(),
            headers: BTreeMap::new(),
            body: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransportRequest {
    /// Request path with query string appended.
    pub fn path_and_query(&self) -> String {
        if self.query_parameters.is_empty() {
            return self.path.clone();
        }

        let query = self
            .query_parameters
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<String>>()
            .join("&");

        format!("{}?{query}", self.path)
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn append_sorted_query_to_path() {
        let request = TransportRequest {
            path: "/subscribe/demo/room1/0/0".into(),
            query_parameters: BTreeMap::from([
                ("uuid".into(), "user".into()),
                ("heartbeat".into(), "300".into()),
            ]),
            ..Default::default()
        };

        assert_eq!(
            request.path_and_query(),
            "/subscribe/demo/room1/0/0?heartbeat=300&uuid=user"
        );
    }

    #[test]
    fn keep_path_without_query() {
        let request = TransportRequest {
            path: "/time/0".into(),
            ..Default::default()
        };

        assert_eq!(request.path_and_query(), "/time/0");
    }
}
