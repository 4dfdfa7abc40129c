//! Subscription time cursor.
//!
//! Cursor tracks the position in the real-time stream from which the next
//! long-poll request should continue.

/// Time token which means "start from now".
pub const INITIAL_TIMETOKEN: &str = "0";

/// Subscription position in the real-time stream.
///
/// Cursor holds the last time token received from the service. When a cursor
/// is reset, the next request is made with [`INITIAL_TIMETOKEN`] and the
/// token received in response to it replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeCursor {
    /// Last time token received from the service.
    timetoken: String,

    /// Whether next request should start from "now".
    reset_pending: bool,
}

impl SubscribeCursor {
    /// Create cursor which starts from "now".
    pub fn new() -> Self {
        Self {
            reset_pending: true,
            ..Self::with_timetoken(INITIAL_TIMETOKEN)
        }
    }

    /// Create cursor which continues from user-provided `timetoken`.
    pub fn with_timetoken<S>(timetoken: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            timetoken: timetoken.into(),
            reset_pending: false,
        }
    }

    /// Time token which should be sent with the next request.
    pub fn next_request_timetoken(&self) -> String {
        if self.reset_pending {
            INITIAL_TIMETOKEN.to_string()
        } else {
            self.timetoken.clone()
        }
    }

    /// Move cursor to the time token received from the service.
    pub fn advance<S>(&mut self, timetoken: S)
    where
        S: Into<String>,
    {
        self.timetoken = timetoken.into();
        self.reset_pending = false;
    }

    /// Make next request start from "now".
    pub fn reset(&mut self) {
        self.reset_pending = true;
    }

    /// Continue from the user-provided `timetoken` with the next request.
    pub fn restore<S>(&mut self, timetoken: S)
    where
        S: Into<String>,
    {
        self.advance(timetoken);
    }

    /// Last time token received from the service (or restored by user).
    pub fn timetoken(&self) -> &str {
        &self.timetoken
    }

    /// Whether next request will start from "now".
    pub fn is_reset_pending(&self) -> bool {
        self.reset_pending
    }
}

impl Default for SubscribeCursor {
    fn default() -> Self {
        Self::new()
    }
}
