//! # Request retry policy
//!
//! This module contains the [`RequestRetryPolicy`] enum.
//! It is used to calculate delays between failed subscribe requests to the
//! [`PubNub API`] and to decide when the subscribe loop should give up.
//!
//! [`PubNub API`]: https://www.pubnub.com/docs

use rand::Rng;
use std::time::Duration;

/// Maximum share of calculated delay which can be added as random jitter.
const JITTER_RATIO: u32 = 10;

/// Request retry policy.
///
/// `max_retry` equal to `0` means that the number of attempts is unlimited.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestRetryPolicy {
    /// Requests shouldn't be tried again.
    None,

    /// Retry the request after linearly growing amount of time.
    Linear {
        /// Delay increment added with each failed attempt.
        delay: Duration,

        /// Maximum delay between failed retry attempts.
        max_delay: Duration,

        /// Number of times a request can be retried.
        max_retry: u8,
    },

    /// Retry the request using exponential amount of time.
    Exponential {
        /// Minimum delay between failed retry attempts.
        min_delay: Duration,

        /// Maximum delay between failed retry attempts.
        max_delay: Duration,

        /// Number of times a request can be retried.
        max_retry: u8,
    },
}

impl RequestRetryPolicy {
    /// Check whether the retry budget is exhausted after `attempt` failures.
    pub fn should_give_up(&self, attempt: u8) -> bool {
        match self {
            Self::None => attempt >= 1,
            Self::Linear { max_retry, .. } | Self::Exponential { max_retry, .. } => {
                *max_retry > 0 && attempt >= *max_retry
            }
        }
    }

    /// Delay before next request after `attempt` failures.
    ///
    /// Returns `None` when request shouldn't be retried at all.
    pub fn retry_delay(&self, attempt: u8) -> Option<Duration> {
        if self.should_give_up(attempt) {
            return None;
        }

        let attempt = attempt.max(1);
        match self {
            Self::None => None,
            Self::Linear {
                delay, max_delay, ..
            } => Some(delay.saturating_mul(attempt.into()).min(*max_delay)),
            Self::Exponential {
                min_delay,
                max_delay,
                ..
            } => {
                let exponent = u32::from(attempt - 1).min(31);
                let delay = min_delay.saturating_mul(1 << exponent).min(*max_delay);
                Some(with_jitter(delay).min(*max_delay))
            }
        }
    }
}

impl Default for RequestRetryPolicy {
    fn default() -> Self {
        Self::Exponential {
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(150),
            max_retry: 6,
        }
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let max_jitter = (delay / JITTER_RATIO).as_millis() as u64;
    if max_jitter == 0 {
        return delay;
    }

    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter))
}
