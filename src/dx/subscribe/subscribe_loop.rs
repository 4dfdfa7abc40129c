//! Subscribe loop.
//!
//! Loop repeatedly performs long-poll requests for subscribed topics, delivers
//! received updates and recovers from failures according to the configured
//! retry policy.

use async_channel::Receiver;
use futures::{
    future::{select, Either},
    pin_mut,
};
use log::{debug, error, info, warn};
use std::time::Duration;

use crate::{
    core::{PubNubError, Runtime, Transport, TransportErrorKind, TransportResponse},
    dx::subscribe::{
        cursor::SubscribeCursor,
        demultiplexer::split,
        registry::RegistrySnapshot,
        request::subscribe_request,
        result::{parse_response, SubscribeResponseBody},
        subscription_manager::{LoopControl, SubscriptionManager},
        types::{SubscribeLoopState, SubscribeStatus},
    },
};

/// What the loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// What completed first while waiting for the response.
enum Step {
    /// Control signal (`None` when the manager has gone).
    Control(Option<LoopControl>),

    /// Transport call completed.
    Response(Result<TransportResponse, PubNubError>),
}

/// Single subscription session.
///
/// Cursor and retry state are owned by the loop and never shared with other
/// sessions.
pub(crate) struct SubscribeLoop<T, R> {
    session_id: u64,
    manager: SubscriptionManager<T, R>,
    control_rx: Receiver<LoopControl>,
    cursor: SubscribeCursor,

    /// Number of consecutive failed attempts.
    attempt: u8,

    /// Registry state used for the previous request.
    last_snapshot: Option<RegistrySnapshot>,

    /// Whether cursor has been moved to user-provided time token.
    timetoken_restored: bool,
}

impl<T, R> SubscribeLoop<T, R>
where
    T: Transport + 'static,
    R: Runtime + 'static,
{
    pub fn new(
        session_id: u64,
        manager: SubscriptionManager<T, R>,
        control_rx: Receiver<LoopControl>,
        cursor: SubscribeCursor,
    ) -> Self {
        Self {
            session_id,
            manager,
            control_rx,
            cursor,
            attempt: 0,
            last_snapshot: None,
            timetoken_restored: false,
        }
    }

    /// Run the loop until nothing left to subscribe or it has been stopped.
    pub async fn run(mut self) {
        let id = self.session_id;
        debug!("Subscribe loop #{id} started");

        loop {
            if self.apply_control(None) == Flow::Exit {
                break;
            }

            let Some(snapshot) = self.manager.session_snapshot(id) else {
                break;
            };
            self.track_membership(&snapshot);

            let timetoken = self.cursor.next_request_timetoken();
            let request = subscribe_request(&self.manager.config, &snapshot, &timetoken);
            self.manager
                .set_loop_state(id, SubscribeLoopState::Connecting);
            debug!(
                "Subscribe loop #{id}: {} {}",
                request.method,
                request.path_and_query()
            );

            let step = {
                let response = self.manager.transport.send(request);
                let control = self.control_rx.recv();
                pin_mut!(response, control);

                match select(control, response).await {
                    Either::Left((control, _)) => Step::Control(control.ok()),
                    Either::Right((response, _)) => Step::Response(response),
                }
            };

            let flow = match step {
                Step::Control(control) => {
                    debug!("Subscribe loop #{id}: in-flight request cancelled");
                    self.apply_control(Some(control.unwrap_or(LoopControl::Stop)))
                }
                Step::Response(Err(error))
                    if error.transport_kind() == Some(TransportErrorKind::ConnectionAborted) =>
                {
                    debug!("Subscribe loop #{id}: connection aborted, restarting request");
                    Flow::Continue
                }
                Step::Response(Err(error)) => self.handle_failure(error).await,
                Step::Response(Ok(response)) => self.handle_response(response, &snapshot).await,
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.manager.release_session(id);
        debug!("Subscribe loop #{id} stopped");
    }

    async fn handle_response(
        &mut self,
        response: TransportResponse,
        snapshot: &RegistrySnapshot,
    ) -> Flow {
        let id = self.session_id;
        let status = response.status;

        if !response.is_success() {
            let error = PubNubError::api_error(status, Some(Box::new(response)));
            if status == 429 || status >= 500 {
                return self.handle_failure(error).await;
            }

            error!("Subscribe loop #{id}: request rejected: {error}");
            self.manager
                .terminate_session(id, |_| SubscribeStatus::AccessDenied {
                    status,
                    reason: error,
                });
            return Flow::Exit;
        }

        match parse_response(response.body.as_deref().unwrap_or_default()) {
            Err(error) => {
                warn!("Subscribe loop #{id}: malformed response: {error}");
                self.handle_failure(error).await
            }
            Ok(SubscribeResponseBody::Heartbeat) => {
                self.handle_success();
                debug!("Subscribe loop #{id}: idle heartbeat");

                let delay = self.manager.config.idle_heartbeat_delay;
                self.pause(delay).await
            }
            Ok(SubscribeResponseBody::Envelope(envelope)) => {
                self.handle_success();
                self.manager
                    .set_loop_state(id, SubscribeLoopState::Delivering);
                debug!(
                    "Subscribe loop #{id}: received {} updates, next time token '{}'",
                    envelope.messages.len(),
                    envelope.timetoken
                );

                let updates = split(
                    &envelope,
                    &snapshot.subscriptions(),
                    self.manager.config.cryptor.as_deref(),
                );
                self.cursor.advance(envelope.timetoken);
                self.manager.deliver(id, updates, &self.cursor);

                Flow::Continue
            }
        }
    }

    fn handle_success(&mut self) {
        if self.attempt > 0 {
            info!(
                "Subscribe loop #{} reconnected after {} failed attempts",
                self.session_id, self.attempt
            );
            self.attempt = 0;
            self.manager
                .emit_status(self.session_id, SubscribeStatus::Reconnected);
        }

        self.manager.announce_connected(self.session_id);
    }

    async fn handle_failure(&mut self, error: PubNubError) -> Flow {
        let id = self.session_id;
        let policy = self.manager.config.retry_policy.clone();
        self.attempt = self.attempt.saturating_add(1);
        let attempt = self.attempt;

        if policy.should_give_up(attempt) {
            error!("Subscribe loop #{id}: giving up after {attempt} failed attempts: {error}");
            self.manager.terminate_session(id, |cleared| {
                SubscribeStatus::MaxRetryAborted {
                    channels: cleared.channels,
                    channel_groups: cleared.channel_groups,
                }
            });
            return Flow::Exit;
        }

        warn!("Subscribe loop #{id}: attempt {attempt} failed: {error}");

        if error.transport_kind() == Some(TransportErrorKind::Timeout) {
            self.manager
                .emit_status(id, SubscribeStatus::TimedOut { attempt });
        }
        self.manager.emit_status(
            id,
            SubscribeStatus::Disconnected {
                attempt,
                reason: error,
            },
        );

        if !self.manager.config.resume_on_reconnect {
            self.cursor.reset();
        }

        self.manager.set_loop_state(id, SubscribeLoopState::Backoff);
        self.pause(policy.retry_delay(attempt).unwrap_or_default())
            .await
    }

    /// Wait for `delay` unless interrupted by control signal.
    async fn pause(&mut self, delay: Duration) -> Flow {
        if delay.is_zero() {
            return Flow::Continue;
        }

        let runtime = self.manager.runtime.clone();
        let control = {
            let sleep = runtime.sleep(delay);
            let control = self.control_rx.recv();
            pin_mut!(sleep, control);

            match select(control, sleep).await {
                Either::Left((control, _)) => Some(control.ok()),
                Either::Right(_) => None,
            }
        };

        match control {
            Some(control) => self.apply_control(Some(control.unwrap_or(LoopControl::Stop))),
            None => Flow::Continue,
        }
    }

    /// Apply `first` and all pending control signals.
    fn apply_control(&mut self, first: Option<LoopControl>) -> Flow {
        let mut signal = first;
        while let Ok(next) = self.control_rx.try_recv() {
            signal = Some(match signal {
                Some(signal) => signal.merge(next),
                None => next,
            });
        }

        match signal {
            None => Flow::Continue,
            Some(LoopControl::Stop) => {
                debug!("Subscribe loop #{}: stop requested", self.session_id);
                Flow::Exit
            }
            Some(LoopControl::Restart { timetoken, reset }) => {
                if reset && !self.cursor.is_reset_pending() {
                    debug!(
                        "Subscribe loop #{}: subscription started over, continue from now",
                        self.session_id
                    );
                    self.cursor.reset();
                }

                if let Some(timetoken) = timetoken {
                    debug!(
                        "Subscribe loop #{}: continue from time token '{timetoken}'",
                        self.session_id
                    );
                    self.cursor.restore(timetoken);
                    self.timetoken_restored = true;
                }
                Flow::Continue
            }
        }
    }

    /// Reset cursor on subscription change when resume isn't allowed.
    fn track_membership(&mut self, snapshot: &RegistrySnapshot) {
        let restored = std::mem::take(&mut self.timetoken_restored);

        if let Some(previous) = &self.last_snapshot {
            if !previous.same_membership(snapshot) {
                debug!(
                    "Subscribe loop #{}: subscription changed to {:?}",
                    self.session_id,
                    snapshot.subscriptions()
                );

                if !self.manager.config.resume_on_reconnect && !restored {
                    self.cursor.reset();
                }
            }
        }

        self.last_snapshot = Some(snapshot.clone());
    }
}
