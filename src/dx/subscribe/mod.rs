//! Subscribe module.
//!
//! Allows to subscribe to real-time updates from channels and groups.
//!
//! Subscription is maintained by a single long-poll loop per client. Channels
//! and groups can be added or removed at any time: the in-flight request is
//! cancelled and the loop continues with the updated list from the last
//! received time token.

use crate::{
    core::{DataStream, PubNubError, Runtime, Transport},
    dx::pubnub_client::PubNubClientInstance,
};

#[doc(inline)]
pub use builders::*;
pub mod builders;

#[doc(inline)]
pub use subscription::Subscription;
mod subscription;

#[doc(inline)]
pub use types::*;
pub mod types;

pub(crate) mod cursor;
pub(crate) mod demultiplexer;
pub(crate) mod event_dispatcher;
pub(crate) mod registry;
pub(crate) mod request;
pub(crate) mod result;
pub(crate) mod subscribe_loop;
pub(crate) mod subscription_manager;

impl<T, R> PubNubClientInstance<T, R>
where
    T: Transport + 'static,
    R: Runtime + 'static,
{
    /// Create subscribe request builder.
    ///
    /// # Example
    /// ```no_run
    /// use pubnub_subscriber::{PubNubClientInstance, PubNubConfigBuilder};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), pubnub_subscriber::core::PubNubError> {
    /// let client = PubNubClientInstance::with_reqwest_transport(
    ///     PubNubConfigBuilder::default().subscribe_key("demo").build()?,
    /// );
    ///
    /// let subscription = client
    ///     .subscribe()
    ///     .channels(["room1", "room2"])
    ///     .channel_groups(["news"])
    ///     .with_presence(true)
    ///     .execute()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> SubscribeRequestBuilder<T, R> {
        SubscribeRequestBuilder {
            manager: Some(self.subscription.clone()),
            ..Default::default()
        }
    }
}

impl<T, R> PubNubClientInstance<T, R> {
    /// Stop receiving updates from `channels` and `channel_groups`.
    ///
    /// Presence companion is removed together with the base name. Names
    /// which weren't subscribed are reported with
    /// [`SubscribeStatus::NotSubscribed`].
    pub fn unsubscribe<S>(&self, channels: &[S], channel_groups: &[S]) -> Result<(), PubNubError>
    where
        S: AsRef<str>,
    {
        let names = |names: &[S]| {
            names
                .iter()
                .map(|name| name.as_ref().to_string())
                .collect::<Vec<String>>()
        };

        self.subscription
            .unsubscribe(&names(channels), &names(channel_groups))
    }

    /// Stop receiving updates from all channels and groups.
    pub fn unsubscribe_all(&self) {
        self.subscription.unsubscribe_all();
    }

    /// Cancel in-flight request, forget all subscribed channels and groups
    /// and stop the subscribe loop.
    ///
    /// No statuses are emitted. Calling it when nothing is subscribed is a
    /// no-op.
    pub fn abort(&self) {
        self.subscription.abort();
    }

    /// Stream of subscription status changes.
    ///
    /// The first created stream receives statuses which have been emitted
    /// before it.
    pub fn status_stream(&self) -> DataStream<SubscribeStatus> {
        self.subscription.status_stream()
    }

    /// Current state of the subscribe loop.
    pub fn subscribe_loop_state(&self) -> SubscribeLoopState {
        self.subscription.loop_state()
    }

    /// The latest time token received by the subscribe loop.
    pub fn timetoken(&self) -> Option<String> {
        self.subscription.timetoken()
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::{
        core::{RequestRetryPolicy, TransportErrorKind, TransportRequest, TransportResponse},
        dx::pubnub_client::PubNubConfigBuilder,
    };
    use futures::StreamExt;
    use spin::Mutex;
    use std::{collections::VecDeque, future::Future, sync::Arc, time::Duration};

    /// Scripted transport reply.
    #[derive(Debug, Clone)]
    enum Reply {
        Body(&'static str),
        Status(u16),
        Fail(TransportErrorKind),
    }

    /// Transport which replies with scripted responses and hangs when script
    /// is over.
    #[derive(Debug, Clone, Default)]
    struct MockTransport {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        requests: Arc<Mutex<Vec<TransportRequest>>>,
    }

    impl MockTransport {
        fn with_replies(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Default::default()
            }
        }

        fn paths(&self) -> Vec<String> {
            self.requests
                .lock()
                .iter()
                .map(|request| request.path.clone())
                .collect()
        }

        fn requests_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(&self, req: TransportRequest) -> Result<TransportResponse, PubNubError> {
            self.requests.lock().push(req);
            let reply = self.replies.lock().pop_front();

            match reply {
                Some(Reply::Body(body)) => Ok(TransportResponse {
                    status: 200,
                    body: Some(body.as_bytes().to_vec()),
                    ..Default::default()
                }),
                Some(Reply::Status(status)) => Ok(TransportResponse {
                    status,
                    body: Some(br#"{"message":"Forbidden","status":403}"#.to_vec()),
                    ..Default::default()
                }),
                Some(Reply::Fail(kind)) => Err(PubNubError::transport("request failed", kind)),
                None => futures::future::pending().await,
            }
        }
    }

    #[derive(Debug, Clone)]
    struct MockRuntime;

    #[async_trait::async_trait]
    impl Runtime for MockRuntime {
        fn spawn<R>(&self, future: impl Future<Output = R> + Send + 'static)
        where
            R: Send + 'static,
        {
            tokio::spawn(future);
        }

        async fn sleep(self, delay: Duration) {
            tokio::time::sleep(delay).await
        }
    }

    type Client = PubNubClientInstance<MockTransport, MockRuntime>;

    fn config() -> PubNubConfigBuilder {
        PubNubConfigBuilder::default()
            .subscribe_key("demo")
            .user_id("tester")
            .idle_heartbeat_delay(Duration::from_millis(5))
            .retry_policy(RequestRetryPolicy::Linear {
                delay: Duration::from_millis(2),
                max_delay: Duration::from_millis(2),
                max_retry: 3,
            })
    }

    fn client_with(replies: Vec<Reply>, config: PubNubConfigBuilder) -> (Client, MockTransport) {
        let _ = env_logger::builder().is_test(true).try_init();
        let transport = MockTransport::with_replies(replies);
        let config = config.build().expect("valid configuration");

        (
            PubNubClientInstance::new(transport.clone(), MockRuntime, config),
            transport,
        )
    }

    fn client(replies: Vec<Reply>) -> (Client, MockTransport) {
        client_with(replies, config())
    }

    async fn wait_until<F>(condition: F)
    where
        F: Fn() -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition should be met in time");
    }

    async fn next<S>(stream: &mut DataStream<S>) -> Option<S> {
        tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("stream should produce value in time")
    }

    fn message_data(update: Option<Update>) -> Vec<u8> {
        match update {
            Some(Update::Message(message)) => message.data,
            other => panic!("message expected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_and_deliver_message() {
        let (client, transport) = client(vec![
            Reply::Body(r#"[[],"1500"]"#),
            Reply::Body(r#"[[{"text":"hi"}],"1501","room1"]"#),
        ]);
        let mut statuses = client.status_stream();

        let subscription = client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        let mut updates = subscription.stream();

        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected {
                channels: vec!["room1".into()],
                channel_groups: vec![],
            })
        );
        assert_eq!(message_data(next(&mut updates).await), br#"{"text":"hi"}"#);

        wait_until(|| transport.requests_count() == 3).await;
        assert_eq!(client.timetoken(), Some("1501".into()));
        assert_eq!(
            transport.paths(),
            vec![
                "/subscribe/demo/room1/0/0",
                "/subscribe/demo/room1/0/1500",
                "/subscribe/demo/room1/0/1501",
            ]
        );
        assert!(statuses.is_empty());
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn not_restart_on_repeated_subscribe() {
        let (client, transport) = client(vec![]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 1).await;

        let repeated = client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::AlreadySubscribed {
                channels: vec!["room1".into()],
                channel_groups: vec![],
            })
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.requests_count(), 1);
        assert_eq!(next(&mut repeated.stream()).await, None);
    }

    #[tokio::test]
    async fn keep_timetoken_when_topic_added() {
        let (client, transport) = client(vec![Reply::Body(r#"[[],"1500"]"#)]);

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 2).await;

        client
            .subscribe()
            .channels(["room2"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 3).await;

        assert_eq!(transport.paths()[2], "/subscribe/demo/room1,room2/0/1500");
    }

    #[tokio::test]
    async fn reset_timetoken_on_change_when_resume_disabled() {
        let (client, transport) = client_with(
            vec![Reply::Body(r#"[[],"1500"]"#)],
            config().resume_on_reconnect(false),
        );

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 2).await;

        client
            .subscribe()
            .channels(["room2"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 3).await;

        assert_eq!(transport.paths()[2], "/subscribe/demo/room1,room2/0/0");
    }

    #[tokio::test]
    async fn give_up_when_retry_budget_exhausted() {
        let (client, transport) = client(vec![
            Reply::Fail(TransportErrorKind::Timeout),
            Reply::Fail(TransportErrorKind::Timeout),
            Reply::Fail(TransportErrorKind::Timeout),
        ]);
        let mut statuses = client.status_stream();

        let subscription = client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        for attempt in 1..=2 {
            assert_eq!(
                next(&mut statuses).await,
                Some(SubscribeStatus::TimedOut { attempt })
            );
            assert!(matches!(
                next(&mut statuses).await,
                Some(SubscribeStatus::Disconnected { attempt: reported, .. }) if reported == attempt
            ));
        }
        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::MaxRetryAborted {
                channels: vec!["room1".into()],
                channel_groups: vec![],
            })
        );

        assert_eq!(next(&mut subscription.stream()).await, None);
        assert_eq!(client.subscribe_loop_state(), SubscribeLoopState::Aborted);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.requests_count(), 3);
        assert!(statuses.is_empty());
    }

    #[tokio::test]
    async fn resume_from_same_timetoken_after_failure() {
        let (client, transport) = client(vec![
            Reply::Body(r#"[[],"1500"]"#),
            Reply::Fail(TransportErrorKind::HostUnreachable),
            Reply::Body(r#"[[],"1600"]"#),
        ]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected { .. })
        ));
        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Disconnected { attempt: 1, .. })
        ));
        assert_eq!(next(&mut statuses).await, Some(SubscribeStatus::Reconnected));

        wait_until(|| transport.requests_count() == 4).await;
        assert_eq!(
            transport.paths()[1..],
            [
                "/subscribe/demo/room1/0/1500",
                "/subscribe/demo/room1/0/1500",
                "/subscribe/demo/room1/0/1600",
            ]
        );
    }

    #[tokio::test]
    async fn start_from_now_after_failure_when_resume_disabled() {
        let (client, transport) = client_with(
            vec![
                Reply::Body(r#"[[],"1500"]"#),
                Reply::Fail(TransportErrorKind::Other),
            ],
            config().resume_on_reconnect(false),
        );

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 3).await;

        assert_eq!(transport.paths()[2], "/subscribe/demo/room1/0/0");
    }

    #[tokio::test]
    async fn retry_malformed_response() {
        let (client, transport) = client(vec![Reply::Body("<html>Bad gateway</html>")]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Disconnected {
                attempt: 1,
                reason: PubNubError::Deserialization { .. }
            })
        ));
        wait_until(|| transport.requests_count() == 2).await;
        assert_eq!(transport.paths()[1], "/subscribe/demo/room1/0/0");
    }

    #[tokio::test]
    async fn treat_empty_response_as_heartbeat() {
        let (client, transport) = client(vec![Reply::Body("[]")]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected { .. })
        ));
        wait_until(|| transport.requests_count() == 2).await;
        assert_eq!(transport.paths()[1], "/subscribe/demo/room1/0/0");
    }

    #[tokio::test]
    async fn restart_without_backoff_when_connection_aborted() {
        let (client, transport) = client(vec![
            Reply::Fail(TransportErrorKind::ConnectionAborted),
            Reply::Body(r#"[[],"1500"]"#),
        ]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected { .. })
        ));
        wait_until(|| transport.requests_count() == 3).await;
    }

    #[tokio::test]
    async fn stop_on_rejected_request() {
        let (client, transport) = client(vec![Reply::Status(403)]);
        let mut statuses = client.status_stream();

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::AccessDenied { status: 403, .. })
        ));
        assert_eq!(client.subscribe_loop_state(), SubscribeLoopState::Aborted);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.requests_count(), 1);
    }

    #[tokio::test]
    async fn attribute_unnamed_messages_by_position() {
        let (client, _) = client(vec![Reply::Body(r#"[["a","b"],"1501"]"#)]);
        let streams: Vec<DataStream<Update>> = ["room1", "room2", "room3"]
            .into_iter()
            .map(|channel| {
                client
                    .subscribe()
                    .channels([channel])
                    .execute()
                    .expect("subscription expected")
                    .stream()
            })
            .collect();
        let [room1, room2, room3] = streams.as_slice() else {
            panic!("three streams expected");
        };

        assert_eq!(message_data(next(&mut room1.clone()).await), b"\"a\"");
        assert_eq!(message_data(next(&mut room2.clone()).await), b"\"b\"");
        assert!(room3.is_empty());
    }

    #[tokio::test]
    async fn become_idle_after_last_topic_removed() {
        let (client, transport) = client(vec![Reply::Body(r#"[[],"1500"]"#)]);
        let mut statuses = client.status_stream();

        let first = client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 2).await;

        client
            .unsubscribe(&["room1"], &[])
            .expect("unsubscribe expected");

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected { .. })
        ));
        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Unsubscribed {
                channels: vec!["room1".into()],
                channel_groups: vec![],
            })
        );
        assert_eq!(next(&mut first.stream()).await, None);
        wait_until(|| client.subscribe_loop_state() == SubscribeLoopState::Idle).await;

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 3).await;

        assert_eq!(transport.paths()[2], "/subscribe/demo/room1/0/0");
    }

    #[tokio::test]
    async fn start_from_now_when_topics_replaced_before_loop_idles() {
        let (client, transport) = client(vec![Reply::Body(r#"[[],"1500"]"#)]);

        client
            .subscribe()
            .channels(["room1"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 2).await;

        client
            .unsubscribe(&["room1"], &[])
            .expect("unsubscribe expected");
        client
            .subscribe()
            .channels(["room2"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 3).await;

        assert_eq!(transport.paths()[2], "/subscribe/demo/room2/0/0");
    }

    #[tokio::test]
    async fn report_unknown_topics_on_unsubscribe() {
        let (client, _) = client(vec![]);
        let mut statuses = client.status_stream();

        client
            .unsubscribe(&["room9"], &[])
            .expect("unsubscribe expected");

        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::NotSubscribed {
                channels: vec!["room9".into()],
                channel_groups: vec![],
            })
        );
    }

    #[tokio::test]
    async fn abort_subscription() {
        let (client, transport) = client(vec![]);
        client.abort();

        let subscription = client
            .subscribe()
            .channels(["room1"])
            .channel_groups(["news"])
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 1).await;

        client.abort();
        client.abort();

        assert_eq!(next(&mut subscription.stream()).await, None);
        assert_eq!(client.subscribe_loop_state(), SubscribeLoopState::Idle);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.requests_count(), 1);
    }

    #[tokio::test]
    async fn continue_from_provided_timetoken() {
        let (client, transport) = client(vec![]);

        client
            .subscribe()
            .channel_groups(["news"])
            .timetoken("1200")
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 1).await;

        client
            .subscribe()
            .channel_groups(["news"])
            .timetoken("1100")
            .execute()
            .expect("subscription expected");
        wait_until(|| transport.requests_count() == 2).await;

        assert_eq!(
            transport.paths(),
            vec!["/subscribe/demo/,/0/1200", "/subscribe/demo/,/0/1100"]
        );
    }

    #[test]
    fn reject_subscribe_without_topics() {
        let (client, _) = client(vec![]);

        let result = client.subscribe().with_presence(true).execute();

        assert!(matches!(result, Err(PubNubError::InvalidInput { .. })));
    }
}
