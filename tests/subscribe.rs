#[cfg(test)]
mod integration {
    use futures::StreamExt;
    use pubnub_subscriber::{
        core::{DataStream, PubNubError},
        providers::futures_tokio::RuntimeTokio,
        transport::TransportReqwest,
        PubNubClientInstance, PubNubConfigBuilder, RequestRetryPolicy, SubscribeLoopState,
        SubscribeStatus, Update,
    };
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    type Client = PubNubClientInstance<TransportReqwest, RuntimeTokio>;

    fn client(server: &MockServer, config: PubNubConfigBuilder) -> Result<Client, PubNubError> {
        let _ = env_logger::builder().is_test(true).try_init();

        Ok(PubNubClientInstance::new(
            TransportReqwest::with_hostname(server.uri()),
            RuntimeTokio,
            config
                .subscribe_key("demo")
                .user_id("tester")
                .retry_policy(RequestRetryPolicy::Linear {
                    delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(10),
                    max_retry: 3,
                })
                .build()?,
        ))
    }

    /// Respond to request for `time token` with `body`.
    async fn respond(server: &MockServer, channels: &str, timetoken: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/subscribe/demo/{channels}/0/{timetoken}")))
            .and(query_param("uuid", "tester"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Keep request for `time token` in flight.
    async fn hold(server: &MockServer, channels: &str, timetoken: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/subscribe/demo/{channels}/0/{timetoken}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"[[],"{timetoken}"]"#))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(server)
            .await;
    }

    async fn next<S>(stream: &mut DataStream<S>) -> Option<S> {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("stream should produce value in time")
    }

    #[tokio::test]
    async fn should_receive_message_from_channel() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        respond(&server, "room1", "0", r#"[[],"1500"]"#.into()).await;
        respond(
            &server,
            "room1",
            "1500",
            r#"[[{"text":"hi"}],"1501","room1"]"#.into(),
        )
        .await;
        hold(&server, "room1", "1501").await;

        let client = client(&server, PubNubConfigBuilder::default())?;
        let mut statuses = client.status_stream();
        let subscription = client.subscribe().channels(["room1"]).execute()?;
        let mut updates = subscription.stream();

        assert_eq!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected {
                channels: vec!["room1".into()],
                channel_groups: vec![],
            })
        );

        match next(&mut updates).await {
            Some(Update::Message(message)) => {
                assert_eq!(message.channel, "room1");
                assert_eq!(message.data, br#"{"text":"hi"}"#);
                assert_eq!(message.timetoken, "1501");
            }
            other => panic!("Unexpected update: {other:?}"),
        }
        assert_eq!(client.timetoken(), Some("1501".into()));

        client.unsubscribe_all();
        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Unsubscribed { .. })
        ));
        assert_eq!(next(&mut updates).await, None);

        Ok(())
    }

    #[tokio::test]
    async fn should_reconnect_after_server_error() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscribe/demo/room1/0/0"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        respond(&server, "room1", "0", r#"[[],"1500"]"#.into()).await;
        hold(&server, "room1", "1500").await;

        let client = client(&server, PubNubConfigBuilder::default())?;
        let mut statuses = client.status_stream();
        client.subscribe().channels(["room1"]).execute()?;

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Disconnected { attempt: 1, .. })
        ));
        assert_eq!(next(&mut statuses).await, Some(SubscribeStatus::Reconnected));
        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::Connected { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn should_stop_when_access_denied() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"message":"Forbidden","error":true,"status":403}"#),
            )
            .mount(&server)
            .await;

        let client = client(&server, PubNubConfigBuilder::default())?;
        let mut statuses = client.status_stream();
        let subscription = client.subscribe().channels(["room1"]).execute()?;

        assert!(matches!(
            next(&mut statuses).await,
            Some(SubscribeStatus::AccessDenied { status: 403, .. })
        ));
        assert_eq!(next(&mut subscription.stream()).await, None);
        assert_eq!(client.subscribe_loop_state(), SubscribeLoopState::Aborted);

        Ok(())
    }

    #[cfg(feature = "crypto")]
    #[tokio::test]
    async fn should_decrypt_received_message() -> Result<(), Box<dyn std::error::Error>> {
        use base64::{engine::general_purpose, Engine as _};
        use pubnub_subscriber::{core::Cryptor, providers::crypto_aescbc::LegacyCryptor};

        let encrypted = LegacyCryptor::new("enigma", true)?.encrypt(br#""secret""#.to_vec())?;
        let server = MockServer::start().await;
        respond(
            &server,
            "room1",
            "0",
            format!(
                r#"[["{}"],"1501","room1"]"#,
                general_purpose::STANDARD.encode(encrypted)
            ),
        )
        .await;
        hold(&server, "room1", "1501").await;

        let client = client(
            &server,
            PubNubConfigBuilder::default().cryptor(LegacyCryptor::new("enigma", true)?),
        )?;
        let subscription = client.subscribe().channels(["room1"]).execute()?;

        match next(&mut subscription.stream()).await {
            Some(Update::Message(message)) => {
                assert_eq!(message.data, br#""secret""#);
                assert!(message.decryption_error.is_none());
            }
            other => panic!("Unexpected update: {other:?}"),
        }

        Ok(())
    }
}
