//! # Correlation Flows
//!
//! End-to-end behavior of the correlation layer between two tiers:
//!
//! 1. **Round trip**: a slow handler still answers within the deadline
//! 2. **No response**: the call fails at the deadline and leaves nothing behind
//! 3. **Business outcome**: `NotFound` travels back as a business error
//! 4. **Publish failure**: reported at once, never as a timeout
//! 5. **Late response**: dropped, and the next call is unaffected
//! 6. **Concurrency**: out-of-order responses reach the right callers
//! 7. **Pool cap**: at most N handlers run, the next one waits

#[cfg(test)]
mod tests {
    use crate::integration::support::{api_tier, FailingTransport, TwoTier, TOPIC};
    use async_trait::async_trait;
    use bookstore_bus::{InMemoryBroker, Transport};
    use bookstore_rpc::domain::envelope;
    use bookstore_rpc::{
        CallError, CallOutcome, HandlerReply, MethodHandler, MethodTable, ResponseEnvelope,
    };
    use bookstore_types::methods;
    use serde_json::{json, Value};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, Semaphore};
    use tokio::time::Instant;
    use tokio_stream::StreamExt;

    // =============================================================================
    // TEST HANDLERS
    // =============================================================================

    /// Answers after 50ms with a fixed item list.
    struct GetItems;

    #[async_trait]
    impl MethodHandler for GetItems {
        async fn handle(&self, _payload: Value) -> HandlerReply {
            tokio::time::sleep(Duration::from_millis(50)).await;
            HandlerReply::ok(json!({"items": ["a", "b"]}))
        }
    }

    /// Sleeps `delay_ms` from the payload, then echoes `n`.
    struct Delayed;

    #[async_trait]
    impl MethodHandler for Delayed {
        async fn handle(&self, payload: Value) -> HandlerReply {
            let delay = payload["delay_ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            HandlerReply::ok(json!({"n": payload["n"]}))
        }
    }

    /// Reports that it started, then waits for a permit.
    struct Gate {
        started: mpsc::UnboundedSender<()>,
        release: Arc<Semaphore>,
    }

    #[async_trait]
    impl MethodHandler for Gate {
        async fn handle(&self, _payload: Value) -> HandlerReply {
            let _ = self.started.send(());
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
            HandlerReply::ok(Value::Null)
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_slow_handler_answers_within_deadline() {
        let tiers = TwoTier::start(
            MethodTable::builder()
                .register("get_items", Arc::new(GetItems))
                .build(),
            10,
        )
        .await;

        let started = Instant::now();
        let result = tiers
            .api
            .client()
            .invoke("get_items", json!({}), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result, json!({"items": ["a", "b"]}));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(tiers.api.registry().pending_count(), 0);

        tiers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_response_times_out_at_deadline() {
        let broker = Arc::new(InMemoryBroker::new());
        let api = api_tier(broker).await;
        let timeout = Duration::from_secs(2);

        let started = Instant::now();
        let err = api
            .client()
            .invoke("get_items", json!({}), timeout)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err, CallError::Timeout(timeout));
        assert!(elapsed >= timeout, "returned early: {elapsed:?}");
        assert!(elapsed < timeout + Duration::from_millis(5), "returned late: {elapsed:?}");
        assert_eq!(api.registry().pending_count(), 0);
        assert_eq!(api.registry().stats().timeouts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_business_error() {
        let (tiers, _storage) = TwoTier::with_books().await;

        let err = tiers
            .api
            .client()
            .invoke(
                methods::GET_USER_BOOK,
                json!({"id": 42, "user_id": 1}),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();

        assert_eq!(err, CallError::NotFound);
        assert!(err.is_business());
        assert!(!err.is_transport());

        tiers.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_reported_immediately() {
        let broker = Arc::new(InMemoryBroker::new());
        let api = api_tier(Arc::new(FailingTransport::new(broker))).await;

        let started = Instant::now();
        let err = api
            .client()
            .invoke(methods::PING, Value::Null, Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Transport(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(api.registry().pending_count(), 0);
        assert_eq!(api.registry().stats().timeouts.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_late_response_dropped_and_next_call_works() {
        let broker = Arc::new(InMemoryBroker::new());
        let api = api_tier(broker.clone()).await;
        let mut raw = broker.subscribe(TOPIC).await.unwrap();

        let client = api.client().clone();
        let call = tokio::spawn(async move {
            client
                .invoke(methods::PING, Value::Null, Duration::from_millis(100))
                .await
        });

        // Capture the request nobody answers.
        let message = raw.next().await.unwrap().unwrap();
        let request = envelope::decode_request(&message.payload).unwrap();

        let err = call.await.unwrap().unwrap_err();
        assert!(err.is_timeout());
        assert!(!api.registry().is_pending(&request.call_id));

        // Answer after the caller gave up.
        let late = ResponseEnvelope::reply_to(&request, json!("pong"), CallOutcome::Ok);
        broker
            .publish(TOPIC, None, envelope::encode(&late.into()).unwrap())
            .await
            .unwrap();

        let stats = api.registry().stats();
        wait_until(|| stats.dropped_no_waiter.load(Ordering::Relaxed) == 1).await;
        assert_eq!(stats.delivered.load(Ordering::Relaxed), 0);

        // A storage tier comes up; the next call goes through normally.
        let storage_tier = bookstore_rpc::RpcEndpoint::start(
            broker.clone(),
            bookstore_rpc::book_methods(Arc::new(bookstore_rpc::InMemoryBookStorage::new())),
            &crate::integration::support::config(2),
        )
        .await
        .unwrap();

        let pong = api
            .client()
            .invoke(methods::PING, Value::Null, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(pong, json!("pong"));
        assert_eq!(api.registry().pending_count(), 0);

        storage_tier.shutdown().await;
        api.shutdown().await;
    }

    #[tokio::test]
    async fn test_out_of_order_responses_reach_their_callers() {
        let tiers = TwoTier::start(
            MethodTable::builder()
                .register("delayed", Arc::new(Delayed))
                .build(),
            20,
        )
        .await;

        let mut calls = tokio::task::JoinSet::new();
        for n in 0..20u64 {
            let client = tiers.api.client().clone();
            calls.spawn(async move {
                // Later calls answer first.
                let payload = json!({"n": n, "delay_ms": (20 - n) * 5});
                let result = client
                    .invoke("delayed", payload, Duration::from_secs(2))
                    .await
                    .unwrap();
                (n, result)
            });
        }

        let mut answered = 0;
        while let Some(joined) = calls.join_next().await {
            let (n, result) = joined.unwrap();
            assert_eq!(result, json!({"n": n}));
            answered += 1;
        }

        assert_eq!(answered, 20);
        assert_eq!(tiers.api.registry().pending_count(), 0);
        assert_eq!(
            tiers.api.registry().stats().delivered.load(Ordering::Relaxed),
            20
        );
        // The storage tier also reads the responses it published; it has no waiters.
        assert_eq!(tiers.storage_tier.registry().pending_count(), 0);

        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_caps_concurrent_handlers() {
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Semaphore::new(0));
        let tiers = TwoTier::start(
            MethodTable::builder()
                .register(
                    "gate",
                    Arc::new(Gate {
                        started: started_tx,
                        release: release.clone(),
                    }),
                )
                .build(),
            2,
        )
        .await;

        let mut calls = tokio::task::JoinSet::new();
        for _ in 0..3 {
            let client = tiers.api.client().clone();
            calls.spawn(async move {
                client
                    .invoke("gate", Value::Null, Duration::from_secs(5))
                    .await
            });
        }

        for _ in 0..2 {
            tokio::time::timeout(Duration::from_secs(1), started_rx.recv())
                .await
                .unwrap()
                .unwrap();
        }
        assert!(
            tokio::time::timeout(Duration::from_millis(50), started_rx.recv())
                .await
                .is_err(),
            "third handler started while two slots were busy"
        );
        assert_eq!(tiers.storage_tier.pool().in_flight(), 2);

        release.add_permits(3);
        tokio::time::timeout(Duration::from_secs(1), started_rx.recv())
            .await
            .unwrap()
            .unwrap();

        while let Some(joined) = calls.join_next().await {
            joined.unwrap().unwrap();
        }
        assert_eq!(tiers.api.registry().pending_count(), 0);

        tiers.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_response_delivers_once() {
        let broker = Arc::new(InMemoryBroker::new());
        let api = api_tier(broker.clone()).await;
        let mut raw = broker.subscribe(TOPIC).await.unwrap();

        let client = api.client().clone();
        let call = tokio::spawn(async move {
            client
                .invoke(methods::PING, Value::Null, Duration::from_secs(1))
                .await
        });

        let message = raw.next().await.unwrap().unwrap();
        let request = envelope::decode_request(&message.payload).unwrap();
        for result in ["first", "second"] {
            let response = ResponseEnvelope::reply_to(&request, json!(result), CallOutcome::Ok);
            broker
                .publish(TOPIC, None, envelope::encode(&response.into()).unwrap())
                .await
                .unwrap();
        }

        assert_eq!(call.await.unwrap().unwrap(), json!("first"));
        assert_eq!(api.registry().stats().delivered.load(Ordering::Relaxed), 1);
        assert_eq!(api.registry().pending_count(), 0);

        api.shutdown().await;
    }
}
