//! Concurrent use of a single frozen mock.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{ActualCostRequest, CallContext, FallbackHint, Method, StatusCode};
use costsource_mock::{InjectedError, MockPlugin, samples};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

fn window(resource_id: &str) -> ActualCostRequest {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    ActualCostRequest::new(resource_id, start, start + ChronoDuration::hours(4))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_keyed_calls_get_their_own_answer() {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut builder = MockPlugin::builder();
    for i in 0..10u32 {
        builder = builder.set_response_for(
            format!("i-{i}"),
            samples::actual_cost_result(start, i + 1, 0.25),
        );
    }
    let mock = Arc::new(builder.build());

    let calls = (0..10u32).map(|i| {
        let mock = Arc::clone(&mock);
        async move {
            let result = mock
                .actual_cost(&CallContext::background(), window(&format!("i-{i}")))
                .await
                .unwrap();
            (i, result.results.len())
        }
    });

    for (i, len) in join_all(calls).await {
        assert_eq!(len, usize::try_from(i + 1).unwrap());
    }
    assert_eq!(mock.call_count(Method::ActualCost), 10);
}

#[tokio::test]
async fn test_repeated_calls_are_idempotent() {
    let mock = MockPlugin::builder()
        .set_response(samples::no_data(FallbackHint::Recommended))
        .build();
    let ctx = CallContext::background();

    let first = mock.actual_cost(&ctx, window("i-1")).await.unwrap();
    let second = mock.actual_cost(&ctx, window("i-1")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn test_error_is_delayed_too() {
    let mock = MockPlugin::builder()
        .set_delay(Method::ActualCost, Duration::from_millis(200))
        .inject_error(Method::ActualCost, InjectedError::internal("late failure"))
        .build();

    let started = tokio::time::Instant::now();
    let err = mock
        .actual_cost(&CallContext::background(), window("i-1"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), StatusCode::Internal);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_slow_call_does_not_block_fast_method() {
    let mock = Arc::new(
        MockPlugin::builder()
            .set_delay(Method::ActualCost, Duration::from_secs(5))
            .build(),
    );

    let slow = {
        let mock = Arc::clone(&mock);
        tokio::spawn(async move {
            mock.actual_cost(&CallContext::background(), window("i-slow"))
                .await
        })
    };

    let started = tokio::time::Instant::now();
    mock.name(&CallContext::background(), costsource_core::NameRequest::default())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(slow.await.unwrap().is_ok());
}
