//! Call semantics across the in-process transport.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use costsource_core::traits::{CostSourcePlugin, RecommendationsProvider};
use costsource_core::{
    ActualCostRequest, CallContext, FallbackHint, HarnessConfig, Method, NameRequest,
    RecommendationsRequest, ResourceDescriptor, StatusCode, SupportsRequest,
};
use costsource_mock::{InjectedError, MockPlugin, samples};
use costsource_transport::PluginHarness;
use std::sync::Arc;
use std::time::Duration;

fn window(resource_id: &str, hours: u32) -> ActualCostRequest {
    let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    ActualCostRequest::new(resource_id, start, start + ChronoDuration::hours(i64::from(hours)))
}

#[tokio::test]
async fn test_injected_error_keeps_its_classification() {
    let plugin = MockPlugin::builder()
        .inject_error(Method::ActualCost, InjectedError::not_found("no such instance"))
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let status = client
        .actual_cost(&CallContext::background(), window("i-1", 1))
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::NotFound);
    assert_eq!(status.message(), "no such instance");

    harness.stop().await;
}

#[tokio::test]
async fn test_invalid_request_crosses_transport_as_invalid_argument() {
    let mut harness = PluginHarness::serve(Arc::new(MockPlugin::builder().build())).unwrap();
    let client = harness.client().unwrap();

    let status = client
        .supports(
            &CallContext::background(),
            SupportsRequest {
                resource: ResourceDescriptor::new("", "ec2"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::InvalidArgument);

    harness.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_are_matched_to_their_callers() {
    let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let mut builder = MockPlugin::builder()
        .set_delay(Method::ActualCost, Duration::from_millis(10));
    for i in 0..10u32 {
        builder = builder.set_response_for(
            format!("i-{i}"),
            samples::actual_cost_result(start, i + 1, 0.1),
        );
    }
    let mut harness = PluginHarness::serve(Arc::new(builder.build())).unwrap();
    let client = harness.client().unwrap();

    let mut tasks = Vec::new();
    for i in 0..10u32 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let result = client
                .actual_cost(&CallContext::background(), window(&format!("i-{i}"), 24))
                .await
                .unwrap();
            (i, result.results.len())
        }));
    }
    for task in tasks {
        let (i, len) = task.await.unwrap();
        assert_eq!(len, usize::try_from(i + 1).unwrap());
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_deadline_propagates_and_plugin_stays_usable() {
    let plugin = MockPlugin::builder()
        .set_delay(Method::ActualCost, Duration::from_secs(30))
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let started = std::time::Instant::now();
    let status = client
        .actual_cost(
            &CallContext::with_timeout(Duration::from_millis(50)),
            window("i-slow", 1),
        )
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::DeadlineExceeded);
    assert!(started.elapsed() < Duration::from_secs(5));

    let name = client
        .name(&CallContext::background(), NameRequest::default())
        .await
        .unwrap();
    assert!(!name.name.is_empty());

    harness.stop().await;
}

#[tokio::test]
async fn test_caller_cancellation_returns_cancelled() {
    let plugin = MockPlugin::builder()
        .set_delay(Method::Name, Duration::from_secs(30))
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let ctx = CallContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let status = client.name(&ctx, NameRequest::default()).await.unwrap_err();
    assert_eq!(status.code(), StatusCode::Cancelled);

    // The server-side call observed the cancel frame, so stop has nothing
    // left to wait for.
    let started = std::time::Instant::now();
    harness.stop().await;
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancel_racing_stop_is_honoured_during_drain() {
    let grace = Duration::from_secs(2);

    for round in 0..5 {
        let plugin = MockPlugin::builder()
            .set_delay(Method::Name, Duration::from_secs(30))
            .build();
        let mut harness = PluginHarness::new(HarnessConfig {
            shutdown_grace: grace,
            ..HarnessConfig::default()
        });
        harness.start(Arc::new(plugin)).unwrap();
        let client = harness.client().unwrap();

        let ctx = CallContext::background();
        let call_ctx = ctx.clone();
        let call = tokio::spawn(async move { client.name(&call_ctx, NameRequest::default()).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The cancel frame is still queued when stop starts draining.
        ctx.cancel();
        let started = std::time::Instant::now();
        harness.stop().await;
        let drained_in = started.elapsed();

        assert!(
            drained_in < grace / 2,
            "round {round}: stop waited {drained_in:?} for a cancelled call"
        );
        let status = call.await.unwrap().unwrap_err();
        assert_eq!(status.code(), StatusCode::Cancelled);
    }
}

#[tokio::test]
async fn test_oversized_reply_fails_only_its_call() {
    let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    let plugin = MockPlugin::builder()
        .set_response(samples::actual_cost_result(start, 48, 0.0116))
        .build();
    let mut harness = PluginHarness::new(HarnessConfig {
        max_frame_length: 1024,
        ..HarnessConfig::default()
    });
    harness.start(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let status = client
        .actual_cost(&CallContext::background(), window("i-big", 48))
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::ResourceExhausted);

    let name = client
        .name(&CallContext::background(), NameRequest::default())
        .await
        .unwrap();
    assert_eq!(name.name, "mock-plugin");
    assert!(!client.is_closed());

    harness.stop().await;
}

#[tokio::test]
async fn test_recommendations_without_capability_return_empty_page() {
    let plugin = MockPlugin::builder()
        .without_recommendations()
        .recommendation_count(20)
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let page = client
        .recommendations(&CallContext::background(), RecommendationsRequest::default())
        .await
        .unwrap();
    assert!(page.recommendations.is_empty());
    assert!(page.next_page_token.is_empty());

    harness.stop().await;
}

#[tokio::test]
async fn test_fallback_hint_survives_round_trip() {
    let plugin = MockPlugin::builder()
        .set_response(samples::no_data(FallbackHint::Required))
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let result = client
        .actual_cost(&CallContext::background(), window("i-1", 1))
        .await
        .unwrap();
    assert_eq!(result.fallback_hint, FallbackHint::Required);
    assert!(!result.has_data());

    harness.stop().await;
}

#[tokio::test]
async fn test_client_is_a_plugin() {
    let mut harness = PluginHarness::serve(Arc::new(MockPlugin::builder().build())).unwrap();
    let client: Arc<dyn CostSourcePlugin> = Arc::new(harness.client().unwrap());

    assert!(client.recommendations_provider().is_some());
    harness.stop().await;
}
