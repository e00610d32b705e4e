//! Fallback chains over mock plugins.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{ActualCostRequest, CallContext, FallbackHint, Method, StatusCode};
use costsource_fallback::{FallbackChain, FallbackDecision, FallbackError, Finality};
use costsource_mock::{InjectedError, MockPlugin, samples};
use costsource_transport::PluginHarness;
use std::sync::Arc;

fn request() -> ActualCostRequest {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    ActualCostRequest::new("i-0abc", start, start + ChronoDuration::hours(24))
}

fn hinting(hint: FallbackHint) -> Arc<MockPlugin> {
    Arc::new(MockPlugin::builder().set_response(samples::no_data(hint)).build())
}

fn with_data() -> Arc<MockPlugin> {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
    Arc::new(
        MockPlugin::builder()
            .set_response(samples::actual_cost_result(start, 24, 0.0116))
            .build(),
    )
}

#[tokio::test]
async fn test_recommended_falls_through_to_plugin_with_data() {
    let first = hinting(FallbackHint::Recommended);
    let second = with_data();
    let chain = FallbackChain::new()
        .with_plugin("public-pricing", first.clone())
        .with_plugin("billing-export", second.clone());

    let outcome = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap();

    assert_eq!(outcome.plugin, "billing-export");
    assert_eq!(outcome.decision, FallbackDecision::Final(Finality::Authoritative));
    assert_eq!(outcome.response.results.len(), 24);
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].decision, FallbackDecision::Continue);
}

#[tokio::test]
async fn test_authoritative_empty_answer_stops_the_chain() {
    let first = hinting(FallbackHint::None);
    let second = with_data();
    let chain = FallbackChain::new()
        .with_plugin("first", first.clone())
        .with_plugin("second", second.clone());

    let outcome = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap();

    assert_eq!(outcome.plugin, "first");
    assert_eq!(outcome.decision, FallbackDecision::Final(Finality::ZeroCost));
    assert_eq!(second.call_count(Method::ActualCost), 0);
}

#[tokio::test]
async fn test_required_on_last_plugin_is_unhandled() {
    let chain = FallbackChain::new()
        .with_plugin("first", hinting(FallbackHint::Recommended))
        .with_plugin("second", hinting(FallbackHint::Required));

    let err = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap_err();

    assert!(err.is_unhandled());
    assert_eq!(err.attempts().len(), 2);
    assert!(err.to_string().contains("i-0abc"));
}

#[tokio::test]
async fn test_recommended_on_last_plugin_is_zero_cost() {
    let chain = FallbackChain::new()
        .with_plugin("first", hinting(FallbackHint::Required))
        .with_plugin("second", hinting(FallbackHint::Recommended));

    let outcome = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap();

    assert_eq!(outcome.plugin, "second");
    assert_eq!(outcome.decision, FallbackDecision::Final(Finality::ZeroCost));
}

#[tokio::test]
async fn test_plugin_error_is_not_a_hint() {
    let failing = Arc::new(
        MockPlugin::builder()
            .inject_error(Method::ActualCost, InjectedError::unavailable("billing API down"))
            .build(),
    );
    let backup = with_data();
    let chain = FallbackChain::new()
        .with_plugin("failing", failing.clone())
        .with_plugin("backup", backup.clone());

    let err = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap_err();

    match &err {
        FallbackError::Plugin { plugin, status, attempts } => {
            assert_eq!(plugin, "failing");
            assert_eq!(status.code(), StatusCode::Unavailable);
            assert!(attempts.is_empty());
        }
        other => panic!("expected plugin error, got {other:?}"),
    }
    assert_eq!(backup.call_count(Method::ActualCost), 0);
}

#[tokio::test]
async fn test_empty_chain() {
    let chain = FallbackChain::new();
    assert!(chain.is_empty());

    let err = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, FallbackError::NoPlugins));
}

#[tokio::test]
async fn test_chain_over_transport_clients() {
    let mut first = PluginHarness::serve(hinting(FallbackHint::Required)).unwrap();
    let mut second = PluginHarness::serve(with_data()).unwrap();
    let first_client: Arc<dyn CostSourcePlugin> = Arc::new(first.client().unwrap());
    let second_client: Arc<dyn CostSourcePlugin> = Arc::new(second.client().unwrap());

    let mut chain = FallbackChain::new();
    chain.push("remote-a", first_client);
    chain.push("remote-b", second_client);
    assert_eq!(chain.len(), 2);

    let outcome = chain
        .actual_cost(&CallContext::background(), &request())
        .await
        .unwrap();
    assert_eq!(outcome.plugin, "remote-b");
    assert!((outcome.response.total_cost() - 24.0 * 0.0116).abs() < 1e-9);

    first.stop().await;
    second.stop().await;
}
