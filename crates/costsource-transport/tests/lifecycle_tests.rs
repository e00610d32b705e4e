//! Start/client/stop lifecycle of the in-process harness.

use costsource_core::traits::CostSourcePlugin;
use costsource_core::{CallContext, Error, HarnessConfig, Method, NameRequest, StatusCode};
use costsource_mock::MockPlugin;
use costsource_transport::PluginHarness;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("costsource_transport=debug")
        .with_test_writer()
        .try_init();
}

fn mock() -> Arc<dyn CostSourcePlugin> {
    Arc::new(MockPlugin::builder().name("lifecycle-mock").build())
}

#[tokio::test]
async fn test_client_before_start_is_not_started() {
    let harness = PluginHarness::new(HarnessConfig::default());
    let err = harness.client().unwrap_err();
    assert!(matches!(err, Error::TransportNotStarted));
    assert!(err.is_transport_lifecycle_error());
}

#[tokio::test]
async fn test_start_client_stop() {
    init_tracing();
    let mut harness = PluginHarness::serve(mock()).unwrap();
    assert!(harness.is_running());

    let client = harness.client().unwrap();
    let name = client
        .name(&CallContext::background(), NameRequest::default())
        .await
        .unwrap();
    assert_eq!(name.name, "lifecycle-mock");

    harness.stop().await;
    assert!(!harness.is_running());
    assert!(matches!(harness.client(), Err(Error::TransportStopped)));
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut harness = PluginHarness::serve(mock()).unwrap();
    harness.stop().await;
    harness.stop().await;
    assert!(!harness.is_running());
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let mut harness = PluginHarness::new(HarnessConfig::default());
    harness.stop().await;
    assert!(matches!(harness.client(), Err(Error::TransportNotStarted)));
}

#[tokio::test]
async fn test_held_client_fails_unavailable_after_stop() {
    let mut harness = PluginHarness::serve(mock()).unwrap();
    let client = harness.client().unwrap();
    harness.stop().await;

    assert!(client.is_closed());
    let status = client
        .name(&CallContext::background(), NameRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::Unavailable);
}

#[tokio::test]
#[should_panic(expected = "start called twice")]
async fn test_start_twice_panics() {
    let mut harness = PluginHarness::serve(mock()).unwrap();
    let _ = harness.start(mock());
}

#[test]
fn test_start_without_runtime_is_infrastructure_error() {
    let mut harness = PluginHarness::new(HarnessConfig::default());
    let err = harness.start(mock()).unwrap_err();
    assert!(matches!(err, Error::RuntimeUnavailable { .. }));
    assert!(!harness.is_running());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = HarnessConfig {
        duplex_buffer_size: 0,
        ..HarnessConfig::default()
    };
    let mut harness = PluginHarness::new(config);
    let err = harness.start(mock()).unwrap_err();
    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_stop_drains_in_flight_call() {
    init_tracing();
    let plugin = MockPlugin::builder()
        .set_delay(Method::Name, Duration::from_millis(100))
        .build();
    let mut harness = PluginHarness::serve(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let call = tokio::spawn(async move {
        client
            .name(&CallContext::background(), NameRequest::default())
            .await
    });
    // Let the call reach the server before shutting down.
    tokio::time::sleep(Duration::from_millis(20)).await;
    harness.stop().await;

    let name = call.await.unwrap().unwrap();
    assert_eq!(name.name, costsource_mock::DEFAULT_PLUGIN_NAME);
}

#[tokio::test]
async fn test_stop_aborts_calls_past_grace_period() {
    let plugin = MockPlugin::builder()
        .set_delay(Method::Name, Duration::from_secs(60))
        .build();
    let config = HarnessConfig::default().with_shutdown_grace(Duration::from_millis(50));
    let mut harness = PluginHarness::new(config);
    harness.start(Arc::new(plugin)).unwrap();
    let client = harness.client().unwrap();

    let call = tokio::spawn(async move {
        client
            .name(&CallContext::background(), NameRequest::default())
            .await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = std::time::Instant::now();
    harness.stop().await;
    assert!(started.elapsed() < Duration::from_secs(5));

    let status = call.await.unwrap().unwrap_err();
    assert_eq!(status.code(), StatusCode::Unavailable);
}

#[tokio::test]
async fn test_capabilities_resolved_at_start() {
    let mut with = PluginHarness::serve(mock()).unwrap();
    assert!(with.capabilities().unwrap().recommendations);

    let plugin = MockPlugin::builder().without_recommendations().build();
    let mut without = PluginHarness::serve(Arc::new(plugin)).unwrap();
    assert!(!without.capabilities().unwrap().recommendations);

    with.stop().await;
    without.stop().await;
    assert!(with.capabilities().is_none());
}

#[tokio::test]
async fn test_drop_while_running_releases_client() {
    let harness = PluginHarness::serve(mock()).unwrap();
    let client = harness.client().unwrap();
    drop(harness);

    let status = client
        .name(&CallContext::background(), NameRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), StatusCode::Unavailable);
}
