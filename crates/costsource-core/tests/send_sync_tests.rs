//! Tests to verify that all public types are Send + Sync as required.

use costsource_core::traits::{CostSourcePlugin, RecommendationsProvider};
use costsource_core::{
    CallContext, CostQueryResult, Error, HarnessConfig, Method, RegisteredPlugin, Status,
};

const fn assert_send_sync<T: Send + Sync + ?Sized>() {}

#[test]
fn test_contract_types_are_send_sync() {
    assert_send_sync::<Method>();
    assert_send_sync::<CostQueryResult>();
    assert_send_sync::<CallContext>();
}

#[test]
fn test_trait_objects_are_send_sync() {
    assert_send_sync::<dyn CostSourcePlugin>();
    assert_send_sync::<dyn RecommendationsProvider>();
    assert_send_sync::<RegisteredPlugin>();
}

#[test]
fn test_errors_are_send_sync() {
    assert_send_sync::<Error>();
    assert_send_sync::<Status>();
    assert_send_sync::<HarnessConfig>();
}
