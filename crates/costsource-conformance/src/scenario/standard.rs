//! Standard tier: error classification, absent data, concurrency and
//! idempotence.

use super::basic::check_cost_result;
use super::{ScenarioContext, Verdict, ensure, reference_resource, reference_window, succeeded};
use costsource_core::{
    ActualCostRequest, MAX_PAGE_SIZE, Method, ProjectedCostRequest, RecommendationsRequest,
    ResourceDescriptor, Status, StatusCode, SupportsRequest,
};
use futures_util::future::join_all;
use std::sync::Arc;

/// Resource id no plugin is expected to hold data for.
const ABSENT_RESOURCE_ID: &str = "conformance-absent-resource";

fn expect_invalid_argument<T>(method: Method, outcome: Result<T, Status>) -> Verdict {
    match outcome {
        Err(status) if status.code() == StatusCode::InvalidArgument => Ok(()),
        Err(status) => Err(format!(
            "{method} returned {} for malformed input, expected {}",
            status.code(),
            StatusCode::InvalidArgument
        )),
        Ok(_) => Err(format!("{method} accepted malformed input")),
    }
}

pub(super) async fn inverted_window(cx: &ScenarioContext) -> Verdict {
    let valid = reference_window("conformance-resource", 24);
    let request = ActualCostRequest::new(valid.resource_id, valid.end, valid.start);
    expect_invalid_argument(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request).await,
    )
}

pub(super) async fn empty_resource_id(cx: &ScenarioContext) -> Verdict {
    let request = reference_window("", 24);
    expect_invalid_argument(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request).await,
    )
}

pub(super) async fn missing_provider(cx: &ScenarioContext) -> Verdict {
    let resource = ResourceDescriptor {
        provider: String::new(),
        ..reference_resource()
    };
    expect_invalid_argument(
        Method::Supports,
        cx.plugin()
            .supports(&cx.call_ctx(), SupportsRequest { resource })
            .await,
    )
}

pub(super) async fn missing_resource_type(cx: &ScenarioContext) -> Verdict {
    let resource = ResourceDescriptor {
        resource_type: String::new(),
        ..reference_resource()
    };
    expect_invalid_argument(
        Method::ProjectedCost,
        cx.plugin()
            .projected_cost(&cx.call_ctx(), ProjectedCostRequest { resource })
            .await,
    )
}

/// Only meaningful when the plugin implements recommendations; the empty
/// fallback page of a plugin without the capability accepts anything.
pub(super) async fn oversized_page(cx: &ScenarioContext) -> Verdict {
    if !cx.capabilities.recommendations {
        return Ok(());
    }
    let request = RecommendationsRequest {
        page_size: MAX_PAGE_SIZE + 1,
        ..RecommendationsRequest::default()
    };
    expect_invalid_argument(
        Method::Recommendations,
        cx.recommendations(&cx.call_ctx(), request).await,
    )
}

/// "No data" must be an empty result plus a hint, never a protocol error.
pub(super) async fn absent_data(cx: &ScenarioContext) -> Verdict {
    let request = reference_window(ABSENT_RESOURCE_ID, 24);
    match cx.plugin().actual_cost(&cx.call_ctx(), request.clone()).await {
        Ok(result) => check_cost_result(&result, &request),
        Err(status) => Err(format!(
            "absent data reported as a {} error; expected an empty result with a fallback hint",
            status.code()
        )),
    }
}

/// Data together with a hint asking for fallback is contradictory.
pub(super) async fn hint_consistency(cx: &ScenarioContext) -> Verdict {
    for resource_id in ["conformance-resource", ABSENT_RESOURCE_ID] {
        let request = reference_window(resource_id, 24);
        let result = succeeded(
            Method::ActualCost,
            cx.plugin().actual_cost(&cx.call_ctx(), request).await,
        )?;
        ensure!(
            !result.has_contradictory_hint(),
            "{resource_id}: {} line items returned with fallback hint {:?}",
            result.results.len(),
            result.fallback_hint
        );
    }
    Ok(())
}

/// Distinct concurrent calls each get the answer the same call gets alone.
pub(super) async fn concurrency(cx: &ScenarioContext) -> Verdict {
    let requests: Vec<ActualCostRequest> = (0..cx.config.concurrency)
        .map(|i| reference_window(&format!("conformance-concurrent-{i:03}"), 24))
        .collect();

    let mut baseline = Vec::with_capacity(requests.len());
    for request in &requests {
        baseline.push(succeeded(
            Method::ActualCost,
            cx.plugin().actual_cost(&cx.call_ctx(), request.clone()).await,
        )?);
    }

    let calls = requests.iter().cloned().map(|request| {
        let plugin = Arc::clone(cx.plugin());
        let ctx = cx.call_ctx();
        tokio::spawn(async move { plugin.actual_cost(&ctx, request).await })
    });
    let outcomes = join_all(calls).await;

    for (i, (outcome, expected)) in outcomes.into_iter().zip(&baseline).enumerate() {
        let resource_id = &requests[i].resource_id;
        let result = outcome
            .map_err(|e| format!("concurrent call {i} ({resource_id}) did not complete: {e}"))?
            .map_err(|status| format!("concurrent call {i} ({resource_id}) failed: {status}"))?;
        ensure!(
            result == *expected,
            "concurrent call {i} ({resource_id}) received a different answer than when called alone"
        );
    }
    Ok(())
}

/// Repeating an identical request yields an equal response.
pub(super) async fn idempotence(cx: &ScenarioContext) -> Verdict {
    let request = reference_window("conformance-resource", 24);
    let first = succeeded(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request.clone()).await,
    )?;
    let second = succeeded(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request).await,
    )?;
    ensure!(first == second, "actual_cost answered an identical request differently");

    let request = ProjectedCostRequest {
        resource: reference_resource(),
    };
    let first = succeeded(
        Method::ProjectedCost,
        cx.plugin().projected_cost(&cx.call_ctx(), request.clone()).await,
    )?;
    let second = succeeded(
        Method::ProjectedCost,
        cx.plugin().projected_cost(&cx.call_ctx(), request).await,
    )?;
    ensure!(
        first == second,
        "projected_cost answered an identical request differently"
    );
    Ok(())
}
