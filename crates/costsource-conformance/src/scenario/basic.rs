//! Basic tier: one minimal valid call per method, structural checks.

use super::{
    ScenarioContext, Verdict, ensure, minimal_recommendations_request, reference_resource,
    reference_window, succeeded,
};
use costsource_core::{
    ActualCostRequest, CAPABILITY_RECOMMENDATIONS, CostQueryResult, Method, NameRequest,
    PricingSpecRequest, ProjectedCostRequest, RecommendationsResponse, SupportsRequest,
    is_valid_currency,
};

pub(super) async fn name(cx: &ScenarioContext) -> Verdict {
    let response = succeeded(
        Method::Name,
        cx.plugin().name(&cx.call_ctx(), NameRequest::default()).await,
    )?;
    ensure!(!response.name.trim().is_empty(), "name is empty");
    Ok(())
}

pub(super) async fn supports(cx: &ScenarioContext) -> Verdict {
    let response = succeeded(
        Method::Supports,
        cx.plugin()
            .supports(&cx.call_ctx(), SupportsRequest { resource: reference_resource() })
            .await,
    )?;
    ensure!(
        response.supported || !response.reason.is_empty(),
        "unsupported resource reported without a reason"
    );
    ensure!(
        !response.has_capability(CAPABILITY_RECOMMENDATIONS) || cx.capabilities.recommendations,
        "declares the {CAPABILITY_RECOMMENDATIONS} capability but does not implement it"
    );
    Ok(())
}

pub(super) async fn actual_cost(cx: &ScenarioContext) -> Verdict {
    let request = reference_window("conformance-resource", 24);
    let response = succeeded(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request.clone()).await,
    )?;
    check_cost_result(&response, &request)
}

pub(super) async fn projected_cost(cx: &ScenarioContext) -> Verdict {
    let response = succeeded(
        Method::ProjectedCost,
        cx.plugin()
            .projected_cost(&cx.call_ctx(), ProjectedCostRequest { resource: reference_resource() })
            .await,
    )?;
    ensure!(
        is_non_negative(response.unit_price),
        "unit_price is {}",
        response.unit_price
    );
    ensure!(
        is_non_negative(response.cost_per_month),
        "cost_per_month is {}",
        response.cost_per_month
    );
    ensure!(
        is_valid_currency(&response.currency),
        "currency {:?} is not an ISO-4217 code",
        response.currency
    );
    Ok(())
}

pub(super) async fn pricing_spec(cx: &ScenarioContext) -> Verdict {
    let response = succeeded(
        Method::PricingSpec,
        cx.plugin()
            .pricing_spec(&cx.call_ctx(), PricingSpecRequest { resource: reference_resource() })
            .await,
    )?;
    let spec = response.spec;
    ensure!(!spec.billing_mode.is_empty(), "billing_mode is empty");
    ensure!(
        is_non_negative(spec.rate_per_unit),
        "rate_per_unit is {}",
        spec.rate_per_unit
    );
    ensure!(
        is_valid_currency(&spec.currency),
        "currency {:?} is not an ISO-4217 code",
        spec.currency
    );
    Ok(())
}

pub(super) async fn recommendations(cx: &ScenarioContext) -> Verdict {
    let page_size = cx.config.page_size;
    let page = succeeded(
        Method::Recommendations,
        cx.recommendations(&cx.call_ctx(), minimal_recommendations_request(page_size))
            .await,
    )?;
    check_recommendations_page(&page, page_size)
}

/// Structural checks shared by every actual-cost scenario.
pub(super) fn check_cost_result(result: &CostQueryResult, request: &ActualCostRequest) -> Verdict {
    if result.has_data() {
        ensure!(
            is_valid_currency(&result.currency),
            "data returned with currency {:?}, not an ISO-4217 code",
            result.currency
        );
    }
    for (i, item) in result.results.iter().enumerate() {
        ensure!(
            is_non_negative(item.cost),
            "results[{i}].cost is {}",
            item.cost
        );
        ensure!(
            item.timestamp >= request.start && item.timestamp < request.end,
            "results[{i}].timestamp {} is outside the requested window",
            item.timestamp
        );
        ensure!(!item.source.is_empty(), "results[{i}].source is empty");
    }
    Ok(())
}

/// Structural checks for one recommendations page.
pub(super) fn check_recommendations_page(page: &RecommendationsResponse, page_size: u32) -> Verdict {
    let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
    ensure!(
        page.recommendations.len() <= limit,
        "page holds {} recommendations, more than the requested {page_size}",
        page.recommendations.len()
    );
    for (i, rec) in page.recommendations.iter().enumerate() {
        ensure!(!rec.id.is_empty(), "recommendations[{i}].id is empty");
        ensure!(
            rec.estimated_savings.is_finite(),
            "recommendations[{i}].estimated_savings is {}",
            rec.estimated_savings
        );
        ensure!(
            is_valid_currency(&rec.currency),
            "recommendations[{i}].currency {:?} is not an ISO-4217 code",
            rec.currency
        );
    }
    Ok(())
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
