//! Advanced tier: latency budgets, stress and large result sets.

use super::basic::{check_cost_result, check_recommendations_page};
use super::{ScenarioContext, Verdict, ensure, reference_window, succeeded};
use costsource_core::{CallContext, Method, NameRequest, RecommendationsRequest};
use futures_util::future::join_all;
use std::collections::HashSet;
use tokio::time::Instant;

/// Methods the stress scenario cycles through.
const STRESS_METHODS: [Method; 4] = [
    Method::Name,
    Method::Supports,
    Method::ProjectedCost,
    Method::PricingSpec,
];

/// One warm-up call, then one measured call against the method's budget.
pub(super) async fn latency(cx: &ScenarioContext, method: Method) -> Verdict {
    let budget = cx.config.latency.for_method(method);
    succeeded(method, cx.call_minimal(method).await)?;

    let started = Instant::now();
    succeeded(method, cx.call_minimal(method).await)?;
    let elapsed = started.elapsed();

    ensure!(
        elapsed <= budget,
        "{method} took {elapsed:.2?}, over its {budget:?} budget"
    );
    Ok(())
}

pub(super) async fn high_concurrency(cx: &ScenarioContext) -> Verdict {
    let total = cx.config.high_concurrency;
    let calls = (0..total).map(|i| {
        let cx = cx.clone();
        let method = STRESS_METHODS[i % STRESS_METHODS.len()];
        tokio::spawn(async move { (method, cx.call_minimal(method).await) })
    });

    let mut failures = Vec::new();
    for outcome in join_all(calls).await {
        match outcome {
            Ok((_, Ok(()))) => {}
            Ok((method, Err(status))) => failures.push(format!("{method}: {status}")),
            Err(e) => failures.push(format!("task did not complete: {e}")),
        }
    }
    ensure!(
        failures.is_empty(),
        "{} of {total} concurrent calls failed; first: {}",
        failures.len(),
        failures.first().map_or("", String::as_str)
    );
    Ok(())
}

/// A call bounded by a short deadline returns promptly, and the plugin still
/// answers afterwards.
pub(super) async fn deadline_propagation(cx: &ScenarioContext) -> Verdict {
    let deadline = cx.config.cancellation_deadline;
    let bound = deadline + cx.config.cancellation_slack;
    let ctx = CallContext::with_timeout(deadline);
    let request = reference_window("conformance-resource", 24);

    match tokio::time::timeout(bound, cx.plugin().actual_cost(&ctx, request)).await {
        Err(_) => {
            return Err(format!(
                "{} did not return within {bound:?} of a {deadline:?} deadline",
                Method::ActualCost
            ));
        }
        Ok(Err(status)) if !status.is_cancellation() => {
            return Err(format!(
                "deadline-bounded {} failed with {} instead of a deadline error",
                Method::ActualCost,
                status.code()
            ));
        }
        Ok(_) => {}
    }

    cx.plugin()
        .name(&cx.call_ctx(), NameRequest::default())
        .await
        .map_err(|status| format!("plugin unusable after a deadline-bounded call: {status}"))?;
    Ok(())
}

/// A multi-week window comes back without duplicated observations.
pub(super) async fn large_actual_cost_window(cx: &ScenarioContext) -> Verdict {
    let hours = cx.config.large_window_days.saturating_mul(24);
    let request = reference_window("conformance-resource", hours);
    let result = succeeded(
        Method::ActualCost,
        cx.plugin().actual_cost(&cx.call_ctx(), request.clone()).await,
    )?;
    check_cost_result(&result, &request)?;

    let mut seen = HashSet::with_capacity(result.results.len());
    for (i, item) in result.results.iter().enumerate() {
        ensure!(
            seen.insert((item.timestamp, item.source.as_str(), item.usage_unit.as_str())),
            "results[{i}] duplicates an earlier observation at {}",
            item.timestamp
        );
    }
    Ok(())
}

/// Paging through every recommendation terminates and never repeats one.
pub(super) async fn recommendations_pagination(cx: &ScenarioContext) -> Verdict {
    let page_size = cx.config.page_size;
    let mut seen = HashSet::new();
    let mut token = String::new();

    for page_number in 0..cx.config.max_pages {
        let request = RecommendationsRequest {
            page_size,
            page_token: token.clone(),
            ..RecommendationsRequest::default()
        };
        let page = succeeded(
            Method::Recommendations,
            cx.recommendations(&cx.call_ctx(), request).await,
        )?;
        check_recommendations_page(&page, page_size)?;

        for rec in &page.recommendations {
            ensure!(
                seen.insert(rec.id.clone()),
                "recommendation {} repeated on page {page_number}",
                rec.id
            );
        }
        if page.next_page_token.is_empty() {
            return Ok(());
        }
        ensure!(
            page.next_page_token != token,
            "page token {token:?} did not advance"
        );
        token = page.next_page_token;
    }
    Err(format!(
        "pagination did not finish within {} pages",
        cx.config.max_pages
    ))
}
