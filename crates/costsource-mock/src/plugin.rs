//! Serve phase of the mock plugin.

use crate::builder::MockPluginBuilder;
use crate::config::{MethodResponse, MockBehaviorConfig};
use async_trait::async_trait;
use costsource_core::traits::{CostSourcePlugin, RecommendationsProvider};
use costsource_core::{
    ActualCostRequest, CAPABILITY_RECOMMENDATIONS, CallContext, CostQueryResult, Method,
    NameRequest, NameResponse, PricingSpec, PricingSpecRequest, PricingSpecResponse,
    ProjectedCostRequest, ProjectedCostResponse, Recommendation, RecommendationsRequest,
    RecommendationsResponse, ResourceDescriptor, Status, SupportsRequest, SupportsResponse,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Page size used when a recommendations request leaves it at zero.
pub const DEFAULT_RECOMMENDATIONS_PAGE_SIZE: usize = 50;

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_BILLING_MODE: &str = "per_hour";

/// A plugin whose answers are dictated by a frozen [`MockBehaviorConfig`].
///
/// Every call, in order:
///
/// 1. counts the call for [`call_count`](Self::call_count),
/// 2. waits out the configured delay, failing early with `Cancelled` or
///    `DeadlineExceeded` when the caller gives up,
/// 3. returns the injected error, if one is configured,
/// 4. rejects an invalid request with `InvalidArgument`,
/// 5. returns the keyed canned response, the method-wide canned response, or
///    a default success response.
///
/// The configuration is shared read-only between concurrent calls, so
/// identical calls always produce identical outcomes.
#[derive(Debug)]
pub struct MockPlugin {
    config: Arc<MockBehaviorConfig>,
    calls: [AtomicU64; Method::ALL.len()],
}

impl MockPlugin {
    /// Starts configuring a mock.
    pub fn builder() -> MockPluginBuilder {
        MockPluginBuilder::new()
    }

    pub(crate) fn from_config(config: MockBehaviorConfig) -> Self {
        Self {
            config: Arc::new(config),
            calls: Default::default(),
        }
    }

    /// The frozen configuration.
    #[must_use]
    pub fn config(&self) -> &MockBehaviorConfig {
        &self.config
    }

    /// Number of calls of `method` received so far, including failed ones.
    #[must_use]
    pub fn call_count(&self, method: Method) -> u64 {
        self.calls[slot(method)].load(Ordering::Relaxed)
    }

    /// Shared steps 1 to 3: count, delay, injected error.
    async fn prelude(&self, ctx: &CallContext, method: Method) -> Result<(), Status> {
        self.calls[slot(method)].fetch_add(1, Ordering::Relaxed);
        let Some(behavior) = self.config.behavior(method) else {
            return Ok(());
        };
        if let Some(delay) = behavior.delay {
            ctx.sleep(delay).await?;
        }
        if let Some(error) = &behavior.error {
            tracing::debug!(%method, code = %error.code(), "Returning injected error");
            return Err(error.into());
        }
        Ok(())
    }

    fn canned(&self, method: Method, key: Option<&str>) -> Option<&MethodResponse> {
        self.config.behavior(method)?.canned(key)
    }

    fn default_supports(&self, resource: &ResourceDescriptor) -> SupportsResponse {
        let mut capabilities = BTreeMap::new();
        capabilities.insert(
            CAPABILITY_RECOMMENDATIONS.to_string(),
            self.config.recommendations_enabled(),
        );
        if self.config.is_unsupported_provider(&resource.provider) {
            return SupportsResponse {
                supported: false,
                reason: format!("provider {} is not handled by this plugin", resource.provider),
                capabilities,
            };
        }
        SupportsResponse {
            supported: true,
            reason: String::new(),
            capabilities,
        }
    }

    fn default_recommendations(
        &self,
        request: &RecommendationsRequest,
    ) -> Result<RecommendationsResponse, Status> {
        let total = self.config.recommendation_count();
        let offset = if request.page_token.is_empty() {
            0
        } else {
            request
                .page_token
                .parse::<usize>()
                .ok()
                .filter(|&offset| offset <= total)
                .ok_or_else(|| {
                    Status::invalid_argument(format!("invalid page token: {}", request.page_token))
                })?
        };
        let page_size = match usize::try_from(request.page_size) {
            Ok(0) | Err(_) => DEFAULT_RECOMMENDATIONS_PAGE_SIZE,
            Ok(size) => size,
        };
        let end = total.min(offset.saturating_add(page_size));

        let recommendations = (offset..end).map(generated_recommendation).collect();
        let next_page_token = if end < total {
            end.to_string()
        } else {
            String::new()
        };
        Ok(RecommendationsResponse {
            recommendations,
            next_page_token,
        })
    }
}

fn slot(method: Method) -> usize {
    Method::ALL
        .iter()
        .position(|m| *m == method)
        .unwrap_or_default()
}

fn generated_recommendation(index: usize) -> Recommendation {
    let savings = u32::try_from(index % 100).map_or(0.0, f64::from);
    Recommendation {
        id: format!("rec-{index:04}"),
        resource_id: format!("mock-resource-{index:04}"),
        action: "rightsize".to_string(),
        description: "Generated by the mock plugin".to_string(),
        estimated_savings: 1.5 * (savings + 1.0),
        currency: DEFAULT_CURRENCY.to_string(),
    }
}

fn mismatch(method: Method, response: &MethodResponse) -> Status {
    Status::internal(format!(
        "mock configured a {} response for {method}",
        response.method()
    ))
}

#[async_trait]
impl CostSourcePlugin for MockPlugin {
    async fn name(&self, ctx: &CallContext, _request: NameRequest) -> Result<NameResponse, Status> {
        self.prelude(ctx, Method::Name).await?;
        match self.canned(Method::Name, None) {
            Some(MethodResponse::Name(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::Name, other)),
            None => Ok(NameResponse {
                name: self.config.name().to_string(),
            }),
        }
    }

    async fn supports(
        &self,
        ctx: &CallContext,
        request: SupportsRequest,
    ) -> Result<SupportsResponse, Status> {
        self.prelude(ctx, Method::Supports).await?;
        request.validate()?;
        match self.canned(Method::Supports, Some(&request.resource.sku)) {
            Some(MethodResponse::Supports(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::Supports, other)),
            None => Ok(self.default_supports(&request.resource)),
        }
    }

    async fn actual_cost(
        &self,
        ctx: &CallContext,
        request: ActualCostRequest,
    ) -> Result<CostQueryResult, Status> {
        self.prelude(ctx, Method::ActualCost).await?;
        request.validate()?;
        match self.canned(Method::ActualCost, Some(&request.resource_id)) {
            Some(MethodResponse::ActualCost(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::ActualCost, other)),
            None => Ok(CostQueryResult {
                currency: DEFAULT_CURRENCY.to_string(),
                ..CostQueryResult::default()
            }),
        }
    }

    async fn projected_cost(
        &self,
        ctx: &CallContext,
        request: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse, Status> {
        self.prelude(ctx, Method::ProjectedCost).await?;
        request.validate()?;
        match self.canned(Method::ProjectedCost, Some(&request.resource.sku)) {
            Some(MethodResponse::ProjectedCost(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::ProjectedCost, other)),
            None => Ok(ProjectedCostResponse {
                unit_price: 0.0,
                currency: DEFAULT_CURRENCY.to_string(),
                cost_per_month: 0.0,
                billing_detail: "mock: no pricing data".to_string(),
            }),
        }
    }

    async fn pricing_spec(
        &self,
        ctx: &CallContext,
        request: PricingSpecRequest,
    ) -> Result<PricingSpecResponse, Status> {
        self.prelude(ctx, Method::PricingSpec).await?;
        request.validate()?;
        match self.canned(Method::PricingSpec, Some(&request.resource.sku)) {
            Some(MethodResponse::PricingSpec(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::PricingSpec, other)),
            None => {
                let resource = request.resource;
                Ok(PricingSpecResponse {
                    spec: PricingSpec {
                        provider: resource.provider,
                        resource_type: resource.resource_type,
                        sku: resource.sku,
                        region: resource.region,
                        billing_mode: DEFAULT_BILLING_MODE.to_string(),
                        rate_per_unit: 0.0,
                        currency: DEFAULT_CURRENCY.to_string(),
                        description: "mock pricing".to_string(),
                    },
                })
            }
        }
    }

    fn recommendations_provider(self: Arc<Self>) -> Option<Arc<dyn RecommendationsProvider>> {
        if self.config.recommendations_enabled() {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl RecommendationsProvider for MockPlugin {
    async fn recommendations(
        &self,
        ctx: &CallContext,
        request: RecommendationsRequest,
    ) -> Result<RecommendationsResponse, Status> {
        self.prelude(ctx, Method::Recommendations).await?;
        request.validate()?;
        match self.canned(Method::Recommendations, Some(&request.page_token)) {
            Some(MethodResponse::Recommendations(response)) => Ok(response.clone()),
            Some(other) => Err(mismatch(Method::Recommendations, other)),
            None => self.default_recommendations(&request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InjectedError;
    use chrono::{Duration as ChronoDuration, Utc};
    use costsource_core::{FallbackHint, StatusCode};
    use std::time::Duration;

    fn window_request(resource_id: &str) -> ActualCostRequest {
        let end = Utc::now();
        ActualCostRequest::new(resource_id, end - ChronoDuration::hours(1), end)
    }

    #[tokio::test]
    async fn test_defaults_succeed_for_every_method() {
        let mock = Arc::new(MockPlugin::builder().build());
        let ctx = CallContext::background();
        let resource = ResourceDescriptor::new("aws", "ec2").with_sku("t3.micro");

        let name = mock.name(&ctx, NameRequest::default()).await.unwrap();
        assert_eq!(name.name, crate::DEFAULT_PLUGIN_NAME);

        let supports = mock
            .supports(&ctx, SupportsRequest { resource: resource.clone() })
            .await
            .unwrap();
        assert!(supports.supported);
        assert!(supports.has_capability(CAPABILITY_RECOMMENDATIONS));

        let actual = mock.actual_cost(&ctx, window_request("i-1")).await.unwrap();
        assert!(!actual.has_data());
        assert_eq!(actual.fallback_hint, FallbackHint::Unspecified);

        let projected = mock
            .projected_cost(&ctx, ProjectedCostRequest { resource: resource.clone() })
            .await
            .unwrap();
        assert_eq!(projected.currency, "USD");

        let spec = mock
            .pricing_spec(&ctx, PricingSpecRequest { resource })
            .await
            .unwrap();
        assert_eq!(spec.spec.sku, "t3.micro");
        assert_eq!(spec.spec.billing_mode, "per_hour");

        let recs = mock
            .recommendations(&ctx, RecommendationsRequest::default())
            .await
            .unwrap();
        assert!(recs.recommendations.is_empty());
        assert!(recs.next_page_token.is_empty());
    }

    fn canned_response(method: Method) -> MethodResponse {
        match method {
            Method::Name => NameResponse {
                name: "canned".to_string(),
            }
            .into(),
            Method::Supports => SupportsResponse {
                supported: true,
                ..SupportsResponse::default()
            }
            .into(),
            Method::ActualCost => CostQueryResult {
                fallback_hint: FallbackHint::None,
                ..CostQueryResult::default()
            }
            .into(),
            Method::ProjectedCost => ProjectedCostResponse::default().into(),
            Method::PricingSpec => PricingSpecResponse::default().into(),
            Method::Recommendations => RecommendationsResponse::default().into(),
        }
    }

    async fn call(mock: &MockPlugin, method: Method) -> Result<(), Status> {
        let ctx = CallContext::background();
        let resource = ResourceDescriptor::new("aws", "ec2").with_sku("t3.micro");
        match method {
            Method::Name => mock.name(&ctx, NameRequest::default()).await.map(drop),
            Method::Supports => mock
                .supports(&ctx, SupportsRequest { resource })
                .await
                .map(drop),
            Method::ActualCost => mock.actual_cost(&ctx, window_request("i-1")).await.map(drop),
            Method::ProjectedCost => mock
                .projected_cost(&ctx, ProjectedCostRequest { resource })
                .await
                .map(drop),
            Method::PricingSpec => mock
                .pricing_spec(&ctx, PricingSpecRequest { resource })
                .await
                .map(drop),
            Method::Recommendations => mock
                .recommendations(&ctx, RecommendationsRequest::default())
                .await
                .map(drop),
        }
    }

    #[tokio::test]
    async fn test_injected_error_wins_over_canned_response() {
        for method in Method::ALL {
            let message = format!("{method} backend down");
            let mock = MockPlugin::builder()
                .set_response(canned_response(method))
                .inject_error(method, InjectedError::unavailable(message.clone()))
                .build();

            let err = call(&mock, method).await.unwrap_err();
            assert_eq!(err.code(), StatusCode::Unavailable, "{method}");
            assert_eq!(err.message(), message);
        }
    }

    #[tokio::test]
    async fn test_injected_error_skips_request_validation() {
        let mock = MockPlugin::builder()
            .inject_error(Method::Supports, InjectedError::not_found("gone"))
            .build();

        let err = mock
            .supports(&CallContext::background(), SupportsRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let mock = MockPlugin::builder().build();
        let end = Utc::now();
        let request = ActualCostRequest::new("i-1", end, end - ChronoDuration::hours(1));

        let err = mock
            .actual_cost(&CallContext::background(), request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_keyed_response_selected_by_resource_id() {
        let mock = MockPlugin::builder()
            .set_response_for(
                "i-hinted",
                CostQueryResult {
                    fallback_hint: FallbackHint::Required,
                    ..CostQueryResult::default()
                },
            )
            .build();
        let ctx = CallContext::background();

        let hinted = mock.actual_cost(&ctx, window_request("i-hinted")).await.unwrap();
        assert_eq!(hinted.fallback_hint, FallbackHint::Required);

        let plain = mock.actual_cost(&ctx, window_request("i-other")).await.unwrap();
        assert_eq!(plain.fallback_hint, FallbackHint::Unspecified);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_honoured() {
        let mock = MockPlugin::builder()
            .set_delay(Method::Name, Duration::from_millis(100))
            .build();

        let started = tokio::time::Instant::now();
        mock.name(&CallContext::background(), NameRequest::default())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_longer_than_deadline_fails_early() {
        let mock = MockPlugin::builder()
            .set_delay(Method::Name, Duration::from_secs(10))
            .build();

        let ctx = CallContext::with_timeout(Duration::from_millis(50));
        let started = tokio::time::Instant::now();
        let err = mock.name(&ctx, NameRequest::default()).await.unwrap_err();

        assert_eq!(err.code(), StatusCode::DeadlineExceeded);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_delay() {
        let mock = MockPlugin::builder()
            .set_delay(Method::PricingSpec, Duration::from_secs(30))
            .build();
        let ctx = CallContext::background();
        ctx.cancel();

        let err = mock
            .pricing_spec(
                &ctx,
                PricingSpecRequest {
                    resource: ResourceDescriptor::new("aws", "ec2"),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::Cancelled);
    }

    #[tokio::test]
    async fn test_recommendations_paginate_without_duplicates() {
        let mock = MockPlugin::builder().recommendation_count(25).build();
        let ctx = CallContext::background();
        let mut seen = Vec::new();
        let mut token = String::new();

        loop {
            let page = mock
                .recommendations(
                    &ctx,
                    RecommendationsRequest {
                        page_size: 10,
                        page_token: token.clone(),
                        ..RecommendationsRequest::default()
                    },
                )
                .await
                .unwrap();
            assert!(page.recommendations.len() <= 10);
            seen.extend(page.recommendations.into_iter().map(|r| r.id));
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }

        assert_eq!(seen.len(), 25);
        seen.dedup();
        assert_eq!(seen.len(), 25);
        assert_eq!(seen[0], "rec-0000");
    }

    #[tokio::test]
    async fn test_bad_page_token_is_invalid_argument() {
        let mock = MockPlugin::builder().recommendation_count(5).build();
        let err = mock
            .recommendations(
                &CallContext::background(),
                RecommendationsRequest {
                    page_token: "not-a-token".to_string(),
                    ..RecommendationsRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_unsupported_provider_reports_reason() {
        let mock = MockPlugin::builder().unsupported_provider("gcp").build();
        let response = mock
            .supports(
                &CallContext::background(),
                SupportsRequest {
                    resource: ResourceDescriptor::new("gcp", "compute"),
                },
            )
            .await
            .unwrap();
        assert!(!response.supported);
        assert!(!response.reason.is_empty());
    }

    #[test]
    fn test_capability_follows_configuration() {
        let enabled = Arc::new(MockPlugin::builder().build());
        assert!(enabled.recommendations_provider().is_some());

        let disabled = Arc::new(MockPlugin::builder().without_recommendations().build());
        assert!(disabled.recommendations_provider().is_none());
    }

    #[tokio::test]
    async fn test_calls_are_counted_including_failures() {
        let mock = MockPlugin::builder()
            .inject_error(Method::Name, InjectedError::internal("boom"))
            .build();
        let ctx = CallContext::background();

        for _ in 0..3 {
            let _ = mock.name(&ctx, NameRequest::default()).await;
        }
        assert_eq!(mock.call_count(Method::Name), 3);
        assert_eq!(mock.call_count(Method::Supports), 0);
    }
}
