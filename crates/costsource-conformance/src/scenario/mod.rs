//! The scenario battery.
//!
//! Each scenario is a variant of [`Scenario`] belonging to one tier. Its body
//! returns a [`Verdict`]: `Ok(())` to pass or a failure reason.

mod advanced;
mod basic;
mod standard;

use crate::config::ConformanceConfig;
use crate::level::ConformanceLevel;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{
    ActualCostRequest, CallContext, Method, NameRequest, PluginCapabilities, PricingSpecRequest,
    ProjectedCostRequest, RecommendationsRequest, RecommendationsResponse, RegisteredPlugin,
    ResourceDescriptor, Status, SupportsRequest, unsupported_recommendations,
};
use std::sync::Arc;

/// Outcome of a scenario body.
pub(crate) type Verdict = Result<(), String>;

/// Fails the enclosing scenario with a formatted reason unless `$cond` holds.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err(format!($($arg)+));
        }
    };
}
pub(crate) use ensure;

/// One conformance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scenario {
    BasicName,
    BasicSupports,
    BasicActualCost,
    BasicProjectedCost,
    BasicPricingSpec,
    BasicRecommendations,
    InvertedWindow,
    EmptyResourceId,
    MissingProvider,
    MissingResourceType,
    OversizedPage,
    AbsentDataIsNotAnError,
    HintConsistency,
    Concurrency,
    Idempotence,
    Latency(Method),
    HighConcurrency,
    DeadlinePropagation,
    LargeActualCostWindow,
    RecommendationsPagination,
}

impl Scenario {
    /// Scenarios of exactly `level`, in execution order.
    fn tier(level: ConformanceLevel) -> Vec<Self> {
        match level {
            ConformanceLevel::Basic => vec![
                Self::BasicName,
                Self::BasicSupports,
                Self::BasicActualCost,
                Self::BasicProjectedCost,
                Self::BasicPricingSpec,
                Self::BasicRecommendations,
            ],
            ConformanceLevel::Standard => vec![
                Self::InvertedWindow,
                Self::EmptyResourceId,
                Self::MissingProvider,
                Self::MissingResourceType,
                Self::OversizedPage,
                Self::AbsentDataIsNotAnError,
                Self::HintConsistency,
                Self::Concurrency,
                Self::Idempotence,
            ],
            ConformanceLevel::Advanced => Method::ALL
                .into_iter()
                .map(Self::Latency)
                .chain([
                    Self::HighConcurrency,
                    Self::DeadlinePropagation,
                    Self::LargeActualCostWindow,
                    Self::RecommendationsPagination,
                ])
                .collect(),
        }
    }

    /// The cumulative battery for `level`: every lower tier first.
    pub(crate) fn battery(level: ConformanceLevel) -> Vec<Self> {
        ConformanceLevel::ALL
            .into_iter()
            .filter(|&tier| level.includes(tier))
            .flat_map(Self::tier)
            .collect()
    }

    pub(crate) fn name(self) -> String {
        let name = match self {
            Self::BasicName => "basic.name",
            Self::BasicSupports => "basic.supports",
            Self::BasicActualCost => "basic.actual_cost",
            Self::BasicProjectedCost => "basic.projected_cost",
            Self::BasicPricingSpec => "basic.pricing_spec",
            Self::BasicRecommendations => "basic.recommendations",
            Self::InvertedWindow => "standard.actual_cost.inverted_window",
            Self::EmptyResourceId => "standard.actual_cost.empty_resource_id",
            Self::MissingProvider => "standard.supports.missing_provider",
            Self::MissingResourceType => "standard.projected_cost.missing_resource_type",
            Self::OversizedPage => "standard.recommendations.oversized_page",
            Self::AbsentDataIsNotAnError => "standard.actual_cost.absent_data",
            Self::HintConsistency => "standard.actual_cost.hint_consistency",
            Self::Concurrency => "standard.concurrency",
            Self::Idempotence => "standard.idempotence",
            Self::Latency(method) => return format!("advanced.latency.{method}"),
            Self::HighConcurrency => "advanced.high_concurrency",
            Self::DeadlinePropagation => "advanced.deadline_propagation",
            Self::LargeActualCostWindow => "advanced.large_result_set.actual_cost",
            Self::RecommendationsPagination => "advanced.large_result_set.recommendations",
        };
        name.to_string()
    }

    pub(crate) const fn level(self) -> ConformanceLevel {
        match self {
            Self::BasicName
            | Self::BasicSupports
            | Self::BasicActualCost
            | Self::BasicProjectedCost
            | Self::BasicPricingSpec
            | Self::BasicRecommendations => ConformanceLevel::Basic,
            Self::InvertedWindow
            | Self::EmptyResourceId
            | Self::MissingProvider
            | Self::MissingResourceType
            | Self::OversizedPage
            | Self::AbsentDataIsNotAnError
            | Self::HintConsistency
            | Self::Concurrency
            | Self::Idempotence => ConformanceLevel::Standard,
            Self::Latency(_)
            | Self::HighConcurrency
            | Self::DeadlinePropagation
            | Self::LargeActualCostWindow
            | Self::RecommendationsPagination => ConformanceLevel::Advanced,
        }
    }

    pub(crate) async fn execute(self, cx: ScenarioContext) -> Verdict {
        match self {
            Self::BasicName => basic::name(&cx).await,
            Self::BasicSupports => basic::supports(&cx).await,
            Self::BasicActualCost => basic::actual_cost(&cx).await,
            Self::BasicProjectedCost => basic::projected_cost(&cx).await,
            Self::BasicPricingSpec => basic::pricing_spec(&cx).await,
            Self::BasicRecommendations => basic::recommendations(&cx).await,
            Self::InvertedWindow => standard::inverted_window(&cx).await,
            Self::EmptyResourceId => standard::empty_resource_id(&cx).await,
            Self::MissingProvider => standard::missing_provider(&cx).await,
            Self::MissingResourceType => standard::missing_resource_type(&cx).await,
            Self::OversizedPage => standard::oversized_page(&cx).await,
            Self::AbsentDataIsNotAnError => standard::absent_data(&cx).await,
            Self::HintConsistency => standard::hint_consistency(&cx).await,
            Self::Concurrency => standard::concurrency(&cx).await,
            Self::Idempotence => standard::idempotence(&cx).await,
            Self::Latency(method) => advanced::latency(&cx, method).await,
            Self::HighConcurrency => advanced::high_concurrency(&cx).await,
            Self::DeadlinePropagation => advanced::deadline_propagation(&cx).await,
            Self::LargeActualCostWindow => advanced::large_actual_cost_window(&cx).await,
            Self::RecommendationsPagination => advanced::recommendations_pagination(&cx).await,
        }
    }
}

/// What a scenario body gets to work with.
#[derive(Debug, Clone)]
pub(crate) struct ScenarioContext {
    pub(crate) plugin: RegisteredPlugin,
    pub(crate) capabilities: PluginCapabilities,
    pub(crate) config: Arc<ConformanceConfig>,
}

impl ScenarioContext {
    pub(crate) fn plugin(&self) -> &Arc<dyn CostSourcePlugin> {
        self.plugin.plugin()
    }

    /// A fresh context bounded by the configured per-call timeout.
    pub(crate) fn call_ctx(&self) -> CallContext {
        CallContext::with_timeout(self.config.call_timeout)
    }

    /// Routes a recommendations query the way a server would: to the
    /// provider when the capability exists, to an empty page otherwise.
    pub(crate) async fn recommendations(
        &self,
        ctx: &CallContext,
        request: RecommendationsRequest,
    ) -> Result<RecommendationsResponse, Status> {
        match self.plugin.recommendations() {
            Some(provider) => provider.recommendations(ctx, request).await,
            None => Ok(unsupported_recommendations()),
        }
    }

    /// Issues a minimal valid call of `method`, discarding the response.
    pub(crate) async fn call_minimal(&self, method: Method) -> Result<(), Status> {
        let ctx = self.call_ctx();
        let plugin = self.plugin();
        match method {
            Method::Name => plugin.name(&ctx, NameRequest::default()).await.map(drop),
            Method::Supports => plugin
                .supports(&ctx, SupportsRequest { resource: reference_resource() })
                .await
                .map(drop),
            Method::ActualCost => plugin
                .actual_cost(&ctx, reference_window("conformance-resource", 24))
                .await
                .map(drop),
            Method::ProjectedCost => plugin
                .projected_cost(&ctx, ProjectedCostRequest { resource: reference_resource() })
                .await
                .map(drop),
            Method::PricingSpec => plugin
                .pricing_spec(&ctx, PricingSpecRequest { resource: reference_resource() })
                .await
                .map(drop),
            Method::Recommendations => self
                .recommendations(&ctx, minimal_recommendations_request(self.config.page_size))
                .await
                .map(drop),
        }
    }
}

/// The descriptor every descriptor-based scenario prices.
pub(crate) fn reference_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("aws", "ec2")
        .with_sku("t3.micro")
        .with_region("us-east-1")
}

/// Hour-aligned window of `hours` ending at the start of the current hour.
pub(crate) fn reference_window(resource_id: &str, hours: u32) -> ActualCostRequest {
    let end = window_end();
    ActualCostRequest::new(resource_id, end - TimeDelta::hours(i64::from(hours)), end)
}

fn window_end() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(TimeDelta::hours(1)).unwrap_or(now)
}

pub(crate) fn minimal_recommendations_request(page_size: u32) -> RecommendationsRequest {
    RecommendationsRequest {
        page_size,
        ..RecommendationsRequest::default()
    }
}

/// Unwraps a response that must have succeeded.
pub(crate) fn succeeded<T>(method: Method, outcome: Result<T, Status>) -> Result<T, String> {
    outcome.map_err(|status| format!("{method} failed on well-formed input: {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_is_cumulative_and_ordered() {
        let basic = Scenario::battery(ConformanceLevel::Basic);
        let standard = Scenario::battery(ConformanceLevel::Standard);
        let advanced = Scenario::battery(ConformanceLevel::Advanced);

        assert!(standard.starts_with(&basic));
        assert!(advanced.starts_with(&standard));
        assert!(basic.iter().all(|s| s.level() == ConformanceLevel::Basic));
        assert!(
            advanced
                .windows(2)
                .all(|pair| pair[0].level() <= pair[1].level())
        );
    }

    #[test]
    fn test_scenario_names_are_unique() {
        let mut names: Vec<_> = Scenario::battery(ConformanceLevel::Advanced)
            .into_iter()
            .map(Scenario::name)
            .collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn test_latency_scenario_per_method() {
        let latency: Vec<_> = Scenario::tier(ConformanceLevel::Advanced)
            .into_iter()
            .filter(|s| matches!(s, Scenario::Latency(_)))
            .collect();
        assert_eq!(latency.len(), Method::ALL.len());
        assert_eq!(Scenario::Latency(Method::Name).name(), "advanced.latency.name");
    }

    #[test]
    fn test_reference_window_is_hour_aligned() {
        let request = reference_window("r", 24);
        assert_eq!(request.end - request.start, TimeDelta::hours(24));
        assert!(request.validate().is_ok());
        assert_eq!(request.end.timestamp() % 3600, 0);
    }
}
