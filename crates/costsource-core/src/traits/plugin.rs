//! The mandatory plugin contract.

use super::RecommendationsProvider;
use crate::types::{
    ActualCostRequest, CostQueryResult, NameRequest, NameResponse, PricingSpecRequest,
    PricingSpecResponse, ProjectedCostRequest, ProjectedCostResponse, SupportsRequest,
    SupportsResponse,
};
use crate::{CallContext, Status};
use async_trait::async_trait;
use std::sync::Arc;

/// A cost-source provider.
///
/// Implementations answer each query with a response or a classified
/// [`Status`]. A plugin must never use a `Status` to say "no data"; an empty
/// result with [`FallbackHint::Recommended`] or [`FallbackHint::Required`] is
/// the correct signal. Conversely genuine failures (bad input, backend
/// outage) must be a `Status`, never a hint.
///
/// # Type Safety
///
/// All implementations must be `Send + Sync`; a single instance serves
/// concurrent calls from many callers.
///
/// [`FallbackHint::Recommended`]: crate::FallbackHint::Recommended
/// [`FallbackHint::Required`]: crate::FallbackHint::Required
#[async_trait]
pub trait CostSourcePlugin: Send + Sync {
    /// Identity query.
    ///
    /// # Errors
    ///
    /// Implementation-defined; a conforming plugin always answers.
    async fn name(&self, ctx: &CallContext, request: NameRequest) -> Result<NameResponse, Status>;

    /// Capability-support query for one resource.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an incomplete descriptor.
    async fn supports(
        &self,
        ctx: &CallContext,
        request: SupportsRequest,
    ) -> Result<SupportsResponse, Status>;

    /// Historical cost of one resource over a window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty resource id or inverted window;
    /// `Unavailable` or `Internal` for backend failures.
    async fn actual_cost(
        &self,
        ctx: &CallContext,
        request: ActualCostRequest,
    ) -> Result<CostQueryResult, Status>;

    /// Projected monthly cost of a resource.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an incomplete descriptor.
    async fn projected_cost(
        &self,
        ctx: &CallContext,
        request: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse, Status>;

    /// Pricing specification of a resource.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an incomplete descriptor.
    async fn pricing_spec(
        &self,
        ctx: &CallContext,
        request: PricingSpecRequest,
    ) -> Result<PricingSpecResponse, Status>;

    /// Returns the optional recommendations capability, if implemented.
    ///
    /// Consulted once when the plugin is registered with a server, never per
    /// call. The default declares the capability absent.
    fn recommendations_provider(self: Arc<Self>) -> Option<Arc<dyn RecommendationsProvider>> {
        None
    }
}
