//! Plugin contract traits.
//!
//! # Module Structure
//!
//! - `plugin` - the mandatory contract ([`CostSourcePlugin`])
//! - `recommendations` - the optional recommendations capability
//!   ([`RecommendationsProvider`])
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use costsource_core::traits::CostSourcePlugin;
//! use costsource_core::{
//!     ActualCostRequest, CallContext, CostQueryResult, FallbackHint, NameRequest, NameResponse,
//!     PricingSpecRequest, PricingSpecResponse, ProjectedCostRequest, ProjectedCostResponse,
//!     Status, SupportsRequest, SupportsResponse,
//! };
//!
//! struct FreeTier;
//!
//! #[async_trait]
//! impl CostSourcePlugin for FreeTier {
//!     async fn name(&self, _ctx: &CallContext, _req: NameRequest) -> Result<NameResponse, Status> {
//!         Ok(NameResponse { name: "free-tier".to_string() })
//!     }
//!
//!     async fn supports(
//!         &self,
//!         _ctx: &CallContext,
//!         req: SupportsRequest,
//!     ) -> Result<SupportsResponse, Status> {
//!         req.validate()?;
//!         Ok(SupportsResponse { supported: true, ..Default::default() })
//!     }
//!
//!     async fn actual_cost(
//!         &self,
//!         _ctx: &CallContext,
//!         req: ActualCostRequest,
//!     ) -> Result<CostQueryResult, Status> {
//!         req.validate()?;
//!         // Free resources: empty and authoritative.
//!         Ok(CostQueryResult { fallback_hint: FallbackHint::None, ..Default::default() })
//!     }
//!
//!     async fn projected_cost(
//!         &self,
//!         _ctx: &CallContext,
//!         req: ProjectedCostRequest,
//!     ) -> Result<ProjectedCostResponse, Status> {
//!         req.validate()?;
//!         Ok(ProjectedCostResponse { currency: "USD".to_string(), ..Default::default() })
//!     }
//!
//!     async fn pricing_spec(
//!         &self,
//!         _ctx: &CallContext,
//!         req: PricingSpecRequest,
//!     ) -> Result<PricingSpecResponse, Status> {
//!         req.validate()?;
//!         Ok(PricingSpecResponse::default())
//!     }
//! }
//! ```

mod plugin;
mod recommendations;

pub use plugin::CostSourcePlugin;
pub use recommendations::RecommendationsProvider;
