//! Optional recommendations capability.

use crate::types::{RecommendationsRequest, RecommendationsResponse};
use crate::{CallContext, Status};
use async_trait::async_trait;

/// Plugins that can suggest cost optimizations implement this in addition to
/// [`CostSourcePlugin`](super::CostSourcePlugin) and return themselves from
/// [`recommendations_provider`](super::CostSourcePlugin::recommendations_provider).
#[async_trait]
pub trait RecommendationsProvider: Send + Sync {
    /// Returns one page of recommendations.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an out-of-range page size or an unknown page
    /// token.
    async fn recommendations(
        &self,
        ctx: &CallContext,
        request: RecommendationsRequest,
    ) -> Result<RecommendationsResponse, Status>;
}
