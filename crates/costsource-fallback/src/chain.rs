//! Applying the decision rule across an ordered list of plugins.

use crate::decision::{FallbackDecision, resolve};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{ActualCostRequest, CallContext, CostQueryResult, FallbackHint, Status};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One plugin query made while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Name the plugin was registered under.
    pub plugin: String,
    /// Hint the plugin returned.
    pub hint: FallbackHint,
    /// Number of cost line items the plugin returned.
    pub items: usize,
    /// Decision taken on the response.
    pub decision: FallbackDecision,
}

/// The response a chain settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    /// Plugin whose response was used.
    pub plugin: String,
    /// The final response.
    pub response: CostQueryResult,
    /// Why the response is final.
    pub decision: FallbackDecision,
    /// Every query made, in order, including the final one.
    pub attempts: Vec<Attempt>,
}

/// Errors from [`FallbackChain::actual_cost`].
#[derive(Error, Debug)]
pub enum FallbackError {
    /// The chain has no plugins to ask.
    #[error("fallback chain has no plugins")]
    NoPlugins,

    /// Every plugin deferred and the last one required fallback.
    #[error("no plugin could handle resource {resource_id} ({} plugins tried)", .attempts.len())]
    Unhandled {
        /// Resource of the query.
        resource_id: String,
        /// Queries made before giving up.
        attempts: Vec<Attempt>,
    },

    /// A plugin call itself failed. Remaining plugins were not tried.
    #[error("plugin {plugin} failed: {status}")]
    Plugin {
        /// Plugin whose call failed.
        plugin: String,
        /// Classified failure.
        #[source]
        status: Status,
        /// Queries that completed before the failure.
        attempts: Vec<Attempt>,
    },
}

impl FallbackError {
    /// Returns `true` if no plugin could handle the resource.
    #[must_use]
    pub const fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled { .. })
    }

    /// Returns `true` if a plugin call failed.
    #[must_use]
    pub const fn is_plugin_error(&self) -> bool {
        matches!(self, Self::Plugin { .. })
    }

    /// Queries made before the chain stopped.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::NoPlugins => &[],
            Self::Unhandled { attempts, .. } | Self::Plugin { attempts, .. } => attempts,
        }
    }
}

struct Candidate {
    name: String,
    plugin: Arc<dyn CostSourcePlugin>,
}

/// Ordered plugins queried one after another until a response is final.
///
/// # Examples
///
/// ```no_run
/// use costsource_core::traits::CostSourcePlugin;
/// use costsource_core::{ActualCostRequest, CallContext};
/// use costsource_fallback::FallbackChain;
/// use std::sync::Arc;
///
/// # async fn example(
/// #     public_pricing: Arc<dyn CostSourcePlugin>,
/// #     billing_export: Arc<dyn CostSourcePlugin>,
/// #     request: ActualCostRequest,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let chain = FallbackChain::new()
///     .with_plugin("billing-export", billing_export)
///     .with_plugin("public-pricing", public_pricing);
///
/// let outcome = chain.actual_cost(&CallContext::background(), &request).await?;
/// println!("answered by {} after {} attempts", outcome.plugin, outcome.attempts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct FallbackChain {
    candidates: Vec<Candidate>,
}

impl FallbackChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin; earlier plugins are asked first.
    #[must_use]
    pub fn with_plugin(mut self, name: impl Into<String>, plugin: Arc<dyn CostSourcePlugin>) -> Self {
        self.push(name, plugin);
        self
    }

    /// Appends a plugin in place.
    pub fn push(&mut self, name: impl Into<String>, plugin: Arc<dyn CostSourcePlugin>) {
        self.candidates.push(Candidate {
            name: name.into(),
            plugin,
        });
    }

    /// Number of plugins in the chain.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` when the chain has no plugins.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Queries plugins in order until one response is final.
    ///
    /// # Errors
    ///
    /// - [`FallbackError::NoPlugins`] for an empty chain.
    /// - [`FallbackError::Unhandled`] when the last plugin requires fallback.
    /// - [`FallbackError::Plugin`] when a call fails; the failure is not
    ///   treated as a hint and later plugins are not tried.
    pub async fn actual_cost(
        &self,
        ctx: &CallContext,
        request: &ActualCostRequest,
    ) -> Result<ChainOutcome, FallbackError> {
        let mut attempts = Vec::with_capacity(self.candidates.len());

        for (index, candidate) in self.candidates.iter().enumerate() {
            let has_next = index + 1 < self.candidates.len();
            let response = match candidate.plugin.actual_cost(ctx, request.clone()).await {
                Ok(response) => response,
                Err(status) => {
                    tracing::warn!(
                        plugin = %candidate.name,
                        code = %status.code(),
                        "Plugin call failed; not falling back"
                    );
                    return Err(FallbackError::Plugin {
                        plugin: candidate.name.clone(),
                        status,
                        attempts,
                    });
                }
            };

            let decision = resolve(&response, has_next);
            tracing::debug!(
                plugin = %candidate.name,
                hint = ?response.fallback_hint,
                items = response.results.len(),
                %decision,
                "Resolved fallback decision"
            );
            attempts.push(Attempt {
                plugin: candidate.name.clone(),
                hint: response.fallback_hint,
                items: response.results.len(),
                decision,
            });

            match decision {
                FallbackDecision::Final(_) => {
                    return Ok(ChainOutcome {
                        plugin: candidate.name.clone(),
                        response,
                        decision,
                        attempts,
                    });
                }
                FallbackDecision::Continue => {}
                FallbackDecision::Unhandled => {
                    return Err(FallbackError::Unhandled {
                        resource_id: request.resource_id.clone(),
                        attempts,
                    });
                }
            }
        }

        // The last candidate never continues, so only an empty chain gets here.
        Err(FallbackError::NoPlugins)
    }
}

impl fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.candidates.iter().map(|c| c.name.as_str()).collect();
        f.debug_struct("FallbackChain").field("plugins", &names).finish()
    }
}
