//! Routes actual-cost queries through a chain of plugins.
//!
//! The chain asks the public price list first, which always defers, then the
//! billing export. Three resources show the possible outcomes: data from the
//! second plugin, no plugin able to help, and a plugin failure.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fallback_chain
//! ```

use anyhow::Result;
use chrono::{Duration as ChronoDuration, DurationRound, Utc};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{ActualCostRequest, CallContext};
use costsource_examples::fixtures::{self, KNOWN_INSTANCE};
use costsource_examples::logging::{LogFormat, init_logging};
use costsource_fallback::{FallbackChain, FallbackError};
use costsource_transport::PluginHarness;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(false, LogFormat::Pretty)?;

    let end = Utc::now().duration_trunc(ChronoDuration::hours(1))?;
    let start = end - ChronoDuration::hours(24);

    // The billing export sits behind the transport, as a remote plugin would.
    let mut harness = PluginHarness::serve(Arc::new(fixtures::billing_export(start)))?;
    let billing: Arc<dyn CostSourcePlugin> = Arc::new(harness.client()?);

    let chain = FallbackChain::new()
        .with_plugin("aws-public-pricing", Arc::new(fixtures::public_pricing()))
        .with_plugin("billing-export", billing);
    let ctx = CallContext::background();
    tracing::info!(plugins = chain.len(), "Fallback chain ready");

    for resource in [KNOWN_INSTANCE, "i-unknown"] {
        let request = ActualCostRequest::new(resource, start, end);
        match chain.actual_cost(&ctx, &request).await {
            Ok(outcome) => {
                println!(
                    "{resource}: {:.4} {} from {} ({})",
                    outcome.response.total_cost(),
                    outcome.response.currency,
                    outcome.plugin,
                    outcome.decision
                );
                for attempt in &outcome.attempts {
                    println!(
                        "  {} -> {:?}, {} items, {}",
                        attempt.plugin, attempt.hint, attempt.items, attempt.decision
                    );
                }
            }
            Err(FallbackError::Unhandled { attempts, .. }) => {
                println!("{resource}: unhandled after {} plugins", attempts.len());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let failing = FallbackChain::new()
        .with_plugin("unreachable", Arc::new(fixtures::unreachable_source()))
        .with_plugin("aws-public-pricing", Arc::new(fixtures::public_pricing()));
    let request = ActualCostRequest::new(KNOWN_INSTANCE, start, end);
    if let Err(e) = failing.actual_cost(&ctx, &request).await {
        println!("{KNOWN_INSTANCE}: {e}");
    }

    harness.stop().await;
    Ok(())
}
