//! Tiered conformance runner for cost-source plugins.
//!
//! A plugin is exercised through a fixed battery of scenarios grouped into
//! three cumulative tiers:
//!
//! - [`ConformanceLevel::Basic`]: one minimal valid call per method, with
//!   structural checks on every response.
//! - [`ConformanceLevel::Standard`]: correct error classification for
//!   malformed input, "no data" expressed as a fallback hint rather than an
//!   error, concurrent calls without cross-talk, idempotence.
//! - [`ConformanceLevel::Advanced`]: per-method latency budgets, high
//!   concurrency, deadline propagation and large result sets.
//!
//! Running a tier re-runs every tier below it first, so a regression at a
//! lower tier is never hidden by a higher-tier report.
//!
//! # Examples
//!
//! ```no_run
//! use costsource_conformance::{ConformanceConfig, ConformanceRunner, PluginEndpoint};
//! use costsource_core::traits::CostSourcePlugin;
//! use std::sync::Arc;
//!
//! # async fn example(plugin: Arc<dyn CostSourcePlugin>) {
//! let runner = ConformanceRunner::new(ConformanceConfig::default());
//! let result = runner.run_advanced(&PluginEndpoint::in_process(plugin)).await;
//!
//! println!("{}", result.render_report());
//! assert!(result.is_success(), "{}", result.summary);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod endpoint;
mod level;
mod result;
mod runner;
mod scenario;

pub use config::{ConformanceConfig, LatencyBudgets};
pub use endpoint::PluginEndpoint;
pub use level::ConformanceLevel;
pub use result::{ConformanceResult, ScenarioFailure, ScenarioOutcome};
pub use runner::ConformanceRunner;
