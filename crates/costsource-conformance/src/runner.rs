//! Drives the scenario battery against one endpoint.

use crate::config::ConformanceConfig;
use crate::endpoint::PluginEndpoint;
use crate::level::ConformanceLevel;
use crate::result::{ConformanceResult, ScenarioOutcome};
use crate::scenario::{Scenario, ScenarioContext};
use chrono::Utc;
use costsource_core::NameRequest;
use std::sync::Arc;
use tokio::time::Instant;

/// Runs conformance tiers against a plugin and reports the outcome.
///
/// Scenarios run one after another, each in its own task bounded by
/// [`ConformanceConfig::scenario_timeout`]. A failing, panicking or hanging
/// scenario is recorded and the run moves on. Only a failure to reach the
/// plugin at all aborts the run.
///
/// # Examples
///
/// ```no_run
/// use costsource_conformance::{ConformanceConfig, ConformanceRunner, PluginEndpoint};
/// use costsource_core::traits::CostSourcePlugin;
/// use std::sync::Arc;
///
/// # async fn example(plugin: Arc<dyn CostSourcePlugin>) {
/// let runner = ConformanceRunner::new(ConformanceConfig::default());
/// let result = runner.run_standard(&PluginEndpoint::in_process(plugin)).await;
/// assert_eq!(result.failed, 0, "{}", result.summary);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConformanceRunner {
    config: Arc<ConformanceConfig>,
}

impl ConformanceRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(config: ConformanceConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The runner's configuration.
    #[must_use]
    pub fn config(&self) -> &ConformanceConfig {
        &self.config
    }

    /// Runs the basic battery.
    pub async fn run_basic(&self, endpoint: &PluginEndpoint) -> ConformanceResult {
        self.run(ConformanceLevel::Basic, endpoint).await
    }

    /// Runs the basic then the standard battery.
    pub async fn run_standard(&self, endpoint: &PluginEndpoint) -> ConformanceResult {
        self.run(ConformanceLevel::Standard, endpoint).await
    }

    /// Runs every battery.
    pub async fn run_advanced(&self, endpoint: &PluginEndpoint) -> ConformanceResult {
        self.run(ConformanceLevel::Advanced, endpoint).await
    }

    /// Runs `level` and every tier below it.
    pub async fn run(&self, level: ConformanceLevel, endpoint: &PluginEndpoint) -> ConformanceResult {
        let started_at = Utc::now();
        let started = Instant::now();

        let opened = self
            .config
            .validate()
            .and_then(|()| endpoint.open(&self.config.harness));
        let opened = match opened {
            Ok(opened) => opened,
            Err(e) => {
                tracing::error!(%level, ?endpoint, error = %e, "Conformance run aborted");
                return ConformanceResult::infrastructure(
                    level,
                    e.to_string(),
                    started_at,
                    started.elapsed(),
                );
            }
        };

        let cx = ScenarioContext {
            plugin: opened.plugin,
            capabilities: opened.capabilities,
            config: Arc::clone(&self.config),
        };
        let plugin_name = self.identify(&cx).await;

        tracing::info!(
            %level,
            plugin = plugin_name.as_deref().unwrap_or("<unknown>"),
            recommendations = cx.capabilities.recommendations,
            "Starting conformance run"
        );

        let mut outcomes = Vec::new();
        for scenario in Scenario::battery(level) {
            outcomes.push(self.execute(scenario, &cx).await);
        }

        if let Some(mut harness) = opened.harness {
            harness.stop().await;
        }

        let result = ConformanceResult::from_outcomes(
            level,
            plugin_name,
            outcomes,
            started_at,
            started.elapsed(),
        );
        if result.is_success() {
            tracing::info!(summary = %result.summary, "Conformance run passed");
        } else {
            tracing::warn!(summary = %result.summary, "Conformance run failed");
        }
        result
    }

    /// Best-effort identity query, isolated like a scenario so a plugin that
    /// panics or hangs still gets a report.
    async fn identify(&self, cx: &ScenarioContext) -> Option<String> {
        let cx = cx.clone();
        let mut task = tokio::spawn(async move {
            cx.plugin()
                .name(&cx.call_ctx(), NameRequest::default())
                .await
                .map(|response| response.name)
        });
        let outcome = tokio::time::timeout(self.config.scenario_timeout, &mut task).await;
        task.abort();
        match outcome {
            Ok(Ok(Ok(name))) => Some(name),
            _ => None,
        }
    }

    async fn execute(&self, scenario: Scenario, cx: &ScenarioContext) -> ScenarioOutcome {
        let name = scenario.name();
        let started = Instant::now();
        let mut task = tokio::spawn(scenario.execute(cx.clone()));

        let failure = match tokio::time::timeout(self.config.scenario_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => None,
            Ok(Ok(Err(reason))) => Some(reason),
            Ok(Err(e)) if e.is_panic() => Some(format!("scenario panicked: {}", panic_message(e))),
            Ok(Err(e)) => Some(format!("scenario task failed: {e}")),
            Err(_) => {
                task.abort();
                Some(format!(
                    "scenario timed out after {:?}",
                    self.config.scenario_timeout
                ))
            }
        };
        let duration = started.elapsed();

        match &failure {
            None => tracing::debug!(scenario = %name, ?duration, "Scenario passed"),
            Some(reason) => tracing::warn!(scenario = %name, %reason, "Scenario failed"),
        }

        ScenarioOutcome {
            scenario: name,
            level: scenario.level(),
            failure,
            duration,
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
