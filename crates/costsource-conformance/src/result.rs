//! The report a conformance run produces.

use crate::level::ConformanceLevel;
use chrono::{DateTime, Utc};
use costsource_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// A failed scenario and why it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    /// Scenario name, e.g. `standard.idempotence`.
    pub scenario: String,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Verdict and timing of one executed scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub scenario: String,
    /// Tier the scenario belongs to.
    pub level: ConformanceLevel,
    /// Failure reason; `None` when the scenario passed.
    pub failure: Option<String>,
    /// Time the scenario took.
    pub duration: Duration,
}

impl ScenarioOutcome {
    /// Returns `true` when the scenario passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Record of one conformance run.
///
/// Immutable once the runner returns it. `failures` is in scenario execution
/// order, so reports from two runs of the same plugin can be diffed.
///
/// A run that could not reach the plugin at all reports `failed = 1`, an
/// empty `failures` list and the diagnostic in `infrastructure_failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceResult {
    /// Tier that was requested.
    pub level: ConformanceLevel,
    /// Name the plugin reported, when the identity query succeeded.
    pub plugin_name: Option<String>,
    /// Scenarios attempted.
    pub total: usize,
    /// Scenarios that passed.
    pub passed: usize,
    /// Scenarios that failed.
    pub failed: usize,
    /// Failed scenarios in execution order.
    pub failures: Vec<ScenarioFailure>,
    /// Every executed scenario in execution order.
    pub outcomes: Vec<ScenarioOutcome>,
    /// Set when the run aborted before any scenario could execute.
    pub infrastructure_failure: Option<String>,
    /// One-line summary suitable for a test failure message.
    pub summary: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total run time.
    pub duration: Duration,
}

impl ConformanceResult {
    pub(crate) fn from_outcomes(
        level: ConformanceLevel,
        plugin_name: Option<String>,
        outcomes: Vec<ScenarioOutcome>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        let failures: Vec<ScenarioFailure> = outcomes
            .iter()
            .filter_map(|o| {
                o.failure.as_ref().map(|reason| ScenarioFailure {
                    scenario: o.scenario.clone(),
                    reason: reason.clone(),
                })
            })
            .collect();
        let total = outcomes.len();
        let failed = failures.len();
        let passed = total - failed;

        let summary = match failures.first() {
            None => format!("conformance {level}: {passed}/{total} scenarios passed"),
            Some(first) => format!(
                "conformance {level}: {failed} of {total} scenarios failed; first: {}: {}",
                first.scenario, first.reason
            ),
        };

        Self {
            level,
            plugin_name,
            total,
            passed,
            failed,
            failures,
            outcomes,
            infrastructure_failure: None,
            summary,
            started_at,
            duration,
        }
    }

    pub(crate) fn infrastructure(
        level: ConformanceLevel,
        diagnostic: String,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            level,
            plugin_name: None,
            total: 1,
            passed: 0,
            failed: 1,
            failures: Vec::new(),
            outcomes: Vec::new(),
            summary: format!("conformance {level} aborted: {diagnostic}"),
            infrastructure_failure: Some(diagnostic),
            started_at,
            duration,
        }
    }

    /// Returns `true` when every scenario passed and the run was not aborted.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.infrastructure_failure.is_none()
    }

    /// Highest tier whose battery, and every battery below it, fully passed.
    ///
    /// `None` when even the basic battery had a failure or the run aborted.
    #[must_use]
    pub fn level_achieved(&self) -> Option<ConformanceLevel> {
        if self.infrastructure_failure.is_some() {
            return None;
        }
        ConformanceLevel::ALL
            .into_iter()
            .take_while(|&level| {
                let mut tier = self.outcomes.iter().filter(|o| o.level == level).peekable();
                tier.peek().is_some() && tier.all(ScenarioOutcome::passed)
            })
            .last()
    }

    /// Plain-text report: one line per scenario followed by the summary.
    #[must_use]
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let plugin = self.plugin_name.as_deref().unwrap_or("<unknown>");
        let _ = writeln!(out, "Conformance report for {plugin} ({})", self.level);
        let _ = writeln!(out, "started {}", self.started_at.to_rfc3339());

        if let Some(diagnostic) = &self.infrastructure_failure {
            let _ = writeln!(out, "  ABORTED  {diagnostic}");
        }

        let width = self
            .outcomes
            .iter()
            .map(|o| o.scenario.len())
            .max()
            .unwrap_or(0);
        for outcome in &self.outcomes {
            let verdict = if outcome.passed() { "PASS" } else { "FAIL" };
            let _ = write!(
                out,
                "  {verdict}  {:<width$}  {:>8.1}ms",
                outcome.scenario,
                outcome.duration.as_secs_f64() * 1000.0,
            );
            if let Some(reason) = &outcome.failure {
                let _ = write!(out, "  {reason}");
            }
            out.push('\n');
        }

        let achieved = self
            .level_achieved()
            .map_or_else(|| "none".to_string(), |level| level.to_string());
        let _ = writeln!(out, "level achieved: {achieved}");
        let _ = writeln!(out, "{} ({:.2?})", self.summary, self.duration);
        out
    }

    /// Serializes the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`costsource_core::Error::SerializationError`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
