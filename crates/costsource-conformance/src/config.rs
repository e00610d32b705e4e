//! Runner configuration: thresholds, budgets and timeouts.

use costsource_core::{Error, HarnessConfig, MAX_PAGE_SIZE, Method, Result};
use std::time::Duration;

/// Response-time ceiling per contract method, checked by the advanced tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyBudgets {
    /// Identity query. Default: 100ms
    pub name: Duration,
    /// Capability query. Default: 50ms
    pub supports: Duration,
    /// Actual-cost query. Default: 2s
    pub actual_cost: Duration,
    /// Projected-cost query. Default: 200ms
    pub projected_cost: Duration,
    /// Pricing-spec query. Default: 200ms
    pub pricing_spec: Duration,
    /// Recommendations query. Default: 500ms
    pub recommendations: Duration,
}

impl Default for LatencyBudgets {
    fn default() -> Self {
        Self {
            name: Duration::from_millis(100),
            supports: Duration::from_millis(50),
            actual_cost: Duration::from_secs(2),
            projected_cost: Duration::from_millis(200),
            pricing_spec: Duration::from_millis(200),
            recommendations: Duration::from_millis(500),
        }
    }
}

impl LatencyBudgets {
    /// Budget for `method`.
    #[must_use]
    pub const fn for_method(&self, method: Method) -> Duration {
        match method {
            Method::Name => self.name,
            Method::Supports => self.supports,
            Method::ActualCost => self.actual_cost,
            Method::ProjectedCost => self.projected_cost,
            Method::PricingSpec => self.pricing_spec,
            Method::Recommendations => self.recommendations,
        }
    }

    /// Replaces the budget for `method`.
    #[must_use]
    pub const fn with_budget(mut self, method: Method, budget: Duration) -> Self {
        match method {
            Method::Name => self.name = budget,
            Method::Supports => self.supports = budget,
            Method::ActualCost => self.actual_cost = budget,
            Method::ProjectedCost => self.projected_cost = budget,
            Method::PricingSpec => self.pricing_spec = budget,
            Method::Recommendations => self.recommendations = budget,
        }
        self
    }
}

/// Configuration for [`ConformanceRunner`](crate::ConformanceRunner).
///
/// # Examples
///
/// ```
/// use costsource_conformance::ConformanceConfig;
/// use std::time::Duration;
///
/// let config = ConformanceConfig::default()
///     .with_concurrency(20)
///     .with_scenario_timeout(Duration::from_secs(10));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceConfig {
    /// Transport settings for in-process endpoints.
    pub harness: HarnessConfig,

    /// Concurrent calls issued by the standard-tier concurrency scenario.
    ///
    /// Default: 10
    pub concurrency: usize,

    /// Concurrent calls issued by the advanced-tier stress scenario.
    ///
    /// Default: 50
    pub high_concurrency: usize,

    /// Per-method response-time ceilings.
    pub latency: LatencyBudgets,

    /// Wall-clock limit for one scenario; exceeding it fails the scenario.
    ///
    /// Default: 30 seconds
    pub scenario_timeout: Duration,

    /// Deadline attached to every individual call a scenario makes.
    ///
    /// Default: 5 seconds
    pub call_timeout: Duration,

    /// Deadline used by the deadline-propagation scenario.
    ///
    /// Default: 100ms
    pub cancellation_deadline: Duration,

    /// Extra time a plugin gets to notice an expired deadline.
    ///
    /// Default: 1 second
    pub cancellation_slack: Duration,

    /// Page size used when paging through recommendations.
    ///
    /// Default: 50
    pub page_size: u32,

    /// Pages fetched before pagination is declared non-terminating.
    ///
    /// Default: 100
    pub max_pages: usize,

    /// Length in days of the large actual-cost window.
    ///
    /// Default: 30
    pub large_window_days: u32,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            concurrency: 10,
            high_concurrency: 50,
            latency: LatencyBudgets::default(),
            scenario_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(5),
            cancellation_deadline: Duration::from_millis(100),
            cancellation_slack: Duration::from_secs(1),
            page_size: 50,
            max_pages: 100,
            large_window_days: 30,
        }
    }
}

impl ConformanceConfig {
    /// Sets the standard-tier concurrency threshold.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the advanced-tier concurrency threshold.
    #[must_use]
    pub const fn with_high_concurrency(mut self, concurrency: usize) -> Self {
        self.high_concurrency = concurrency;
        self
    }

    /// Sets the latency budgets.
    #[must_use]
    pub const fn with_latency(mut self, latency: LatencyBudgets) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the per-scenario timeout.
    #[must_use]
    pub const fn with_scenario_timeout(mut self, timeout: Duration) -> Self {
        self.scenario_timeout = timeout;
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the transport configuration for in-process endpoints.
    #[must_use]
    pub fn with_harness(mut self, harness: HarnessConfig) -> Self {
        self.harness = harness;
        self
    }

    /// Checks thresholds and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the first unusable setting.
    pub fn validate(&self) -> Result<()> {
        self.harness.validate()?;
        if self.concurrency == 0 || self.high_concurrency == 0 {
            return Err(config_error("concurrency thresholds must be greater than zero"));
        }
        if self.scenario_timeout.is_zero() || self.call_timeout.is_zero() {
            return Err(config_error("scenario and call timeouts must be non-zero"));
        }
        if self.cancellation_deadline.is_zero() {
            return Err(config_error("cancellation_deadline must be non-zero"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(config_error(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.max_pages == 0 || self.large_window_days == 0 {
            return Err(config_error("max_pages and large_window_days must be non-zero"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::ConfigError {
        message: message.into(),
    }
}
