//! Configure phase of the mock plugin.

use crate::config::{InjectedError, MethodResponse, MockBehaviorConfig};
use crate::plugin::MockPlugin;
use costsource_core::Method;
use std::time::Duration;

/// Builder for [`MockPlugin`] instances.
///
/// All configuration happens here, before the mock serves any call.
/// [`build`](Self::build) freezes it; the resulting plugin has no setters.
///
/// # Examples
///
/// ```
/// use costsource_core::{CostQueryResult, FallbackHint, Method};
/// use costsource_mock::{InjectedError, MockPlugin};
/// use std::time::Duration;
///
/// let mock = MockPlugin::builder()
///     .name("aws-public")
///     .set_response(CostQueryResult {
///         fallback_hint: FallbackHint::Recommended,
///         ..Default::default()
///     })
///     .inject_error(Method::ProjectedCost, InjectedError::unavailable("pricing API down"))
///     .set_delay(Method::PricingSpec, Duration::from_millis(20))
///     .build();
///
/// assert_eq!(mock.config().name(), "aws-public");
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct MockPluginBuilder {
    config: MockBehaviorConfig,
}

impl MockPluginBuilder {
    /// Creates a builder with default behavior for every method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name returned by the identity query.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Returns `response` from every call of its method instead of the
    /// default. The method is inferred from the response type.
    pub fn set_response(mut self, response: impl Into<MethodResponse>) -> Self {
        let response = response.into();
        let method = response.method();
        self.config.methods.entry(method).or_default().response = Some(response);
        self
    }

    /// Returns `response` only for calls whose key matches `key`: the
    /// resource id for actual-cost queries, the SKU for descriptor-based
    /// queries, the page token for recommendations.
    pub fn set_response_for(
        mut self,
        key: impl Into<String>,
        response: impl Into<MethodResponse>,
    ) -> Self {
        let response = response.into();
        self.config
            .methods
            .entry(response.method())
            .or_default()
            .keyed
            .insert(key.into(), response);
        self
    }

    /// Makes every call of `method` fail with `error`, even when a canned
    /// response is also configured.
    pub fn inject_error(mut self, method: Method, error: InjectedError) -> Self {
        self.config.methods.entry(method).or_default().error = Some(error);
        self
    }

    /// Delays every answer of `method` by at least `delay`, unless the caller
    /// gives up first.
    pub fn set_delay(mut self, method: Method, delay: Duration) -> Self {
        self.config.methods.entry(method).or_default().delay = Some(delay);
        self
    }

    /// Declares the recommendations capability absent.
    pub const fn without_recommendations(mut self) -> Self {
        self.config.recommendations_enabled = false;
        self
    }

    /// Number of generated recommendations served across pages.
    pub const fn recommendation_count(mut self, count: usize) -> Self {
        self.config.recommendation_count = count;
        self
    }

    /// Reports resources of `provider` as unsupported.
    pub fn unsupported_provider(mut self, provider: impl Into<String>) -> Self {
        self.config.unsupported_providers.insert(provider.into());
        self
    }

    /// Freezes the configuration and produces the plugin.
    pub fn build(self) -> MockPlugin {
        tracing::debug!(config = ?self.config, "Built mock plugin");
        MockPlugin::from_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costsource_core::{CostQueryResult, NameResponse};

    #[test]
    fn test_default_builder_configures_nothing() {
        let mock = MockPluginBuilder::new().build();
        let config = mock.config();
        assert_eq!(config.name(), crate::DEFAULT_PLUGIN_NAME);
        assert!(config.recommendations_enabled());
        for method in Method::ALL {
            assert!(config.behavior(method).is_none());
        }
    }

    #[test]
    fn test_set_response_only_touches_its_method() {
        let mock = MockPluginBuilder::new()
            .set_response(NameResponse {
                name: "canned".to_string(),
            })
            .build();
        let config = mock.config();

        assert!(config.behavior(Method::Name).unwrap().response.is_some());
        assert!(config.behavior(Method::ActualCost).is_none());
    }

    #[test]
    fn test_error_and_response_coexist_in_config() {
        let mock = MockPluginBuilder::new()
            .set_response(CostQueryResult::default())
            .inject_error(Method::ActualCost, InjectedError::internal("boom"))
            .set_delay(Method::ActualCost, Duration::from_millis(5))
            .build();

        let behavior = mock.config().behavior(Method::ActualCost).unwrap();
        assert!(behavior.response.is_some());
        assert!(behavior.error.is_some());
        assert_eq!(behavior.delay, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_capability_and_provider_options() {
        let mock = MockPluginBuilder::new()
            .without_recommendations()
            .recommendation_count(12)
            .unsupported_provider("gcp")
            .build();
        let config = mock.config();

        assert!(!config.recommendations_enabled());
        assert_eq!(config.recommendation_count(), 12);
        assert!(config.is_unsupported_provider("gcp"));
        assert!(!config.is_unsupported_provider("aws"));
    }
}
