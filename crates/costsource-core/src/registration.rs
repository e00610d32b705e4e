//! One-time capability resolution for a plugin.
//!
//! Optional capabilities are discovered when a plugin is registered with a
//! server, not on every call. A plugin without the recommendations capability
//! is routed to [`unsupported_recommendations`], which answers with an empty
//! page.

use crate::traits::{CostSourcePlugin, RecommendationsProvider};
use crate::types::{Method, RecommendationsResponse};
use std::fmt;
use std::sync::Arc;

/// Optional features a registered plugin implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PluginCapabilities {
    /// The plugin implements [`RecommendationsProvider`].
    pub recommendations: bool,
}

impl PluginCapabilities {
    /// Returns `true` when the plugin implements `method`.
    ///
    /// Mandatory methods are always implemented.
    #[must_use]
    pub const fn implements(&self, method: Method) -> bool {
        match method {
            Method::Recommendations => self.recommendations,
            _ => true,
        }
    }
}

/// A plugin together with its resolved optional capabilities.
///
/// # Examples
///
/// ```no_run
/// use costsource_core::RegisteredPlugin;
/// use costsource_core::traits::CostSourcePlugin;
/// use std::sync::Arc;
///
/// fn register(plugin: Arc<dyn CostSourcePlugin>) {
///     let registered = RegisteredPlugin::new(plugin);
///     println!("recommendations: {}", registered.capabilities().recommendations);
/// }
/// ```
#[derive(Clone)]
pub struct RegisteredPlugin {
    plugin: Arc<dyn CostSourcePlugin>,
    recommendations: Option<Arc<dyn RecommendationsProvider>>,
}

impl RegisteredPlugin {
    /// Resolves the plugin's optional capabilities once.
    #[must_use]
    pub fn new(plugin: Arc<dyn CostSourcePlugin>) -> Self {
        let recommendations = Arc::clone(&plugin).recommendations_provider();
        tracing::debug!(
            recommendations = recommendations.is_some(),
            "Registered cost-source plugin"
        );
        Self {
            plugin,
            recommendations,
        }
    }

    /// The mandatory contract implementation.
    #[must_use]
    pub fn plugin(&self) -> &Arc<dyn CostSourcePlugin> {
        &self.plugin
    }

    /// The recommendations implementation, if the plugin has one.
    #[must_use]
    pub fn recommendations(&self) -> Option<&Arc<dyn RecommendationsProvider>> {
        self.recommendations.as_ref()
    }

    /// The resolved capability set.
    #[must_use]
    pub const fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities {
            recommendations: self.recommendations.is_some(),
        }
    }
}

impl fmt::Debug for RegisteredPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredPlugin")
            .field("plugin", &"dyn CostSourcePlugin")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Answer for plugins that do not implement recommendations: an empty last
/// page.
#[must_use]
pub fn unsupported_recommendations() -> RecommendationsResponse {
    RecommendationsResponse::default()
}
