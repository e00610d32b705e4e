//! How the runner reaches the plugin under test.

use costsource_core::traits::CostSourcePlugin;
use costsource_core::{HarnessConfig, PluginCapabilities, RegisteredPlugin, Result};
use costsource_transport::PluginHarness;
use std::fmt;
use std::sync::Arc;

/// The plugin a conformance run targets.
#[derive(Clone)]
pub enum PluginEndpoint {
    /// A plugin implementation served through a fresh in-process harness for
    /// the duration of the run, so every call crosses the transport.
    InProcess(Arc<dyn CostSourcePlugin>),
    /// A plugin used as-is, e.g. a client the caller already connected.
    Connected(Arc<dyn CostSourcePlugin>),
}

impl PluginEndpoint {
    /// Serves `plugin` through the in-process transport.
    #[must_use]
    pub fn in_process(plugin: Arc<dyn CostSourcePlugin>) -> Self {
        Self::InProcess(plugin)
    }

    /// Uses `plugin` directly.
    #[must_use]
    pub fn connected(plugin: Arc<dyn CostSourcePlugin>) -> Self {
        Self::Connected(plugin)
    }

    /// Produces the plugin handle scenarios call, plus the harness to stop
    /// afterwards when one was started.
    pub(crate) fn open(&self, config: &HarnessConfig) -> Result<OpenEndpoint> {
        match self {
            Self::InProcess(plugin) => {
                let mut harness = PluginHarness::new(config.clone());
                harness.start(Arc::clone(plugin))?;
                let client: Arc<dyn CostSourcePlugin> = Arc::new(harness.client()?);
                let registered = RegisteredPlugin::new(client);
                // The client always offers every method; what the plugin
                // behind it implements was resolved by the harness.
                let capabilities = harness
                    .capabilities()
                    .unwrap_or_else(|| registered.capabilities());
                Ok(OpenEndpoint {
                    plugin: registered,
                    capabilities,
                    harness: Some(harness),
                })
            }
            Self::Connected(plugin) => {
                let registered = RegisteredPlugin::new(Arc::clone(plugin));
                Ok(OpenEndpoint {
                    capabilities: registered.capabilities(),
                    plugin: registered,
                    harness: None,
                })
            }
        }
    }
}

/// A reachable plugin for the duration of one run.
#[derive(Debug)]
pub(crate) struct OpenEndpoint {
    pub(crate) plugin: RegisteredPlugin,
    pub(crate) capabilities: PluginCapabilities,
    pub(crate) harness: Option<PluginHarness>,
}

impl fmt::Debug for PluginEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProcess(_) => f.write_str("PluginEndpoint::InProcess"),
            Self::Connected(_) => f.write_str("PluginEndpoint::Connected"),
        }
    }
}
