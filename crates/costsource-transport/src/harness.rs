//! Lifecycle of one in-process plugin binding.

use crate::client::PluginClient;
use crate::server::{InFlightCalls, ServerContext, serve};
use costsource_core::traits::CostSourcePlugin;
use costsource_core::{Error, HarnessConfig, PluginCapabilities, RegisteredPlugin, Result};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::codec::LengthDelimitedCodec;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug)]
struct Running {
    shutdown: CancellationToken,
    client_closed: CancellationToken,
    tracker: TaskTracker,
    in_flight: InFlightCalls,
    server: JoinHandle<()>,
    client_tasks: Vec<JoinHandle<()>>,
    client: PluginClient,
    capabilities: PluginCapabilities,
}

impl Running {
    /// Non-blocking teardown: cancel everything and abort every task.
    fn abort(&self) {
        self.shutdown.cancel();
        self.in_flight.abort_all();
        self.server.abort();
        self.client_closed.cancel();
        for task in &self.client_tasks {
            task.abort();
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Running(Box<Running>),
    Stopped,
}

/// Binds a plugin implementation to a client over an in-memory duplex pipe.
///
/// The harness never binds a real port. Its lifecycle is
/// `new` → [`start`](Self::start) → [`client`](Self::client) (any number of
/// times) → [`stop`](Self::stop). Dropping a running harness performs a
/// non-blocking teardown, so a failing test still releases its tasks.
///
/// # Examples
///
/// ```no_run
/// use costsource_core::traits::CostSourcePlugin;
/// use costsource_core::{CallContext, HarnessConfig, NameRequest};
/// use costsource_transport::PluginHarness;
/// use std::sync::Arc;
///
/// # async fn example(plugin: Arc<dyn CostSourcePlugin>) -> Result<(), Box<dyn std::error::Error>> {
/// let mut harness = PluginHarness::new(HarnessConfig::default());
/// harness.start(plugin)?;
///
/// let client = harness.client()?;
/// let name = client.name(&CallContext::background(), NameRequest::default()).await?;
/// println!("serving {}", name.name);
///
/// harness.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PluginHarness {
    config: HarnessConfig,
    state: State,
}

impl PluginHarness {
    /// Creates an idle harness.
    #[must_use]
    pub const fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    /// Creates a harness with default configuration and starts it.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn serve(plugin: Arc<dyn CostSourcePlugin>) -> Result<Self> {
        let mut harness = Self::new(HarnessConfig::default());
        harness.start(plugin)?;
        Ok(harness)
    }

    /// Binds `plugin` and starts serving.
    ///
    /// Optional capabilities are resolved here, once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an invalid configuration and
    /// [`Error::RuntimeUnavailable`] when called outside a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called a second time on the same harness, which is a bug
    /// in the calling test.
    pub fn start(&mut self, plugin: Arc<dyn CostSourcePlugin>) -> Result<()> {
        assert!(
            matches!(self.state, State::Idle),
            "PluginHarness::start called twice on the same harness"
        );

        self.config.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| Error::RuntimeUnavailable {
                message: e.to_string(),
            })?;

        let registered = RegisteredPlugin::new(plugin);
        let capabilities = registered.capabilities();
        let (client_io, server_io) = tokio::io::duplex(self.config.duplex_buffer_size);

        let shutdown = CancellationToken::new();
        let client_closed = CancellationToken::new();
        let tracker = TaskTracker::new();
        let in_flight = InFlightCalls::default();

        let server = runtime.spawn(serve(
            server_io,
            self.codec(),
            ServerContext {
                registered,
                shutdown: shutdown.clone(),
                tracker: tracker.clone(),
                in_flight: in_flight.clone(),
                max_frame_length: self.config.max_frame_length,
            },
        ));

        let (client, client_tasks) = PluginClient::connect(
            client_io,
            self.codec(),
            self.config.default_call_timeout,
            client_closed.clone(),
        );

        tracing::info!(
            recommendations = capabilities.recommendations,
            "In-process plugin transport started"
        );

        self.state = State::Running(Box::new(Running {
            shutdown,
            client_closed,
            tracker,
            in_flight,
            server,
            client_tasks,
            client,
            capabilities,
        }));
        Ok(())
    }

    /// Returns a client handle for the running plugin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportNotStarted`] before `start` and
    /// [`Error::TransportStopped`] after `stop`.
    pub fn client(&self) -> Result<PluginClient> {
        match &self.state {
            State::Idle => Err(Error::TransportNotStarted),
            State::Running(running) => Ok(running.client.clone()),
            State::Stopped => Err(Error::TransportStopped),
        }
    }

    /// Capabilities resolved at start, if running.
    #[must_use]
    pub fn capabilities(&self) -> Option<PluginCapabilities> {
        match &self.state {
            State::Running(running) => Some(running.capabilities),
            State::Idle | State::Stopped => None,
        }
    }

    /// Returns `true` between `start` and `stop`.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Stops serving and releases the in-memory endpoint.
    ///
    /// Waits for in-flight calls to finish for at most
    /// [`HarnessConfig::shutdown_grace`], then cancels and aborts the rest.
    /// New calls are refused while draining, but cancellations still reach
    /// their calls. Calling `stop` again, or before `start`, is a no-op.
    pub async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        let State::Running(running) = std::mem::replace(&mut self.state, State::Stopped) else {
            return;
        };
        let running = *running;
        let grace = self.config.shutdown_grace;

        running.shutdown.cancel();
        running.tracker.close();

        if tokio::time::timeout(grace, running.tracker.wait())
            .await
            .is_err()
        {
            let aborted = running.in_flight.abort_all();
            tracing::warn!(
                aborted,
                grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                "In-flight calls did not drain within grace period"
            );
            running.tracker.wait().await;
        }

        let mut server = running.server;
        if tokio::time::timeout(grace, &mut server).await.is_err() {
            tracing::warn!("Server task did not finish; aborting");
            server.abort();
        }

        // With the server end dropped, the client reader hits end-of-stream
        // once it has delivered every reply already written.
        let client_tasks = join_all(running.client_tasks);
        if tokio::time::timeout(grace, client_tasks).await.is_err() {
            tracing::warn!("Client tasks did not finish; closing");
        }
        running.client_closed.cancel();

        tracing::info!(
            remaining = running.in_flight.len(),
            "In-process plugin transport stopped"
        );
    }

    fn codec(&self) -> LengthDelimitedCodec {
        LengthDelimitedCodec::builder()
            .max_frame_length(self.config.max_frame_length)
            .new_codec()
    }
}

impl Drop for PluginHarness {
    fn drop(&mut self) {
        if let State::Running(running) = &self.state {
            tracing::debug!("Harness dropped while running; aborting transport tasks");
            running.abort();
        }
    }
}
