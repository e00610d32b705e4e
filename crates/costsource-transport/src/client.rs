//! Client side of the in-process transport.

use crate::frame::{ClientFrame, ServerFrame, decode, encode};
use async_trait::async_trait;
use costsource_core::traits::{CostSourcePlugin, RecommendationsProvider};
use costsource_core::{
    ActualCostRequest, CallContext, CostQueryResult, Method, NameRequest, NameResponse,
    PricingSpecRequest, PricingSpecResponse, ProjectedCostRequest, ProjectedCostResponse,
    RecommendationsRequest, RecommendationsResponse, Status, SupportsRequest, SupportsResponse,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;

type Reply = Result<Value, Status>;
type FramedIo = Framed<DuplexStream, LengthDelimitedCodec>;

#[derive(Debug, Default)]
struct PendingCalls {
    calls: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
}

impl PendingCalls {
    fn insert(&self, id: u64, tx: oneshot::Sender<Reply>) {
        self.lock().insert(id, tx);
    }

    fn take(&self, id: u64) -> Option<oneshot::Sender<Reply>> {
        self.lock().remove(&id)
    }

    fn fail_all(&self, status: &Status) {
        for (_, tx) in self.lock().drain() {
            let _ = tx.send(Err(status.clone()));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Reply>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ClientInner {
    outbound: mpsc::UnboundedSender<Bytes>,
    pending: Arc<PendingCalls>,
    next_id: AtomicU64,
    default_timeout: Option<Duration>,
    closed: CancellationToken,
}

/// Handle for issuing plugin-contract calls through the in-process transport.
///
/// Cheap to clone; all clones share one connection. Once the owning harness
/// stops, every call fails with [`StatusCode::Unavailable`].
///
/// `PluginClient` implements [`CostSourcePlugin`] itself, so anything that
/// consumes a plugin can be pointed at a transport-bound one.
///
/// [`StatusCode::Unavailable`]: costsource_core::StatusCode::Unavailable
#[derive(Clone)]
pub struct PluginClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for PluginClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginClient")
            .field("closed", &self.inner.closed.is_cancelled())
            .field("default_timeout", &self.inner.default_timeout)
            .finish_non_exhaustive()
    }
}

impl PluginClient {
    /// Wires a client onto `io`, spawning its reader and writer tasks.
    pub(crate) fn connect(
        io: DuplexStream,
        codec: LengthDelimitedCodec,
        default_timeout: Option<Duration>,
        closed: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (sink, stream) = Framed::new(io, codec).split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingCalls::default());

        let writer = tokio::spawn(write_frames(sink, outbound_rx, closed.clone()));
        let reader = tokio::spawn(read_replies(stream, Arc::clone(&pending), closed.clone()));

        let client = Self {
            inner: Arc::new(ClientInner {
                outbound,
                pending,
                next_id: AtomicU64::new(1),
                default_timeout,
                closed,
            }),
        };
        (client, vec![writer, reader])
    }

    /// Returns `true` once the underlying transport is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Issues one call and waits for its reply, the caller giving up, or the
    /// transport closing, whichever happens first.
    async fn call<Req, Resp>(&self, ctx: &CallContext, method: Method, request: &Req) -> Result<Resp, Status>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let ctx = match (ctx.deadline(), self.inner.default_timeout) {
            (None, Some(timeout)) => ctx.clone().tightened(timeout),
            _ => ctx.clone(),
        };
        if ctx.is_done() {
            return Err(ctx.done().await);
        }
        if self.is_closed() {
            return Err(transport_closed());
        }

        let payload = serde_json::to_value(request)
            .map_err(|e| Status::internal(format!("failed to encode {method} request: {e}")))?;
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = ClientFrame::Call {
            id,
            method: method.as_str().to_string(),
            timeout_ms: ctx
                .remaining()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            payload,
        };
        let bytes = encode(&frame).map_err(|e| Status::internal(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(id, tx);
        // The reader marks the transport closed before failing pending calls,
        // so a call registered after that sweep is caught here.
        if self.is_closed() || self.inner.outbound.send(bytes).is_err() {
            self.inner.pending.take(id);
            return Err(transport_closed());
        }

        let reply = tokio::select! {
            biased;
            reply = rx => reply.unwrap_or_else(|_| Err(transport_closed())),
            status = ctx.done() => {
                self.inner.pending.take(id);
                if let Ok(bytes) = encode(&ClientFrame::Cancel { id }) {
                    let _ = self.inner.outbound.send(bytes);
                }
                tracing::debug!(call_id = id, %method, code = %status.code(), "Call abandoned by caller");
                return Err(status);
            }
            () = self.inner.closed.cancelled() => {
                self.inner.pending.take(id);
                Err(transport_closed())
            }
        };

        serde_json::from_value(reply?)
            .map_err(|e| Status::internal(format!("malformed {method} response: {e}")))
    }
}

fn transport_closed() -> Status {
    Status::unavailable("in-process transport is closed")
}

async fn write_frames(
    mut sink: SplitSink<FramedIo, Bytes>,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    closed: CancellationToken,
) {
    loop {
        tokio::select! {
            () = closed.cancelled() => break,
            next = outbound.recv() => match next {
                Some(bytes) => {
                    if let Err(e) = sink.send(bytes).await {
                        tracing::debug!(error = %e, "Call stream closed");
                        closed.cancel();
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

async fn read_replies(
    mut stream: SplitStream<FramedIo>,
    pending: Arc<PendingCalls>,
    closed: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            () = closed.cancelled() => break,
            frame = stream.next() => frame,
        };
        match frame {
            Some(Ok(bytes)) => match decode::<ServerFrame>(&bytes) {
                Ok(ServerFrame::Reply { id, outcome }) => {
                    // Replies to abandoned calls have no receiver left.
                    if let Some(tx) = pending.take(id) {
                        let _ = tx.send(outcome);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Dropping undecodable reply"),
            },
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Transport read failed");
                break;
            }
            None => break,
        }
    }

    closed.cancel();
    pending.fail_all(&transport_closed());
}

#[async_trait]
impl CostSourcePlugin for PluginClient {
    async fn name(&self, ctx: &CallContext, request: NameRequest) -> Result<NameResponse, Status> {
        self.call(ctx, Method::Name, &request).await
    }

    async fn supports(
        &self,
        ctx: &CallContext,
        request: SupportsRequest,
    ) -> Result<SupportsResponse, Status> {
        self.call(ctx, Method::Supports, &request).await
    }

    async fn actual_cost(
        &self,
        ctx: &CallContext,
        request: ActualCostRequest,
    ) -> Result<CostQueryResult, Status> {
        self.call(ctx, Method::ActualCost, &request).await
    }

    async fn projected_cost(
        &self,
        ctx: &CallContext,
        request: ProjectedCostRequest,
    ) -> Result<ProjectedCostResponse, Status> {
        self.call(ctx, Method::ProjectedCost, &request).await
    }

    async fn pricing_spec(
        &self,
        ctx: &CallContext,
        request: PricingSpecRequest,
    ) -> Result<PricingSpecResponse, Status> {
        self.call(ctx, Method::PricingSpec, &request).await
    }

    /// The server routes recommendations for plugins without the capability
    /// to an empty answer, so the client always offers the method.
    fn recommendations_provider(self: Arc<Self>) -> Option<Arc<dyn RecommendationsProvider>> {
        Some(self)
    }
}

#[async_trait]
impl RecommendationsProvider for PluginClient {
    async fn recommendations(
        &self,
        ctx: &CallContext,
        request: RecommendationsRequest,
    ) -> Result<RecommendationsResponse, Status> {
        self.call(ctx, Method::Recommendations, &request).await
    }
}
