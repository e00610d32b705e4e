//! Server side of the in-process transport.
//!
//! Reads call frames, runs each call in its own task against the registered
//! plugin and writes replies back. A configured delay or slow backend in one
//! call never blocks the others.

use crate::frame::{ClientFrame, ServerFrame, decode, encode};
use costsource_core::{
    CallContext, Method, RegisteredPlugin, Status, unsupported_recommendations,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A call currently being served.
#[derive(Debug)]
struct InFlight {
    ctx: CallContext,
    abort: AbortHandle,
}

/// Calls being served, keyed by client-assigned id.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlightCalls {
    calls: Arc<Mutex<HashMap<u64, InFlight>>>,
}

impl InFlightCalls {
    fn with_calls<R>(&self, f: impl FnOnce(&mut HashMap<u64, InFlight>) -> R) -> R {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut calls)
    }

    fn cancel(&self, id: u64) {
        self.with_calls(|calls| {
            if let Some(call) = calls.get(&id) {
                call.ctx.cancel();
            }
        });
    }

    /// Number of calls still running.
    pub(crate) fn len(&self) -> usize {
        self.with_calls(|calls| calls.len())
    }

    /// Cancels and aborts every remaining call, returning how many there were.
    pub(crate) fn abort_all(&self) -> usize {
        self.with_calls(|calls| {
            let count = calls.len();
            for (_, call) in calls.drain() {
                call.ctx.cancel();
                call.abort.abort();
            }
            count
        })
    }
}

/// Shared state the server loop needs to dispatch calls.
#[derive(Debug, Clone)]
pub(crate) struct ServerContext {
    pub(crate) registered: RegisteredPlugin,
    pub(crate) shutdown: CancellationToken,
    pub(crate) tracker: TaskTracker,
    pub(crate) in_flight: InFlightCalls,
    pub(crate) max_frame_length: usize,
}

/// Serves calls arriving on `io` until client hang-up or a broken reply
/// stream.
///
/// Once `shutdown` fires the server drains: it keeps reading so that `Cancel`
/// frames still reach their calls, refuses new calls, and returns when the
/// (closed) tracker is empty.
pub(crate) async fn serve(io: DuplexStream, codec: LengthDelimitedCodec, cx: ServerContext) {
    let (mut sink, mut stream) = Framed::new(io, codec).split();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Bytes>();
    let broken = CancellationToken::new();

    let writer_broken = broken.clone();
    let writer = tokio::spawn(async move {
        while let Some(bytes) = reply_rx.recv().await {
            if let Err(e) = sink.send(bytes).await {
                tracing::warn!(error = %e, "Reply stream failed; closing transport");
                writer_broken.cancel();
                break;
            }
        }
    });

    let mut draining = false;
    loop {
        tokio::select! {
            biased;
            () = broken.cancelled() => {
                // Nobody can receive a reply any more.
                let aborted = cx.in_flight.abort_all();
                tracing::debug!(aborted, "Server closed after reply failure");
                break;
            }
            () = cx.shutdown.cancelled(), if !draining => {
                tracing::debug!("Server draining; refusing new calls");
                draining = true;
            }
            () = cx.tracker.wait(), if draining => {
                tracing::debug!("Server drained");
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(bytes)) => handle_frame(&bytes, &cx, &reply_tx, draining),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Transport read failed");
                    break;
                }
                None => {
                    tracing::debug!("Client hung up");
                    break;
                }
            }
        }
    }

    // In-flight calls hold their own reply senders; the writer drains until
    // the last of them finishes.
    drop(reply_tx);
    if let Err(e) = writer.await {
        tracing::debug!(error = %e, "Reply writer ended abnormally");
    }
}

fn handle_frame(
    bytes: &[u8],
    cx: &ServerContext,
    reply_tx: &mpsc::UnboundedSender<Bytes>,
    draining: bool,
) {
    let frame = match decode::<ClientFrame>(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable frame");
            return;
        }
    };

    match frame {
        ClientFrame::Call { id, .. } if draining => {
            tracing::debug!(call_id = id, "Refusing call during shutdown");
            let refused = Err(Status::unavailable("plugin transport is shutting down"));
            send_reply(id, refused, cx.max_frame_length, reply_tx);
        }
        ClientFrame::Call {
            id,
            method,
            timeout_ms,
            payload,
        } => spawn_call(id, &method, timeout_ms, payload, cx, reply_tx.clone()),
        ClientFrame::Cancel { id } => {
            tracing::debug!(call_id = id, "Caller cancelled call");
            cx.in_flight.cancel(id);
        }
    }
}

/// Encodes and queues one reply. A reply too large for the codec is
/// replaced by a `ResourceExhausted` status for that call alone.
fn send_reply(
    id: u64,
    outcome: Result<Value, Status>,
    max_frame_length: usize,
    reply_tx: &mpsc::UnboundedSender<Bytes>,
) {
    let bytes = match encode(&ServerFrame::Reply { id, outcome }) {
        Ok(bytes) if bytes.len() <= max_frame_length => Ok(bytes),
        Ok(bytes) => {
            tracing::warn!(
                call_id = id,
                size = bytes.len(),
                limit = max_frame_length,
                "Reply exceeds frame limit"
            );
            let status = Status::resource_exhausted(format!(
                "reply of {} bytes exceeds the {max_frame_length}-byte frame limit",
                bytes.len()
            ));
            encode(&ServerFrame::Reply {
                id,
                outcome: Err(status),
            })
        }
        Err(e) => {
            tracing::error!(call_id = id, error = %e, "Failed to encode reply");
            encode(&ServerFrame::Reply {
                id,
                outcome: Err(Status::internal(format!("failed to encode reply: {e}"))),
            })
        }
    };

    match bytes {
        Ok(bytes) => {
            // A closed channel means the server is gone and the client has
            // already seen end-of-stream.
            let _ = reply_tx.send(bytes);
        }
        Err(e) => tracing::error!(call_id = id, error = %e, "Failed to encode error reply"),
    }
}

fn spawn_call(
    id: u64,
    method: &str,
    timeout_ms: Option<u64>,
    payload: Value,
    cx: &ServerContext,
    reply_tx: mpsc::UnboundedSender<Bytes>,
) {
    let ctx = timeout_ms.map_or_else(CallContext::background, |ms| {
        CallContext::with_timeout(Duration::from_millis(ms))
    });
    let method = method.parse::<Method>();
    let task_ctx = ctx.clone();
    let registered = cx.registered.clone();
    let in_flight = cx.in_flight.clone();
    let max_frame_length = cx.max_frame_length;

    // The map lock is held across spawn so the task cannot remove its entry
    // before it has been inserted.
    cx.in_flight.with_calls(|calls| {
        let handle = cx.tracker.spawn(async move {
            let outcome = match method {
                Ok(method) => {
                    tokio::select! {
                        biased;
                        status = task_ctx.done() => Err(status),
                        outcome = dispatch(&registered, method, &task_ctx, payload) => outcome,
                    }
                }
                Err(reason) => Err(Status::unimplemented(reason)),
            };

            in_flight.with_calls(|calls| calls.remove(&id));

            if let Err(status) = &outcome {
                tracing::debug!(call_id = id, code = %status.code(), "Call failed");
            }
            send_reply(id, outcome, max_frame_length, &reply_tx);
        });
        calls.insert(
            id,
            InFlight {
                ctx,
                abort: handle.abort_handle(),
            },
        );
    });
}

/// Routes one call to the plugin. Optional capabilities come from the
/// registration, resolved once at start.
async fn dispatch(
    registered: &RegisteredPlugin,
    method: Method,
    ctx: &CallContext,
    payload: Value,
) -> Result<Value, Status> {
    let plugin = registered.plugin();
    match method {
        Method::Name => invoke(payload, |req| plugin.name(ctx, req)).await,
        Method::Supports => invoke(payload, |req| plugin.supports(ctx, req)).await,
        Method::ActualCost => invoke(payload, |req| plugin.actual_cost(ctx, req)).await,
        Method::ProjectedCost => invoke(payload, |req| plugin.projected_cost(ctx, req)).await,
        Method::PricingSpec => invoke(payload, |req| plugin.pricing_spec(ctx, req)).await,
        Method::Recommendations => match registered.recommendations() {
            Some(provider) => invoke(payload, |req| provider.recommendations(ctx, req)).await,
            None => {
                invoke(
                    payload,
                    |_: costsource_core::RecommendationsRequest| async {
                        Ok(unsupported_recommendations())
                    },
                )
                .await
            }
        },
    }
}

async fn invoke<Req, Resp, F, Fut>(payload: Value, call: F) -> Result<Value, Status>
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, Status>>,
{
    let request: Req = serde_json::from_value(payload)
        .map_err(|e| Status::invalid_argument(format!("malformed request payload: {e}")))?;
    let response = call(request).await?;
    serde_json::to_value(response)
        .map_err(|e| Status::internal(format!("failed to encode response: {e}")))
}
