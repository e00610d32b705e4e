//! In-process transport for cost-source plugins.
//!
//! This crate lets tests reach a plugin implementation without a network
//! listener while keeping the call semantics a real connection has: every
//! request and response crosses a serialization boundary, errors arrive as
//! classified [`Status`](costsource_core::Status) values, and caller
//! deadlines and cancellation propagate to the server.
//!
//! # Architecture
//!
//! - [`PluginHarness`] owns the lifecycle: `start` binds a plugin to one end
//!   of a `tokio::io::duplex` pipe, `client` hands out handles to the other
//!   end, `stop` drains and tears down.
//! - Frames are JSON documents in a length-delimited envelope
//!   (`tokio_util::codec::LengthDelimitedCodec`).
//! - The server runs each call in its own task, so a slow call never blocks
//!   the others.
//!
//! # Examples
//!
//! ```no_run
//! use costsource_core::traits::CostSourcePlugin;
//! use costsource_core::{ActualCostRequest, CallContext};
//! use costsource_transport::PluginHarness;
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! # async fn example(plugin: Arc<dyn CostSourcePlugin>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut harness = PluginHarness::serve(plugin)?;
//! let client = harness.client()?;
//!
//! let end = Utc::now();
//! let request = ActualCostRequest::new("i-0abc", end - Duration::days(1), end);
//! let ctx = CallContext::with_timeout(std::time::Duration::from_secs(2));
//! let result = client.actual_cost(&ctx, request).await?;
//! println!("{} line items, hint {:?}", result.results.len(), result.fallback_hint);
//!
//! harness.stop().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod client;
mod frame;
mod harness;
mod server;

pub use client::PluginClient;
pub use harness::PluginHarness;
