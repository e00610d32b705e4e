//! Runnable demonstrations of the cost-source plugin SDK.
//!
//! The programs under `examples/` stand up mock plugins in-process, certify
//! them with the conformance runner and route actual-cost queries through a
//! fallback chain. This library holds what they share.
//!
//! # Modules
//!
//! - [`logging`] - Subscriber setup for the demo binaries
//! - [`fixtures`] - A small lineup of realistic mock plugins

pub mod fixtures;
pub mod logging;
