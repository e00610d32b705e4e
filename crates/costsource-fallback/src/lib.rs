//! Fallback-hint resolution for cost queries.
//!
//! A plugin with no data for a resource answers with an empty result and a
//! [`FallbackHint`](costsource_core::FallbackHint) rather than an error. This
//! crate turns that hint into a decision with [`resolve`], and walks an
//! ordered list of plugins with [`FallbackChain`].
//!
//! Data always wins over the hint, and a failed call is never read as a hint.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod chain;
mod decision;

pub use chain::{Attempt, ChainOutcome, FallbackChain, FallbackError};
pub use decision::{FallbackDecision, Finality, resolve};
