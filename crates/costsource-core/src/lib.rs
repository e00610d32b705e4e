//! Core types, traits, and errors for cost-source plugins.
//!
//! This crate provides the plugin contract shared by every other crate in the
//! workspace: the transport, the mock plugin, the conformance runner and the
//! fallback resolver all speak in terms of these types.
//!
//! # Architecture
//!
//! The core consists of:
//! - Contract shapes (requests, responses, [`FallbackHint`], [`Method`])
//! - Classified protocol errors ([`Status`], [`StatusCode`])
//! - Per-call cancellation and deadlines ([`CallContext`])
//! - The plugin traits ([`traits::CostSourcePlugin`],
//!   [`traits::RecommendationsProvider`]) and one-time capability
//!   registration ([`RegisteredPlugin`])
//! - Harness/infrastructure errors ([`Error`], [`Result`])
//! - Configuration types ([`HarnessConfig`])
//!
//! # Examples
//!
//! ```
//! use costsource_core::{CostLineItem, CostQueryResult, FallbackHint};
//! use chrono::Utc;
//!
//! let result = CostQueryResult::builder()
//!     .result(CostLineItem::new(Utc::now(), 1.25, "aws-ce"))
//!     .currency("USD")
//!     .fallback_hint(FallbackHint::None)
//!     .build()
//!     .unwrap();
//!
//! assert!(result.has_data());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod builder;
mod config;
mod context;
mod error;
mod registration;
mod status;
mod types;
mod validation;

pub mod traits;

pub use builder::CostQueryResultBuilder;
pub use config::HarnessConfig;
pub use context::CallContext;
pub use error::{Error, Result};
pub use registration::{PluginCapabilities, RegisteredPlugin, unsupported_recommendations};
pub use status::{Status, StatusCode};
pub use types::{
    ActualCostRequest, CAPABILITY_RECOMMENDATIONS, CostLineItem, CostQueryResult, FallbackHint,
    Method, NameRequest, NameResponse, PricingSpec, PricingSpecRequest, PricingSpecResponse,
    ProjectedCostRequest, ProjectedCostResponse, Recommendation, RecommendationsRequest,
    RecommendationsResponse, ResourceDescriptor, SupportsRequest, SupportsResponse,
};
pub use validation::{MAX_PAGE_SIZE, is_valid_currency};
