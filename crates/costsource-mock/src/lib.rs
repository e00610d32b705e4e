//! Configurable mock cost-source plugin.
//!
//! The mock lets callers and conformance tooling exercise success, failure,
//! latency and partial-data paths without a real pricing backend. It has two
//! phases:
//!
//! - **configure**: [`MockPluginBuilder`] collects canned responses, injected
//!   errors and delays;
//! - **serve**: [`MockPlugin`] holds the frozen configuration and answers
//!   calls. It exposes no setters, so behavior cannot change while serving.
//!
//! When a method has both an injected error and a canned response, the error
//! wins.
//!
//! # Examples
//!
//! ```
//! use costsource_core::traits::CostSourcePlugin;
//! use costsource_core::{CallContext, Method, NameRequest, StatusCode};
//! use costsource_mock::{InjectedError, MockPlugin};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mock = MockPlugin::builder()
//!     .inject_error(Method::Name, InjectedError::unavailable("warming up"))
//!     .build();
//!
//! let err = mock
//!     .name(&CallContext::background(), NameRequest::default())
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.code(), StatusCode::Unavailable);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod builder;
mod config;
mod plugin;
pub mod samples;

pub use builder::MockPluginBuilder;
pub use config::{InjectedError, MethodBehavior, MethodResponse, MockBehaviorConfig};
pub use plugin::{DEFAULT_RECOMMENDATIONS_PAGE_SIZE, MockPlugin};

/// Name reported by a mock whose name was not configured.
pub const DEFAULT_PLUGIN_NAME: &str = "mock-plugin";
