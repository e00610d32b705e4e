//! Frozen per-method behavior of a mock plugin.

use costsource_core::{
    CostQueryResult, Method, NameResponse, PricingSpecResponse, ProjectedCostResponse,
    RecommendationsResponse, Status, StatusCode, SupportsResponse,
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

/// An error the mock returns in place of a real answer.
///
/// # Examples
///
/// ```
/// use costsource_mock::InjectedError;
/// use costsource_core::{Status, StatusCode};
///
/// let err = InjectedError::unavailable("billing API down");
/// let status: Status = err.into();
/// assert_eq!(status.code(), StatusCode::Unavailable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedError {
    code: StatusCode,
    message: String,
}

impl InjectedError {
    /// Creates an injected error of any classification.
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An "invalid input" failure.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    /// A "not found" failure.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    /// A "temporarily unavailable" failure.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// An "internal" failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// The classification the call will fail with.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// The message the call will fail with.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<InjectedError> for Status {
    fn from(err: InjectedError) -> Self {
        Self::new(err.code, err.message)
    }
}

impl From<&InjectedError> for Status {
    fn from(err: &InjectedError) -> Self {
        Self::new(err.code, err.message.clone())
    }
}

/// A canned success response for one contract method.
///
/// The variant determines which method the response belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// Identity query response.
    Name(NameResponse),
    /// Capability query response.
    Supports(SupportsResponse),
    /// Actual-cost query response.
    ActualCost(CostQueryResult),
    /// Projected-cost query response.
    ProjectedCost(ProjectedCostResponse),
    /// Pricing-spec query response.
    PricingSpec(PricingSpecResponse),
    /// Recommendations query response.
    Recommendations(RecommendationsResponse),
}

impl MethodResponse {
    /// The method this response answers.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::Name(_) => Method::Name,
            Self::Supports(_) => Method::Supports,
            Self::ActualCost(_) => Method::ActualCost,
            Self::ProjectedCost(_) => Method::ProjectedCost,
            Self::PricingSpec(_) => Method::PricingSpec,
            Self::Recommendations(_) => Method::Recommendations,
        }
    }
}

macro_rules! impl_from_response {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for MethodResponse {
                fn from(response: $ty) -> Self {
                    Self::$variant(response)
                }
            }
        )*
    };
}

impl_from_response! {
    NameResponse => Name,
    SupportsResponse => Supports,
    CostQueryResult => ActualCost,
    ProjectedCostResponse => ProjectedCost,
    PricingSpecResponse => PricingSpec,
    RecommendationsResponse => Recommendations,
}

/// Configured behavior of one method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBehavior {
    /// Returned instead of any response; wins over canned responses.
    pub error: Option<InjectedError>,
    /// Minimum time to wait before answering, success or error.
    pub delay: Option<Duration>,
    /// Canned response for every call.
    pub response: Option<MethodResponse>,
    /// Canned responses by call-site key, consulted before `response`.
    pub keyed: HashMap<String, MethodResponse>,
}

impl MethodBehavior {
    /// The canned response for `key`, falling back to the method-wide one.
    #[must_use]
    pub fn canned(&self, key: Option<&str>) -> Option<&MethodResponse> {
        key.and_then(|k| self.keyed.get(k))
            .or(self.response.as_ref())
    }
}

/// The complete, immutable configuration of a [`MockPlugin`].
///
/// Built by [`MockPluginBuilder`] and frozen behind an `Arc` when the mock is
/// built; serving calls only ever read it.
///
/// [`MockPlugin`]: crate::MockPlugin
/// [`MockPluginBuilder`]: crate::MockPluginBuilder
#[derive(Clone, PartialEq)]
pub struct MockBehaviorConfig {
    pub(crate) name: String,
    pub(crate) methods: HashMap<Method, MethodBehavior>,
    pub(crate) recommendations_enabled: bool,
    pub(crate) recommendation_count: usize,
    pub(crate) unsupported_providers: BTreeSet<String>,
}

impl Default for MockBehaviorConfig {
    fn default() -> Self {
        Self {
            name: crate::DEFAULT_PLUGIN_NAME.to_string(),
            methods: HashMap::new(),
            recommendations_enabled: true,
            recommendation_count: 0,
            unsupported_providers: BTreeSet::new(),
        }
    }
}

impl MockBehaviorConfig {
    /// Name the mock reports from the identity query.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured behavior for `method`, if any was set.
    #[must_use]
    pub fn behavior(&self, method: Method) -> Option<&MethodBehavior> {
        self.methods.get(&method)
    }

    /// Whether the mock declares the recommendations capability.
    #[must_use]
    pub const fn recommendations_enabled(&self) -> bool {
        self.recommendations_enabled
    }

    /// Number of generated recommendations served across all pages.
    #[must_use]
    pub const fn recommendation_count(&self) -> usize {
        self.recommendation_count
    }

    /// Returns `true` when resources of `provider` are reported unsupported.
    #[must_use]
    pub fn is_unsupported_provider(&self, provider: &str) -> bool {
        self.unsupported_providers.contains(provider)
    }
}

impl fmt::Debug for MockBehaviorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configured: Vec<_> = self.methods.keys().map(|m| m.as_str()).collect();
        configured.sort_unstable();
        f.debug_struct("MockBehaviorConfig")
            .field("name", &self.name)
            .field("configured_methods", &configured)
            .field("recommendations_enabled", &self.recommendations_enabled)
            .field("recommendation_count", &self.recommendation_count)
            .field("unsupported_providers", &self.unsupported_providers)
            .finish()
    }
}
