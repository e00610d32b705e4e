//! Plugin contract message shapes.
//!
//! Every remote operation a cost-source plugin exposes takes one request
//! message and returns one response message. The shapes here are the
//! transport-neutral representation; the in-process transport serializes them
//! as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Capability key a plugin sets in [`SupportsResponse::capabilities`] when it
/// implements the optional recommendations query.
pub const CAPABILITY_RECOMMENDATIONS: &str = "recommendations";

/// A remote operation of the plugin contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Identity query.
    Name,
    /// Capability-support query for a resource.
    Supports,
    /// Historical (actual) cost query.
    ActualCost,
    /// Projected cost query.
    ProjectedCost,
    /// Pricing specification query.
    PricingSpec,
    /// Optional recommendations query.
    Recommendations,
}

impl Method {
    /// All contract methods in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Supports,
        Self::ActualCost,
        Self::ProjectedCost,
        Self::PricingSpec,
        Self::Recommendations,
    ];

    /// Returns the wire name of the method.
    ///
    /// # Examples
    ///
    /// ```
    /// use costsource_core::Method;
    ///
    /// assert_eq!(Method::ActualCost.as_str(), "actual_cost");
    /// assert_eq!("pricing_spec".parse::<Method>().unwrap(), Method::PricingSpec);
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Supports => "supports",
            Self::ActualCost => "actual_cost",
            Self::ProjectedCost => "projected_cost",
            Self::PricingSpec => "pricing_spec",
            Self::Recommendations => "recommendations",
        }
    }

    /// Returns `true` for methods a plugin may leave unimplemented.
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Recommendations)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown plugin method: {s}"))
    }
}

/// Advisory hint telling the caller whether other plugins should be queried.
///
/// This is an orchestration signal, not an error. A response that carries
/// cost data is authoritative regardless of its hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackHint {
    /// Not set; treated exactly like [`FallbackHint::None`].
    #[default]
    Unspecified,
    /// The plugin's answer is authoritative; do not query others.
    None,
    /// The plugin has no data for this resource; other plugins should be tried.
    Recommended,
    /// The plugin cannot service this resource type; other plugins must be tried.
    Required,
}

impl FallbackHint {
    /// Returns `true` for hints asking the caller to consult other plugins.
    #[must_use]
    pub const fn requests_fallback(self) -> bool {
        matches!(self, Self::Recommended | Self::Required)
    }
}

/// Identifies a cloud resource by provider, type, SKU and region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Cloud provider, e.g. `aws`.
    pub provider: String,
    /// Provider-specific resource type, e.g. `ec2`.
    pub resource_type: String,
    /// SKU or instance size, e.g. `t3.micro`.
    #[serde(default)]
    pub sku: String,
    /// Deployment region, e.g. `us-east-1`.
    #[serde(default)]
    pub region: String,
    /// Free-form resource tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    /// Creates a descriptor for the given provider and resource type.
    #[must_use]
    pub fn new(provider: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Sets the SKU.
    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Request for the identity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameRequest {}

/// Plugin identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameResponse {
    /// Plugin name as advertised to callers.
    pub name: String,
}

/// Request for the capability-support query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupportsRequest {
    /// Resource the caller wants costed.
    pub resource: ResourceDescriptor,
}

/// Whether the plugin can cost a resource, plus declared optional features.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupportsResponse {
    /// `true` when the plugin can answer cost queries for the resource.
    pub supported: bool,
    /// Explanation, required when `supported` is `false`.
    #[serde(default)]
    pub reason: String,
    /// Optional features keyed by name (see [`CAPABILITY_RECOMMENDATIONS`]).
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
}

impl SupportsResponse {
    /// Returns `true` when the named capability is declared and enabled.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.get(name).copied().unwrap_or(false)
    }
}

/// Request for historical cost of one resource over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActualCostRequest {
    /// Provider-specific resource identifier.
    pub resource_id: String,
    /// Inclusive window start.
    pub start: DateTime<Utc>,
    /// Exclusive window end.
    pub end: DateTime<Utc>,
    /// Tags used to narrow the query.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ActualCostRequest {
    /// Creates a request for `resource_id` over `[start, end)`.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            resource_id: resource_id.into(),
            start,
            end,
            tags: BTreeMap::new(),
        }
    }
}

/// One cost observation in a [`CostQueryResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    /// Start of the period the cost applies to.
    pub timestamp: DateTime<Utc>,
    /// Cost in the result's currency.
    pub cost: f64,
    /// Consumed quantity.
    #[serde(default)]
    pub usage_amount: f64,
    /// Unit of `usage_amount`, e.g. `hours`.
    #[serde(default)]
    pub usage_unit: String,
    /// Data source that produced the observation.
    pub source: String,
}

impl CostLineItem {
    /// Creates a line item with no usage information.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, cost: f64, source: impl Into<String>) -> Self {
        Self {
            timestamp,
            cost,
            usage_amount: 0.0,
            usage_unit: String::new(),
            source: source.into(),
        }
    }

    /// Sets usage amount and unit.
    #[must_use]
    pub fn with_usage(mut self, amount: f64, unit: impl Into<String>) -> Self {
        self.usage_amount = amount;
        self.usage_unit = unit.into();
        self
    }
}

/// Response to an actual-cost query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostQueryResult {
    /// Cost observations, possibly empty.
    #[serde(default)]
    pub results: Vec<CostLineItem>,
    /// ISO-4217 currency code of every result.
    #[serde(default)]
    pub currency: String,
    /// Whether the caller should consult other plugins.
    #[serde(default)]
    pub fallback_hint: FallbackHint,
}

impl CostQueryResult {
    /// Returns `true` when at least one cost line item is present.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.results.is_empty()
    }

    /// Returns `true` when the response carries data together with a hint
    /// asking for fallback, which is a contradictory signal.
    #[must_use]
    pub fn has_contradictory_hint(&self) -> bool {
        self.has_data() && self.fallback_hint.requests_fallback()
    }

    /// Sum of all line item costs.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.results.iter().map(|r| r.cost).sum()
    }
}

/// Request for the projected monthly cost of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectedCostRequest {
    /// Resource to price.
    pub resource: ResourceDescriptor,
}

/// Projected cost of a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedCostResponse {
    /// Price per billing unit.
    pub unit_price: f64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Projected cost for a 730-hour month.
    pub cost_per_month: f64,
    /// Human-readable billing detail.
    #[serde(default)]
    pub billing_detail: String,
}

/// Request for the pricing specification of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingSpecRequest {
    /// Resource to describe.
    pub resource: ResourceDescriptor,
}

/// Pricing specification for one resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingSpec {
    /// Provider the spec applies to.
    pub provider: String,
    /// Resource type the spec applies to.
    pub resource_type: String,
    /// SKU the spec applies to.
    #[serde(default)]
    pub sku: String,
    /// Region the spec applies to.
    #[serde(default)]
    pub region: String,
    /// Billing mode, e.g. `per_hour`.
    pub billing_mode: String,
    /// Price per billing unit.
    pub rate_per_unit: f64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Response to a pricing-spec query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingSpecResponse {
    /// The pricing specification.
    pub spec: PricingSpec,
}

/// Request for cost optimization recommendations, paginated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecommendationsRequest {
    /// Restrict to one provider; empty means all.
    #[serde(default)]
    pub provider: String,
    /// Restrict to one resource type; empty means all.
    #[serde(default)]
    pub resource_type: String,
    /// Maximum items per page; zero selects the plugin default.
    #[serde(default)]
    pub page_size: u32,
    /// Opaque continuation token from a previous page.
    #[serde(default)]
    pub page_token: String,
}

/// A single cost optimization recommendation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable identifier, unique across pages.
    pub id: String,
    /// Resource the recommendation targets.
    pub resource_id: String,
    /// Suggested action, e.g. `rightsize`.
    pub action: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Estimated monthly savings.
    pub estimated_savings: f64,
    /// ISO-4217 currency code of `estimated_savings`.
    pub currency: String,
}

/// One page of recommendations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    /// Recommendations on this page.
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Token for the next page; empty on the last page.
    #[serde(default)]
    pub next_page_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_method_roundtrip_names() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        assert!("estimate".parse::<Method>().is_err());
    }

    #[test]
    fn test_only_recommendations_is_optional() {
        let optional: Vec<_> = Method::ALL.into_iter().filter(|m| m.is_optional()).collect();
        assert_eq!(optional, vec![Method::Recommendations]);
    }

    #[test]
    fn test_fallback_hint_wire_names() {
        assert_eq!(
            serde_json::to_value(FallbackHint::Recommended).unwrap(),
            "RECOMMENDED"
        );
        let hint: FallbackHint = serde_json::from_str("\"UNSPECIFIED\"").unwrap();
        assert_eq!(hint, FallbackHint::Unspecified);
        assert_eq!(FallbackHint::default(), FallbackHint::Unspecified);
    }

    #[test]
    fn test_fallback_requested_only_for_recommended_and_required() {
        assert!(!FallbackHint::Unspecified.requests_fallback());
        assert!(!FallbackHint::None.requests_fallback());
        assert!(FallbackHint::Recommended.requests_fallback());
        assert!(FallbackHint::Required.requests_fallback());
    }

    #[test]
    fn test_contradictory_hint_detection() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut result = CostQueryResult {
            results: vec![CostLineItem::new(ts, 3.5, "billing")],
            currency: "USD".to_string(),
            fallback_hint: FallbackHint::Required,
        };
        assert!(result.has_contradictory_hint());

        result.fallback_hint = FallbackHint::None;
        assert!(!result.has_contradictory_hint());

        result.results.clear();
        result.fallback_hint = FallbackHint::Required;
        assert!(!result.has_contradictory_hint());
    }

    #[test]
    fn test_missing_optional_fields_default_on_decode() {
        let json = r#"{"provider":"aws","resource_type":"ec2"}"#;
        let descriptor: ResourceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor, ResourceDescriptor::new("aws", "ec2"));

        let result: CostQueryResult = serde_json::from_str("{}").unwrap();
        assert!(!result.has_data());
        assert_eq!(result.fallback_hint, FallbackHint::Unspecified);
    }

    #[test]
    fn test_supports_capability_lookup() {
        let mut response = SupportsResponse {
            supported: true,
            ..SupportsResponse::default()
        };
        assert!(!response.has_capability(CAPABILITY_RECOMMENDATIONS));

        response
            .capabilities
            .insert(CAPABILITY_RECOMMENDATIONS.to_string(), true);
        assert!(response.has_capability(CAPABILITY_RECOMMENDATIONS));
    }
}
