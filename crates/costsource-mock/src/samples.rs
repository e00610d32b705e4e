//! Ready-made payloads for configuring mocks with realistic data.

use chrono::{DateTime, Duration, Utc};
use costsource_core::{
    CostLineItem, CostQueryResult, FallbackHint, PricingSpec, PricingSpecResponse,
    ProjectedCostResponse, ResourceDescriptor,
};

/// Hours in a billing month, used for projected cost.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// One line item per hour starting at `start`, each costing `hourly_rate`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use costsource_mock::samples::hourly_costs;
///
/// let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
/// let items = hourly_costs(start, 24, 0.0104);
/// assert_eq!(items.len(), 24);
/// assert_eq!(items[23].timestamp, start + chrono::Duration::hours(23));
/// ```
#[must_use]
pub fn hourly_costs(start: DateTime<Utc>, hours: u32, hourly_rate: f64) -> Vec<CostLineItem> {
    (0..hours)
        .map(|h| {
            CostLineItem::new(start + Duration::hours(i64::from(h)), hourly_rate, "mock-billing")
                .with_usage(1.0, "hours")
        })
        .collect()
}

/// An authoritative actual-cost answer with hourly data over `[start, start + hours)`.
#[must_use]
pub fn actual_cost_result(start: DateTime<Utc>, hours: u32, hourly_rate: f64) -> CostQueryResult {
    CostQueryResult {
        results: hourly_costs(start, hours, hourly_rate),
        currency: "USD".to_string(),
        fallback_hint: FallbackHint::None,
    }
}

/// An empty actual-cost answer carrying `hint`.
#[must_use]
pub fn no_data(hint: FallbackHint) -> CostQueryResult {
    CostQueryResult {
        results: Vec::new(),
        currency: "USD".to_string(),
        fallback_hint: hint,
    }
}

/// Projected cost for a resource billed per hour.
#[must_use]
pub fn projected_hourly(hourly_rate: f64) -> ProjectedCostResponse {
    ProjectedCostResponse {
        unit_price: hourly_rate,
        currency: "USD".to_string(),
        cost_per_month: hourly_rate * HOURS_PER_MONTH,
        billing_detail: format!("{hourly_rate} USD per hour, {HOURS_PER_MONTH} hours per month"),
    }
}

/// Per-hour pricing spec for `resource`.
#[must_use]
pub fn hourly_pricing(resource: &ResourceDescriptor, hourly_rate: f64) -> PricingSpecResponse {
    PricingSpecResponse {
        spec: PricingSpec {
            provider: resource.provider.clone(),
            resource_type: resource.resource_type.clone(),
            sku: resource.sku.clone(),
            region: resource.region.clone(),
            billing_mode: "per_hour".to_string(),
            rate_per_unit: hourly_rate,
            currency: "USD".to_string(),
            description: format!("{} {} on demand", resource.resource_type, resource.sku),
        },
    }
}
