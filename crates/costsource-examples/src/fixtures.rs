//! Mock plugins modelled on the sources a real deployment chains together.
//!
//! - [`billing_export`] knows the exact cost of a fixed set of resources and
//!   cannot service anything else.
//! - [`public_pricing`] prices by SKU but has no per-resource usage, so it
//!   always defers actual-cost queries.
//! - [`unreachable_source`] fails every actual-cost call.

use chrono::{DateTime, Utc};
use costsource_core::{FallbackHint, Method, ResourceDescriptor};
use costsource_mock::{InjectedError, MockPlugin, samples};
use std::time::Duration;

/// Resource the billing export has data for.
pub const KNOWN_INSTANCE: &str = "i-0123456789abcdef0";

/// Hourly rate of [`KNOWN_INSTANCE`] in USD.
pub const KNOWN_INSTANCE_RATE: f64 = 0.0104;

/// A billing export holding 24 hours of usage for [`KNOWN_INSTANCE`] from
/// `start`. Every other resource is reported as unserviceable.
pub fn billing_export(start: DateTime<Utc>) -> MockPlugin {
    MockPlugin::builder()
        .name("billing-export")
        .set_response(samples::no_data(FallbackHint::Required))
        .set_response_for(
            KNOWN_INSTANCE,
            samples::actual_cost_result(start, 24, KNOWN_INSTANCE_RATE),
        )
        .set_delay(Method::ActualCost, Duration::from_millis(15))
        .without_recommendations()
        .build()
}

/// A public price list for `t3.micro` that serves recommendations but never
/// has per-resource usage.
pub fn public_pricing() -> MockPlugin {
    let t3_micro = ResourceDescriptor::new("aws", "ec2")
        .with_sku("t3.micro")
        .with_region("us-east-1");

    MockPlugin::builder()
        .name("aws-public-pricing")
        .set_response(samples::no_data(FallbackHint::Recommended))
        .set_response(samples::projected_hourly(KNOWN_INSTANCE_RATE))
        .set_response(samples::hourly_pricing(&t3_micro, KNOWN_INSTANCE_RATE))
        .recommendation_count(75)
        .unsupported_provider("azure")
        .build()
}

/// A source whose backend is down.
pub fn unreachable_source() -> MockPlugin {
    MockPlugin::builder()
        .name("unreachable")
        .inject_error(
            Method::ActualCost,
            InjectedError::unavailable("upstream billing API unreachable"),
        )
        .build()
}
