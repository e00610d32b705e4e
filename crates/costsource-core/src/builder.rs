//! Builder for actual-cost responses.
//!
//! Plugins assemble a [`CostQueryResult`] field by field and validate it once
//! in [`CostQueryResultBuilder::build`].

use crate::types::{CostLineItem, CostQueryResult, FallbackHint};
use crate::validation::is_valid_currency;
use crate::{Error, Result};

/// Builder for [`CostQueryResult`] instances.
///
/// # Examples
///
/// ```
/// use costsource_core::{CostQueryResult, FallbackHint};
///
/// // No data for this resource: ask the caller to try other plugins.
/// let result = CostQueryResult::builder()
///     .fallback_hint(FallbackHint::Recommended)
///     .build()
///     .unwrap();
///
/// assert!(!result.has_data());
/// assert_eq!(result.fallback_hint, FallbackHint::Recommended);
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct CostQueryResultBuilder {
    results: Vec<CostLineItem>,
    currency: Option<String>,
    fallback_hint: FallbackHint,
}

impl CostQueryResult {
    /// Creates a builder starting from an empty response.
    pub fn builder() -> CostQueryResultBuilder {
        CostQueryResultBuilder::default()
    }
}

impl CostQueryResultBuilder {
    /// Appends one line item.
    pub fn result(mut self, item: CostLineItem) -> Self {
        self.results.push(item);
        self
    }

    /// Appends several line items.
    pub fn results(mut self, items: impl IntoIterator<Item = CostLineItem>) -> Self {
        self.results.extend(items);
        self
    }

    /// Sets the currency code.
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the fallback hint.
    pub const fn fallback_hint(mut self, hint: FallbackHint) -> Self {
        self.fallback_hint = hint;
        self
    }

    /// Validates and produces the response.
    ///
    /// A response with data must name a valid currency, and every cost must
    /// be finite and non-negative. An empty response may omit the currency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the offending field.
    pub fn build(self) -> Result<CostQueryResult> {
        let currency = self.currency.unwrap_or_default();

        if !self.results.is_empty() && !is_valid_currency(&currency) {
            return Err(Error::ValidationError {
                field: "currency".to_string(),
                reason: format!("'{currency}' is not a three-letter currency code"),
            });
        }

        if let Some((index, item)) = self
            .results
            .iter()
            .enumerate()
            .find(|(_, item)| !item.cost.is_finite() || item.cost < 0.0)
        {
            return Err(Error::ValidationError {
                field: format!("results[{index}].cost"),
                reason: format!("cost must be finite and non-negative, got {}", item.cost),
            });
        }

        Ok(CostQueryResult {
            results: self.results,
            currency,
            fallback_hint: self.fallback_hint,
        })
    }
}
