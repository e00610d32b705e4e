//! The per-response fallback decision rule.

use costsource_core::{CostQueryResult, FallbackHint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a response ends the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finality {
    /// The response carries cost data.
    Authoritative,
    /// The response is empty and that emptiness is the answer: no cost.
    ZeroCost,
}

/// What a caller should do with one plugin's actual-cost response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackDecision {
    /// Use this response.
    Final(Finality),
    /// Query the next candidate plugin.
    Continue,
    /// No plugin could handle the resource. Distinct from a zero cost.
    Unhandled,
}

impl FallbackDecision {
    /// Returns `true` when the response should be used as the answer.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Final(_))
    }

    /// Returns `true` when the caller must report an unhandled resource.
    #[must_use]
    pub const fn is_unhandled(self) -> bool {
        matches!(self, Self::Unhandled)
    }
}

impl fmt::Display for FallbackDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Final(Finality::Authoritative) => f.write_str("final (authoritative)"),
            Self::Final(Finality::ZeroCost) => f.write_str("final (zero cost)"),
            Self::Continue => f.write_str("continue"),
            Self::Unhandled => f.write_str("unhandled"),
        }
    }
}

/// Decides whether `result` is final, applying the rules in order:
///
/// 1. any cost line item makes it final, whatever the hint says;
/// 2. an empty result with hint `None` or `Unspecified` is a final zero cost;
/// 3. an empty result with hint `Recommended` continues when another
///    candidate exists and is otherwise a final zero cost;
/// 4. an empty result with hint `Required` continues when another candidate
///    exists and is otherwise unhandled.
///
/// Protocol errors never reach this rule; a failed call is not a hint.
///
/// # Examples
///
/// ```
/// use costsource_core::{CostQueryResult, FallbackHint};
/// use costsource_fallback::{FallbackDecision, Finality, resolve};
///
/// let empty = CostQueryResult {
///     fallback_hint: FallbackHint::Required,
///     ..Default::default()
/// };
/// assert_eq!(resolve(&empty, true), FallbackDecision::Continue);
/// assert_eq!(resolve(&empty, false), FallbackDecision::Unhandled);
///
/// let free = CostQueryResult::default();
/// assert_eq!(resolve(&free, true), FallbackDecision::Final(Finality::ZeroCost));
/// ```
#[must_use]
pub fn resolve(result: &CostQueryResult, has_next_candidate: bool) -> FallbackDecision {
    if result.has_data() {
        return FallbackDecision::Final(Finality::Authoritative);
    }
    match (result.fallback_hint, has_next_candidate) {
        (FallbackHint::Unspecified | FallbackHint::None, _)
        | (FallbackHint::Recommended, false) => FallbackDecision::Final(Finality::ZeroCost),
        (FallbackHint::Recommended | FallbackHint::Required, true) => FallbackDecision::Continue,
        (FallbackHint::Required, false) => FallbackDecision::Unhandled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use costsource_core::CostLineItem;

    fn response(items: usize, hint: FallbackHint) -> CostQueryResult {
        let ts = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        CostQueryResult {
            results: (0..items)
                .map(|_| CostLineItem::new(ts, 1.25, "billing"))
                .collect(),
            currency: "USD".to_string(),
            fallback_hint: hint,
        }
    }

    #[test]
    fn test_data_with_required_hint_is_final() {
        let decision = resolve(&response(1, FallbackHint::Required), false);
        assert_eq!(decision, FallbackDecision::Final(Finality::Authoritative));
    }

    #[test]
    fn test_empty_unspecified_is_final_zero_cost() {
        let decision = resolve(&response(0, FallbackHint::Unspecified), true);
        assert_eq!(decision, FallbackDecision::Final(Finality::ZeroCost));
    }

    #[test]
    fn test_empty_recommended_with_next_continues() {
        let decision = resolve(&response(0, FallbackHint::Recommended), true);
        assert_eq!(decision, FallbackDecision::Continue);
    }

    #[test]
    fn test_empty_required_without_next_is_unhandled() {
        let decision = resolve(&response(0, FallbackHint::Required), false);
        assert_eq!(decision, FallbackDecision::Unhandled);
        assert_ne!(decision, FallbackDecision::Final(Finality::ZeroCost));
    }

    #[test]
    fn test_empty_recommended_without_next_is_zero_cost() {
        let decision = resolve(&response(0, FallbackHint::Recommended), false);
        assert_eq!(decision, FallbackDecision::Final(Finality::ZeroCost));
    }

    #[test]
    fn test_unspecified_behaves_like_none() {
        for has_next in [true, false] {
            assert_eq!(
                resolve(&response(0, FallbackHint::Unspecified), has_next),
                resolve(&response(0, FallbackHint::None), has_next)
            );
        }
    }

    #[test]
    fn test_data_always_wins() {
        let hints = [
            FallbackHint::Unspecified,
            FallbackHint::None,
            FallbackHint::Recommended,
            FallbackHint::Required,
        ];
        for hint in hints {
            for has_next in [true, false] {
                assert!(resolve(&response(3, hint), has_next).is_final());
            }
        }
    }
}
