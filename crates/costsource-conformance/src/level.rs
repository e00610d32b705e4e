//! Conformance tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strictness tier a plugin is validated against.
///
/// Tiers are ordered and cumulative: running a tier also runs every tier
/// below it.
///
/// # Examples
///
/// ```
/// use costsource_conformance::ConformanceLevel;
///
/// assert!(ConformanceLevel::Basic < ConformanceLevel::Advanced);
/// assert!(ConformanceLevel::Standard.includes(ConformanceLevel::Basic));
/// assert_eq!("advanced".parse::<ConformanceLevel>().unwrap(), ConformanceLevel::Advanced);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConformanceLevel {
    /// Structural correctness of every response.
    Basic,
    /// Error classification, moderate concurrency and idempotence.
    Standard,
    /// Latency budgets, high concurrency and stress conditions.
    Advanced,
}

impl ConformanceLevel {
    /// All tiers, lowest first.
    pub const ALL: [Self; 3] = [Self::Basic, Self::Standard, Self::Advanced];

    /// Upper-case tier name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Standard => "STANDARD",
            Self::Advanced => "ADVANCED",
        }
    }

    /// Returns `true` when running `self` also runs the `other` battery.
    #[must_use]
    pub fn includes(self, other: Self) -> bool {
        other <= self
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConformanceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown conformance level: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_cumulative() {
        assert!(ConformanceLevel::Advanced.includes(ConformanceLevel::Basic));
        assert!(ConformanceLevel::Advanced.includes(ConformanceLevel::Advanced));
        assert!(!ConformanceLevel::Basic.includes(ConformanceLevel::Standard));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "Standard".parse::<ConformanceLevel>().unwrap(),
            ConformanceLevel::Standard
        );
        assert!("expert".parse::<ConformanceLevel>().is_err());
    }

    #[test]
    fn test_wire_name_matches_display() {
        for level in ConformanceLevel::ALL {
            let json = serde_json::to_value(level).unwrap();
            assert_eq!(json, level.to_string());
        }
    }
}
