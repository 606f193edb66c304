//! Admission verdicts.

use serde::Serialize;

/// Outcome of one admission check.
///
/// The reason strings are part of the dispatcher contract and are returned
/// verbatim to clients by the HTTP middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Blacklisted,
    RegionLimited,
    RateLimited,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Human-readable reason.
    pub fn reason(self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Blacklisted => "blacklisted",
            Decision::RegionLimited => "region traffic limit exceeded",
            Decision::RateLimited => "rate limit exceeded",
        }
    }

    /// Short label used for metrics.
    pub fn label(self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Blacklisted => "blacklisted",
            Decision::RegionLimited => "geo",
            Decision::RateLimited => "rate_limited",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_allowed_is_allowed() {
        assert!(Decision::Allowed.is_allowed());
        assert!(!Decision::Blacklisted.is_allowed());
        assert!(!Decision::RegionLimited.is_allowed());
        assert!(!Decision::RateLimited.is_allowed());
    }

    #[test]
    fn reasons_are_stable() {
        assert_eq!(Decision::Blacklisted.to_string(), "blacklisted");
        assert_eq!(Decision::RegionLimited.to_string(), "region traffic limit exceeded");
        assert_eq!(Decision::RateLimited.to_string(), "rate limit exceeded");
        assert_eq!(Decision::Allowed.to_string(), "allowed");
    }
}
