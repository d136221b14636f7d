//! Severity classification of free-text error-type labels.
//!
//! Labels come from arbitrary client instrumentation, so classification is a
//! case-sensitive substring match checked in strict priority order:
//!
//! | Contains            | Tier       |
//! |---------------------|------------|
//! | `Fatal` or `Crash`  | `critical` |
//! | `Error`             | `error`    |
//! | `Warning`           | `warning`  |
//! | anything else       | `info`     |
//!
//! `"FatalNetworkError"` is therefore `critical`, not `error`.

use serde::{Deserialize, Serialize};

/// One of four ordered severity tiers, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Critical,
    Error,
    Warning,
    Info,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 4] = [
        SeverityTier::Critical,
        SeverityTier::Error,
        SeverityTier::Warning,
        SeverityTier::Info,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Display name shown on UI badges.
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }

    /// Text colour class for the badge.
    pub fn color(self) -> &'static str {
        match self {
            Self::Critical => "text-red-600",
            Self::Error => "text-orange-600",
            Self::Warning => "text-yellow-600",
            Self::Info => "text-blue-600",
        }
    }

    /// Background colour class for the badge.
    pub fn bg(self) -> &'static str {
        match self {
            Self::Critical => "bg-red-100",
            Self::Error => "bg-orange-100",
            Self::Warning => "bg-yellow-100",
            Self::Info => "bg-blue-100",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output: the tier plus the display strings a badge needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityLevel {
    pub tier: SeverityTier,
    pub label: String,
    pub color: String,
    pub bg: String,
}

impl From<SeverityTier> for SeverityLevel {
    fn from(tier: SeverityTier) -> Self {
        Self {
            tier,
            label: tier.label().to_string(),
            color: tier.color().to_string(),
            bg: tier.bg().to_string(),
        }
    }
}

/// Tier for an error-type label.
pub fn classify_tier(error_type: &str) -> SeverityTier {
    if error_type.contains("Fatal") || error_type.contains("Crash") {
        SeverityTier::Critical
    } else if error_type.contains("Error") {
        SeverityTier::Error
    } else if error_type.contains("Warning") {
        SeverityTier::Warning
    } else {
        SeverityTier::Info
    }
}

/// Classify an error-type label into a [`SeverityLevel`].
pub fn classify(error_type: &str) -> SeverityLevel {
    classify_tier(error_type).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_takes_priority_over_error() {
        assert_eq!(classify_tier("FatalNetworkError"), SeverityTier::Critical);
        assert_eq!(classify_tier("FatalCrashError"), SeverityTier::Critical);
    }

    #[test]
    fn crash_alone_is_critical() {
        assert_eq!(classify_tier("AppCrash"), SeverityTier::Critical);
    }

    #[test]
    fn error_substring() {
        assert_eq!(classify_tier("TypeError"), SeverityTier::Error);
        assert_eq!(classify_tier("Error"), SeverityTier::Error);
    }

    #[test]
    fn error_takes_priority_over_warning() {
        assert_eq!(classify_tier("WarningError"), SeverityTier::Error);
    }

    #[test]
    fn warning_substring() {
        assert_eq!(classify_tier("MinorWarning"), SeverityTier::Warning);
    }

    #[test]
    fn no_match_is_info() {
        assert_eq!(classify_tier("Timeout"), SeverityTier::Info);
        assert_eq!(classify_tier(""), SeverityTier::Info);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(classify_tier("fatal"), SeverityTier::Info);
        assert_eq!(classify_tier("networkerror"), SeverityTier::Info);
        assert_eq!(classify_tier("WARNING"), SeverityTier::Info);
    }

    #[test]
    fn level_carries_display_strings() {
        let level = classify("FatalCrash");
        assert_eq!(level.tier, SeverityTier::Critical);
        assert_eq!(level.label, "Critical");
        assert_eq!(level.color, "text-red-600");
        assert_eq!(level.bg, "bg-red-100");

        let level = classify("Timeout");
        assert_eq!(level.label, "Info");
        assert_eq!(level.color, "text-blue-600");
    }

    #[test]
    fn tiers_are_ordered_most_severe_first() {
        let mut tiers = SeverityTier::ALL;
        tiers.reverse();
        tiers.sort();
        assert_eq!(tiers, SeverityTier::ALL);
    }

    #[test]
    fn tier_serializes_lowercase() {
        let json = serde_json::to_value(classify("MinorWarning")).unwrap();
        assert_eq!(json["tier"], "warning");
        assert_eq!(json["label"], "Warning");
    }
}
