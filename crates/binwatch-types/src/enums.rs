//! Enumeration types for the Binwatch dashboard.
//!
//! All enums serialize in lowercase so the wire format matches the
//! dashboard client (`"normal"`, `"warning"`, `"alert"`, ...). The same
//! lowercase text is used as the column value in `PostgreSQL`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Returned when a stored or received string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Bin status
// ---------------------------------------------------------------------------

/// Fill status of a bin, derived from its fill level and the threshold
/// in effect at the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum BinStatus {
    /// Comfortably below the threshold.
    #[default]
    Normal,
    /// Within ten points of the threshold.
    Warning,
    /// At or above the threshold.
    Alert,
}

impl BinStatus {
    /// Lowercase wire/database name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for BinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BinStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "warning" => Ok(Self::Warning),
            "alert" => Ok(Self::Alert),
            other => Err(ParseEnumError {
                kind: "bin status",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Fill pattern
// ---------------------------------------------------------------------------

/// Increment-generation strategy applied on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum FillPattern {
    /// Whole-number jumps between 2 and 9 points.
    #[default]
    Random,
    /// A steady 2 points per tick.
    Linear,
    /// Around 1.5 points with +/-1 of noise, never below 0.5.
    Realistic,
}

impl FillPattern {
    /// Lowercase wire/database name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Linear => "linear",
            Self::Realistic => "realistic",
        }
    }
}

impl fmt::Display for FillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillPattern {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "linear" => Ok(Self::Linear),
            "realistic" => Ok(Self::Realistic),
            other => Err(ParseEnumError {
                kind: "fill pattern",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert severity
// ---------------------------------------------------------------------------

/// Severity carried by an `alert` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AlertSeverity {
    /// The bin crossed its threshold but is not yet full.
    Warning,
    /// The bin is full.
    Alert,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [BinStatus::Normal, BinStatus::Warning, BinStatus::Alert] {
            assert_eq!(status.as_str().parse::<BinStatus>().ok(), Some(status));
        }
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        let err = "exponential".parse::<FillPattern>().err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some(String::from("unknown fill pattern value: \"exponential\""))
        );
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&AlertSeverity::Warning).ok();
        assert_eq!(json.as_deref(), Some("\"warning\""));
    }

    #[test]
    fn status_ordering_follows_severity() {
        assert!(BinStatus::Normal < BinStatus::Warning);
        assert!(BinStatus::Warning < BinStatus::Alert);
    }
}
