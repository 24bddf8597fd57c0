// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Error types for the rules engine.

use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EngineError {
    /// Severity score outside `1..=10` or not an integer.
    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    /// Negative cumulative points handed to the level ledger.
    #[error("invalid points: {0} (cumulative points cannot be negative)")]
    InvalidPoints(i64),

    /// Mission progress value that is not a finite number.
    #[error("invalid progress: {0}")]
    InvalidProgress(String),

    /// Persisted mission record that breaks a mission invariant.
    #[error("invalid mission record: {0}")]
    InvalidMission(String),

    /// Mission kind missing from the mission table.
    #[error("unknown mission kind: {0}")]
    UnknownMissionKind(String),

    /// Badge kind missing from the badge catalogue.
    #[error("unknown badge kind: {0}")]
    UnknownBadgeKind(String),

    /// Configuration rejected at validation time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Account or mission id not present in the registry.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidSeverity("11 is outside 1..=10".to_string());
        assert_eq!(err.to_string(), "invalid severity: 11 is outside 1..=10");

        let err = EngineError::InvalidPoints(-5);
        assert!(err.to_string().contains("cannot be negative"));

        let err = EngineError::InvalidProgress("NaN".to_string());
        assert!(err.to_string().contains("invalid progress"));

        let err = EngineError::InvalidMission("m1: progress 50 outside 0..=20".to_string());
        assert_eq!(
            err.to_string(),
            "invalid mission record: m1: progress 50 outside 0..=20"
        );

        let err = EngineError::UnknownMissionKind("bike_commute".to_string());
        assert_eq!(err.to_string(), "unknown mission kind: bike_commute");

        let err = EngineError::UnknownBadgeKind("gold_star".to_string());
        assert_eq!(err.to_string(), "unknown badge kind: gold_star");

        let err = EngineError::InvalidConfig("empty level table".to_string());
        assert!(err.to_string().contains("invalid configuration"));

        let err = EngineError::NotFound("account user-1".to_string());
        assert_eq!(err.to_string(), "not found: account user-1");
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(EngineError::InvalidPoints(-1), EngineError::InvalidPoints(-1));
        assert_ne!(EngineError::InvalidPoints(-1), EngineError::InvalidPoints(-2));
    }
}
