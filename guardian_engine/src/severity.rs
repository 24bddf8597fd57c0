// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Severity scoring and report rewards.
//!
//! A hazard photo is scored 1-10 by an external vision model. The score is
//! banded into a [`RiskTier`], which drives both the urgency tag shown to the
//! user and the point multiplier applied to a report reward.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Points awarded for a report before the tier multiplier is applied.
pub const BASE_REPORT_POINTS: u64 = 100;

/// Lowest valid severity score.
pub const MIN_SEVERITY: u8 = 1;
/// Highest valid severity score.
pub const MAX_SEVERITY: u8 = 10;

/// A validated severity score in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Severity(u8);

impl Severity {
    /// Validates an integer score.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(score: i64) -> Result<Self> {
        if (i64::from(MIN_SEVERITY)..=i64::from(MAX_SEVERITY)).contains(&score) {
            Ok(Self(score as u8))
        } else {
            Err(EngineError::InvalidSeverity(format!(
                "{score} is outside {MIN_SEVERITY}..={MAX_SEVERITY}"
            )))
        }
    }

    /// Validates a score decoded as a float, rejecting fractional values.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(score: f64) -> Result<Self> {
        if !score.is_finite() || score.fract() != 0.0 {
            return Err(EngineError::InvalidSeverity(format!(
                "{score} is not an integer score"
            )));
        }
        if score < f64::from(MIN_SEVERITY) || score > f64::from(MAX_SEVERITY) {
            return Err(EngineError::InvalidSeverity(format!(
                "{score} is outside {MIN_SEVERITY}..={MAX_SEVERITY}"
            )));
        }
        Self::new(score as i64)
    }

    /// Raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Tier this score falls into.
    #[must_use]
    pub const fn tier(self) -> RiskTier {
        RiskTier::from_score(self.0)
    }

    /// Every valid severity, ascending.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_SEVERITY..=MAX_SEVERITY).map(Self)
    }
}

impl TryFrom<i64> for Severity {
    type Error = EngineError;

    fn try_from(score: i64) -> Result<Self> {
        Self::new(score)
    }
}

impl From<Severity> for i64 {
    fn from(s: Severity) -> Self {
        Self::from(s.0)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Risk banding of a severity score. Doubles as the urgency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    /// Scores 1-3.
    Low,
    /// Scores 4-6.
    Medium,
    /// Scores 7-10.
    High,
}

/// Urgency tag presented alongside a report. Same banding as the reward tier.
pub type Urgency = RiskTier;

impl RiskTier {
    /// Bands a raw score. Callers must have validated it.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=3 => Self::Low,
            4..=6 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Reward multiplier for the tier.
    #[must_use]
    pub const fn multiplier(self) -> u64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 5,
        }
    }

    /// Inclusive score range covered by the tier.
    #[must_use]
    pub const fn score_range(self) -> (u8, u8) {
        match self {
            Self::Low => (1, 3),
            Self::Medium => (4, 6),
            Self::High => (7, 10),
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Hex color used by map markers and badges.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "#22C55E",
            Self::Medium => "#F59E0B",
            Self::High => "#EF4444",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reward for a report scored `severity_score` at the default base.
///
/// Fails with [`EngineError::InvalidSeverity`] outside `1..=10`.
pub fn compute_report_reward(severity_score: i64) -> Result<u64> {
    let severity = Severity::new(severity_score)?;
    Ok(BASE_REPORT_POINTS * severity.tier().multiplier())
}

/// Reward for a validated severity at an arbitrary base.
pub fn reward_with_base(severity: Severity, base: u64) -> Result<u64> {
    base.checked_mul(severity.tier().multiplier())
        .ok_or_else(|| EngineError::InvalidConfig(format!("base report points {base} overflow")))
}

/// Hazard analysis as returned by the vision collaborator.
///
/// Only `severity_score` feeds the engine; the remaining fields are carried
/// through to the report for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityEstimate {
    /// Raw score. Decoded as a float so fractional answers can be rejected.
    pub severity_score: f64,
    /// Model confidence in `0..=1`.
    #[serde(default)]
    pub confidence: f64,
    /// Urgency the model claims. The engine re-derives it from the score.
    #[serde(default)]
    pub urgency: Option<Urgency>,
    /// Free-text description of the hazard.
    #[serde(default)]
    pub descriptive_text: String,
    /// Suggested remediation.
    #[serde(default)]
    pub recommended_action: String,
}

impl SeverityEstimate {
    /// Creates an estimate with an integer score and no commentary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(severity_score: i64, confidence: f64) -> Self {
        Self {
            severity_score: severity_score as f64,
            confidence,
            urgency: None,
            descriptive_text: String::new(),
            recommended_action: String::new(),
        }
    }

    /// Sets the urgency the model reported.
    #[must_use]
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Sets the descriptive text.
    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.descriptive_text = text.into();
        self
    }

    /// Sets the recommended action.
    #[must_use]
    pub fn with_recommended_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Validated severity.
    pub fn severity(&self) -> Result<Severity> {
        Severity::from_f64(self.severity_score)
    }

    /// Urgency derived from the score. A disagreeing model tag is logged and ignored.
    pub fn derived_urgency(&self) -> Result<Urgency> {
        let tier = self.severity()?.tier();
        if let Some(claimed) = self.urgency {
            if claimed != tier {
                tracing::warn!(
                    claimed = %claimed,
                    derived = %tier,
                    score = self.severity_score,
                    "model urgency disagrees with severity score, using derived tier"
                );
            }
        }
        Ok(tier)
    }

    /// Confidence as a percentage clamped to `0..=100`.
    #[must_use]
    pub fn confidence_percent(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        (self.confidence * 100.0).clamp(0.0, 100.0)
    }
}
