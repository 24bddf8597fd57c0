// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Hazard reports filed against grid equipment.

use serde::{Deserialize, Serialize};

use crate::severity::{Severity, SeverityEstimate, Urgency};

/// What kind of hazard was photographed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardCategory {
    /// Leaning pole or tower.
    Tilting,
    /// Vegetation touching or near lines.
    TreeContact,
    /// Broken or damaged equipment.
    EquipmentDamage,
    /// Anything else.
    Other,
}

impl HazardCategory {
    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Tilting => "Tilting",
            Self::TreeContact => "Tree contact",
            Self::EquipmentDamage => "Equipment damage",
            Self::Other => "Other",
        }
    }
}

/// Handling status. The workflow is driven by the operator back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Filed by the user.
    #[default]
    Submitted,
    /// Acknowledged by an operator.
    Received,
    /// Crew assigned.
    InProgress,
    /// Fixed.
    Resolved,
    /// Not actionable.
    Rejected,
}

/// A filed hazard report. Immutable apart from `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    /// Report id.
    pub id: String,
    /// Filing account.
    pub reporter_id: String,
    /// Hazard category.
    pub category: HazardCategory,
    /// Validated severity.
    pub severity: Severity,
    /// Urgency derived from `severity`.
    pub urgency: Urgency,
    /// Points awarded for filing.
    pub reward_points: u64,
    /// Model description, passed through.
    pub description: String,
    /// Model recommendation, passed through.
    pub recommended_action: String,
    /// Model confidence, passed through.
    pub confidence: f64,
    /// Handling status.
    pub status: ReportStatus,
    /// Filing time, unix millis.
    pub created_at: u64,
}

impl HazardReport {
    pub(crate) fn from_estimate(
        id: String,
        reporter_id: String,
        category: HazardCategory,
        severity: Severity,
        estimate: &SeverityEstimate,
        reward_points: u64,
        now: u64,
    ) -> Self {
        Self {
            id,
            reporter_id,
            category,
            severity,
            urgency: severity.tier(),
            reward_points,
            description: estimate.descriptive_text.clone(),
            recommended_action: estimate.recommended_action.clone(),
            confidence: estimate.confidence,
            status: ReportStatus::Submitted,
            created_at: now,
        }
    }
}
