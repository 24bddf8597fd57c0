// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Energy-saving missions and their progress tracking.
//!
//! A mission counts toward a fixed target. Progress only moves forward, is
//! clamped to the target, and the reward is handed out exactly once, on the
//! update that first reaches the target. Deadlines are checked lazily
//! whenever a mission is read or updated; nothing runs in the background.
//!
//! ```text
//! Active --target reached--> Completed
//! Active --deadline passed--> Failed
//! Active --pause--> Paused --resume--> Active
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::badge::BadgeKind;
use crate::clock::days_to_millis;
use crate::error::{EngineError, Result};

/// Mission types offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    /// Cut usage during the evening peak.
    PeakReduction,
    /// Unplug idle devices.
    StandbyPower,
    /// Use less than last month.
    MonthlySavings,
    /// Take part every day.
    ContinuousParticipation,
}

/// Mission difficulty shown on the mission card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Short and forgiving.
    Easy,
    /// Needs steady effort.
    Medium,
    /// Needs a change of habits.
    Hard,
}

/// Static configuration of a mission kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionConfig {
    /// Value to reach.
    pub target_value: f64,
    /// Unit of `target_value`.
    pub unit: &'static str,
    /// Points awarded on completion.
    pub reward_points: u64,
    /// Badges awarded on completion.
    pub reward_badges: &'static [BadgeKind],
    /// Days from start to deadline.
    pub default_duration_days: u32,
    /// Difficulty label.
    pub difficulty: Difficulty,
}

impl MissionKind {
    /// All kinds in display order.
    pub const ALL: [Self; 4] = [
        Self::PeakReduction,
        Self::StandbyPower,
        Self::MonthlySavings,
        Self::ContinuousParticipation,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PeakReduction => "peak_reduction",
            Self::StandbyPower => "standby_power",
            Self::MonthlySavings => "monthly_savings",
            Self::ContinuousParticipation => "continuous_participation",
        }
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PeakReduction => "Cut peak-hour usage",
            Self::StandbyPower => "Switch off standby power",
            Self::MonthlySavings => "Monthly energy savings",
            Self::ContinuousParticipation => "Daily participation",
        }
    }

    /// Mission table entry.
    #[must_use]
    pub const fn config(self) -> MissionConfig {
        match self {
            Self::PeakReduction => MissionConfig {
                target_value: 20.0,
                unit: "%",
                reward_points: 300,
                reward_badges: &[BadgeKind::PeakDestroyer],
                default_duration_days: 7,
                difficulty: Difficulty::Easy,
            },
            Self::StandbyPower => MissionConfig {
                target_value: 10.0,
                unit: "devices",
                reward_points: 200,
                reward_badges: &[BadgeKind::EnergySaver],
                default_duration_days: 7,
                difficulty: Difficulty::Easy,
            },
            Self::MonthlySavings => MissionConfig {
                target_value: 15.0,
                unit: "%",
                reward_points: 500,
                reward_badges: &[BadgeKind::EnergySaver],
                default_duration_days: 30,
                difficulty: Difficulty::Hard,
            },
            Self::ContinuousParticipation => MissionConfig {
                target_value: 7.0,
                unit: "days",
                reward_points: 400,
                reward_badges: &[BadgeKind::StreakWarrior],
                default_duration_days: 7,
                difficulty: Difficulty::Medium,
            },
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EngineError::UnknownMissionKind(s.to_string()))
    }
}

/// Checks every mission table entry. Run once at startup.
pub fn validate_mission_table() -> Result<()> {
    for kind in MissionKind::ALL {
        let config = kind.config();
        if !(config.target_value.is_finite() && config.target_value > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "mission {kind} has non-positive target {}",
                config.target_value
            )));
        }
        if config.default_duration_days == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "mission {kind} has zero duration"
            )));
        }
    }
    Ok(())
}

/// Lifecycle state of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    /// Accepting progress.
    Active,
    /// Target reached; terminal.
    Completed,
    /// Deadline passed before the target; terminal.
    Failed,
    /// Suspended; the deadline clock is stopped.
    Paused,
}

impl MissionStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One user's instance of a mission.
///
/// Deserialization checks the record the same way construction does, so a
/// persisted mission cannot come back with progress past its target or with
/// a completion time that disagrees with its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMissionInstance")]
pub struct MissionInstance {
    id: String,
    owner_id: String,
    kind: MissionKind,
    target_value: f64,
    current_value: f64,
    unit: String,
    difficulty: Difficulty,
    reward_points: u64,
    reward_badges: Vec<BadgeKind>,
    status: MissionStatus,
    started_at: u64,
    deadline: u64,
    completed_at: Option<u64>,
    paused_at: Option<u64>,
}

/// Unchecked wire form of [`MissionInstance`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMissionInstance {
    id: String,
    owner_id: String,
    kind: MissionKind,
    target_value: f64,
    current_value: f64,
    unit: String,
    difficulty: Difficulty,
    reward_points: u64,
    reward_badges: Vec<BadgeKind>,
    status: MissionStatus,
    started_at: u64,
    deadline: u64,
    completed_at: Option<u64>,
    paused_at: Option<u64>,
}

impl TryFrom<RawMissionInstance> for MissionInstance {
    type Error = EngineError;

    fn try_from(raw: RawMissionInstance) -> Result<Self> {
        let invalid = |reason: String| EngineError::InvalidMission(format!("{}: {reason}", raw.id));

        if !(raw.target_value.is_finite() && raw.target_value > 0.0) {
            return Err(invalid(format!(
                "target {} must be positive and finite",
                raw.target_value
            )));
        }
        if !(raw.current_value.is_finite()
            && raw.current_value >= 0.0
            && raw.current_value <= raw.target_value)
        {
            return Err(invalid(format!(
                "progress {} outside 0..={}",
                raw.current_value, raw.target_value
            )));
        }
        if raw.completed_at.is_some() != (raw.status == MissionStatus::Completed) {
            return Err(invalid(format!(
                "completedAt {:?} disagrees with status {:?}",
                raw.completed_at, raw.status
            )));
        }
        if raw.paused_at.is_some() != (raw.status == MissionStatus::Paused) {
            return Err(invalid(format!(
                "pausedAt {:?} disagrees with status {:?}",
                raw.paused_at, raw.status
            )));
        }

        Ok(Self {
            id: raw.id,
            owner_id: raw.owner_id,
            kind: raw.kind,
            target_value: raw.target_value,
            current_value: raw.current_value,
            unit: raw.unit,
            difficulty: raw.difficulty,
            reward_points: raw.reward_points,
            reward_badges: raw.reward_badges,
            status: raw.status,
            started_at: raw.started_at,
            deadline: raw.deadline,
            completed_at: raw.completed_at,
            paused_at: raw.paused_at,
        })
    }
}

/// Outcome of a progress update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionUpdate {
    /// Whether this update completed the mission and released its reward.
    pub reward_issued: bool,
    /// Points released, 0 unless `reward_issued`.
    pub reward_points: u64,
    /// Badges released, empty unless `reward_issued`.
    pub badges: Vec<BadgeKind>,
    /// Progress after the update.
    pub current_value: f64,
    /// Status after the update.
    pub status: MissionStatus,
}

impl MissionInstance {
    /// Starts a mission of `kind` at `now` with the table's target and reward.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: MissionKind,
        now: u64,
    ) -> Self {
        let config = kind.config();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind,
            target_value: config.target_value,
            current_value: 0.0,
            unit: config.unit.to_string(),
            difficulty: config.difficulty,
            reward_points: config.reward_points,
            reward_badges: config.reward_badges.to_vec(),
            status: MissionStatus::Active,
            started_at: now,
            deadline: now.saturating_add(days_to_millis(config.default_duration_days)),
            completed_at: None,
            paused_at: None,
        }
    }

    /// Overrides the target. Must be positive and finite.
    pub fn with_target(mut self, target_value: f64) -> Result<Self> {
        if !(target_value.is_finite() && target_value > 0.0) {
            return Err(EngineError::InvalidProgress(format!(
                "target {target_value} must be positive and finite"
            )));
        }
        self.target_value = target_value;
        self.current_value = self.current_value.min(target_value);
        Ok(self)
    }

    /// Overrides the deadline (unix millis).
    #[must_use]
    pub fn with_deadline(mut self, deadline: u64) -> Self {
        self.deadline = deadline;
        self
    }

    /// Mission id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning account id.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Mission kind.
    #[must_use]
    pub fn kind(&self) -> MissionKind {
        self.kind
    }

    /// Value to reach.
    #[must_use]
    pub fn target_value(&self) -> f64 {
        self.target_value
    }

    /// Progress so far, within `0..=target_value`.
    #[must_use]
    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Unit of the target.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Difficulty label.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Points released on completion.
    #[must_use]
    pub fn reward_points(&self) -> u64 {
        self.reward_points
    }

    /// Badges released on completion.
    #[must_use]
    pub fn reward_badges(&self) -> &[BadgeKind] {
        &self.reward_badges
    }

    /// Stored status. See [`Self::status_at`] for the deadline-aware view.
    #[must_use]
    pub fn status(&self) -> MissionStatus {
        self.status
    }

    /// Start time.
    #[must_use]
    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Deadline, pushed back by any time spent paused.
    #[must_use]
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    /// Completion time, set once.
    #[must_use]
    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    /// Pause start, while paused.
    #[must_use]
    pub fn paused_at(&self) -> Option<u64> {
        self.paused_at
    }

    /// Progress as a fraction of the target.
    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        (self.current_value / self.target_value).clamp(0.0, 1.0)
    }

    /// Effective status at `now`, treating an expired active mission as failed.
    /// A recorded completion time always means completed.
    #[must_use]
    pub fn status_at(&self, now: u64) -> MissionStatus {
        if self.completed_at.is_some() {
            MissionStatus::Completed
        } else if self.status == MissionStatus::Active && now > self.deadline {
            MissionStatus::Failed
        } else {
            self.status
        }
    }

    // Accepts progress: active and never completed.
    fn is_open(&self) -> bool {
        self.status == MissionStatus::Active && self.completed_at.is_none()
    }

    /// Applies deadline expiry. Returns `true` if the mission just failed.
    pub fn refresh(&mut self, now: u64) -> bool {
        if self.status == MissionStatus::Active && self.status_at(now) == MissionStatus::Failed {
            self.status = MissionStatus::Failed;
            tracing::info!(
                mission = %self.id,
                owner = %self.owner_id,
                kind = %self.kind,
                deadline = self.deadline,
                "mission failed: deadline passed"
            );
            return true;
        }
        false
    }

    fn unchanged(&self) -> MissionUpdate {
        MissionUpdate {
            reward_issued: false,
            reward_points: 0,
            badges: Vec::new(),
            current_value: self.current_value,
            status: self.status,
        }
    }

    /// Moves progress toward `new_value`.
    ///
    /// Values below the current progress are ignored and values above the
    /// target are clamped to it. Completed, failed and paused missions are
    /// left untouched and report `reward_issued == false`, so retries are
    /// safe. Only the update that first reaches the target issues the reward.
    pub fn update_progress(&mut self, new_value: f64, now: u64) -> Result<MissionUpdate> {
        if !new_value.is_finite() {
            return Err(EngineError::InvalidProgress(format!(
                "{new_value} is not a finite progress value"
            )));
        }

        self.refresh(now);
        if !self.is_open() {
            return Ok(self.unchanged());
        }

        self.current_value = new_value.max(self.current_value).min(self.target_value);

        if self.current_value < self.target_value {
            return Ok(self.unchanged());
        }

        self.status = MissionStatus::Completed;
        self.completed_at = Some(now);
        tracing::info!(
            mission = %self.id,
            owner = %self.owner_id,
            kind = %self.kind,
            reward_points = self.reward_points,
            "mission completed"
        );

        Ok(MissionUpdate {
            reward_issued: true,
            reward_points: self.reward_points,
            badges: self.reward_badges.clone(),
            current_value: self.current_value,
            status: self.status,
        })
    }

    /// Suspends an active mission. Returns `false` if it was not active.
    pub fn pause(&mut self, now: u64) -> bool {
        self.refresh(now);
        if !self.is_open() {
            return false;
        }
        self.status = MissionStatus::Paused;
        self.paused_at = Some(now);
        true
    }

    /// Resumes a paused mission, extending the deadline by the paused time.
    /// Returns `false` if it was not paused.
    pub fn resume(&mut self, now: u64) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        if self.status != MissionStatus::Paused {
            return false;
        }
        self.deadline = self.deadline.saturating_add(now.saturating_sub(paused_at));
        self.status = MissionStatus::Active;
        true
    }
}
