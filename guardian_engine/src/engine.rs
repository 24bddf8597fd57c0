// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Reward flows over caller-owned accounts and missions.
//!
//! [`RewardEngine`] holds only the validated configuration. Every operation
//! takes the account (and mission) by `&mut`, applies the transition and
//! returns what changed; persisting the result is the caller's job. Callers
//! sharing accounts across threads should go through
//! [`AccountRegistry`](crate::registry::AccountRegistry).

use serde::Serialize;

use crate::account::{RewardApplication, RewardSource, UserAccount};
use crate::badge::{evaluate_badges, ActivityStats, BadgeKind};
use crate::clock::day_index;
use crate::config::{EngineConfig, MONTHLY_STREAK_DAYS, WEEKLY_STREAK_DAYS};
use crate::error::{EngineError, Result};
use crate::level::{LevelProgress, LevelTable};
use crate::mission::{MissionInstance, MissionKind, MissionStatus};
use crate::report::{HazardCategory, HazardReport};
use crate::severity::{reward_with_base, Severity, SeverityEstimate};

/// Result of an account-level mission update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionOutcome {
    /// Whether this update completed the mission and paid its reward.
    pub reward_issued: bool,
    /// Mission status after the update.
    pub status: MissionStatus,
    /// Mission progress after the update.
    pub current_value: f64,
    /// Badges newly awarded to the account by this update.
    pub badges_issued: Vec<BadgeKind>,
    /// Point award, present only when the reward was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<RewardApplication>,
}

/// The rules engine.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: EngineConfig,
}

impl Default for RewardEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

impl RewardEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is unusable.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            base_report_points = config.base_report_points,
            levels = config.levels.levels().len(),
            "reward engine configured"
        );
        Ok(Self { config })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Active level table.
    #[must_use]
    pub fn levels(&self) -> &LevelTable {
        &self.config.levels
    }

    /// Points a report of `severity_score` earns under this configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSeverity` outside `1..=10`.
    pub fn report_reward(&self, severity_score: i64) -> Result<u64> {
        let severity = Severity::new(severity_score)?;
        reward_with_base(severity, self.config.base_report_points)
    }

    /// Files a hazard report: validates the estimate, pays the tiered
    /// reward and awards any badge the updated stats unlock.
    ///
    /// `stats.reports_submitted` is raised to the account's own count, so
    /// callers may leave it at zero. The account is untouched on error.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSeverity` if the estimate's score is not an integer in
    /// `1..=10`.
    pub fn submit_report(
        &self,
        account: &mut UserAccount,
        estimate: &SeverityEstimate,
        category: HazardCategory,
        report_id: impl Into<String>,
        stats: &ActivityStats,
        now: u64,
    ) -> Result<(HazardReport, RewardApplication)> {
        let severity = estimate.severity()?;
        let urgency = estimate.derived_urgency()?;
        let points = reward_with_base(severity, self.config.base_report_points)?;

        let report = HazardReport::from_estimate(
            report_id.into(),
            account.id().to_string(),
            category,
            severity,
            estimate,
            points,
            now,
        );

        let filed = account.record_report();
        let mut application = account.award_points(
            points,
            RewardSource::Report {
                report_id: report.id.clone(),
            },
            now,
            &self.config.levels,
        );

        let stats = ActivityStats {
            reports_submitted: stats.reports_submitted.max(filed),
            ..stats.clone()
        };
        application.badges_issued = self.award_earned_badges(account, &stats, now);

        tracing::debug!(
            account = %account.id(),
            report = %report.id,
            severity = %severity,
            urgency = %urgency,
            points,
            "report rewarded"
        );
        Ok((report, application))
    }

    /// Adds `delta` points to `account`.
    pub fn apply_points(
        &self,
        account: &mut UserAccount,
        delta: u64,
        source: RewardSource,
        now: u64,
    ) -> RewardApplication {
        account.award_points(delta, source, now, &self.config.levels)
    }

    /// Starts a mission of `kind` for `owner` using the static mission table.
    #[must_use]
    pub fn start_mission(
        &self,
        owner: &UserAccount,
        kind: MissionKind,
        mission_id: impl Into<String>,
        now: u64,
    ) -> MissionInstance {
        let mission = MissionInstance::new(mission_id, owner.id(), kind, now);
        tracing::debug!(
            account = %owner.id(),
            mission = %mission.id(),
            kind = %kind,
            deadline = mission.deadline(),
            "mission started"
        );
        mission
    }

    /// Moves `mission` toward `new_value` and, if this update completes it,
    /// pays the mission reward to `account` exactly once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProgress` for a non-finite value and `NotFound` when the
    /// mission is owned by another account.
    pub fn update_mission(
        &self,
        account: &mut UserAccount,
        mission: &mut MissionInstance,
        new_value: f64,
        now: u64,
    ) -> Result<MissionOutcome> {
        if mission.owner_id() != account.id() {
            return Err(EngineError::NotFound(format!(
                "mission {} of account {}",
                mission.id(),
                account.id()
            )));
        }

        let update = mission.update_progress(new_value, now)?;
        if !update.reward_issued {
            return Ok(MissionOutcome {
                reward_issued: false,
                status: update.status,
                current_value: update.current_value,
                badges_issued: Vec::new(),
                application: None,
            });
        }

        let mut application = account.award_points(
            update.reward_points,
            RewardSource::Mission {
                mission_id: mission.id().to_string(),
                kind: mission.kind(),
            },
            now,
            &self.config.levels,
        );
        let badges_issued = account.award_badges(&update.badges, now);
        application.badges_issued.clone_from(&badges_issued);

        Ok(MissionOutcome {
            reward_issued: true,
            status: update.status,
            current_value: update.current_value,
            badges_issued,
            application: Some(application),
        })
    }

    /// Records activity at `now`. The first activity of a day earns the
    /// daily bonus, plus the weekly or monthly streak bonus when the streak
    /// lands on a multiple of 7 or 30 days. Later activity the same day
    /// changes nothing.
    pub fn record_participation(&self, account: &mut UserAccount, now: u64) -> RewardApplication {
        let mut application = RewardApplication {
            new_cumulative_points: account.cumulative_points(),
            level_up: false,
            new_level: None,
            badges_issued: Vec::new(),
        };

        let streak = account.streak_mut();
        if !streak.record(day_index(now)) {
            return application;
        }
        let days = streak.current;

        let mut awards = vec![(self.config.daily_bonus_points, RewardSource::DailyBonus)];
        if days % WEEKLY_STREAK_DAYS == 0 {
            awards.push((self.config.weekly_streak_bonus, RewardSource::StreakBonus { days }));
        }
        if days % MONTHLY_STREAK_DAYS == 0 {
            awards.push((self.config.monthly_streak_bonus, RewardSource::StreakBonus { days }));
        }

        for (amount, source) in awards {
            let step = account.award_points(amount, source, now, &self.config.levels);
            application.new_cumulative_points = step.new_cumulative_points;
            if step.level_up {
                application.level_up = true;
                application.new_level = step.new_level;
            }
        }

        let stats = ActivityStats {
            reports_submitted: account.reports_submitted(),
            consecutive_days: days,
            ..ActivityStats::default()
        };
        application.badges_issued = self.award_earned_badges(account, &stats, now);
        tracing::debug!(account = %account.id(), streak = days, "participation recorded");
        application
    }

    /// Awards every badge whose rule `stats` meets and `account` lacks.
    pub fn award_earned_badges(
        &self,
        account: &mut UserAccount,
        stats: &ActivityStats,
        now: u64,
    ) -> Vec<BadgeKind> {
        let earned = evaluate_badges(stats, account.badges());
        account.award_badges(&earned, now)
    }

    /// Level progress of `account`.
    #[must_use]
    pub fn level_progress(&self, account: &UserAccount) -> LevelProgress {
        account.level_progress(&self.config.levels)
    }
}
