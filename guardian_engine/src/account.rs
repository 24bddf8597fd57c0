// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! User accounts: points, badges, history and participation streaks.
//!
//! The caller owns the account record and persists it; the engine only
//! computes transitions on it.

use serde::{Deserialize, Serialize};

use crate::badge::{BadgeKind, BadgeSet};
use crate::level::{LevelDefinition, LevelProgress, LevelTable};
use crate::mission::MissionKind;

/// Why points were awarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewardSource {
    /// A hazard report.
    Report {
        /// Report id.
        report_id: String,
    },
    /// A completed mission.
    Mission {
        /// Mission id.
        mission_id: String,
        /// Mission kind.
        kind: MissionKind,
    },
    /// First activity of the day.
    DailyBonus,
    /// Streak milestone.
    StreakBonus {
        /// Streak length that earned the bonus.
        days: u32,
    },
    /// Manual grant by an operator.
    Manual {
        /// Free-text reason.
        reason: String,
    },
}

/// One line of an account's points history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsEntry {
    /// Points added.
    pub amount: u64,
    /// Why.
    pub source: RewardSource,
    /// When, unix millis.
    pub at: u64,
}

/// Consecutive-day participation counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStreak {
    /// Current streak in days.
    pub current: u32,
    /// Longest streak ever.
    pub best: u32,
    /// Last active day (days since epoch), `None` before any activity.
    pub last_day: Option<u64>,
}

impl ParticipationStreak {
    /// Records activity on `day` (days since epoch). Returns `true` if this is
    /// the first activity of that day.
    ///
    /// Days earlier than the last recorded day are ignored.
    pub fn record(&mut self, day: u64) -> bool {
        match self.last_day {
            None => {
                self.current = 1;
            }
            Some(last) if day <= last => return false,
            Some(last) if last.checked_add(1) == Some(day) => {
                self.current = self.current.saturating_add(1);
            }
            Some(_) => {
                // Streak broken
                self.current = 1;
            }
        }
        self.best = self.best.max(self.current);
        self.last_day = Some(day);
        true
    }
}

/// What a point award did to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardApplication {
    /// Total after the award.
    pub new_cumulative_points: u64,
    /// Whether the level number increased.
    pub level_up: bool,
    /// New level, present only on level-up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<LevelDefinition>,
    /// Badges newly awarded by the same operation.
    pub badges_issued: Vec<BadgeKind>,
}

/// A participant's gamification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    id: String,
    cumulative_points: u64,
    badges: BadgeSet,
    history: Vec<PointsEntry>,
    streak: ParticipationStreak,
    reports_submitted: u64,
    created_at: u64,
}

impl UserAccount {
    /// Creates an account with no points.
    #[must_use]
    pub fn new(id: impl Into<String>, now: u64) -> Self {
        Self {
            id: id.into(),
            cumulative_points: 0,
            badges: BadgeSet::new(),
            history: Vec::new(),
            streak: ParticipationStreak::default(),
            reports_submitted: 0,
            created_at: now,
        }
    }

    /// Account id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Total points ever earned.
    #[must_use]
    pub fn cumulative_points(&self) -> u64 {
        self.cumulative_points
    }

    /// Badges held.
    #[must_use]
    pub fn badges(&self) -> &BadgeSet {
        &self.badges
    }

    /// Points history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PointsEntry] {
        &self.history
    }

    /// Participation streak.
    #[must_use]
    pub fn streak(&self) -> &ParticipationStreak {
        &self.streak
    }

    /// Reports filed so far.
    #[must_use]
    pub fn reports_submitted(&self) -> u64 {
        self.reports_submitted
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Current level, derived from points.
    #[must_use]
    pub fn level<'a>(&self, table: &'a LevelTable) -> &'a LevelDefinition {
        table.level_at(self.cumulative_points)
    }

    /// Current level progress, derived from points.
    #[must_use]
    pub fn level_progress(&self, table: &LevelTable) -> LevelProgress {
        table.progress(self.cumulative_points)
    }

    /// Adds points and records them in the history. Saturates at `u64::MAX`.
    pub fn award_points(
        &mut self,
        amount: u64,
        source: RewardSource,
        now: u64,
        table: &LevelTable,
    ) -> RewardApplication {
        let transition = table.transition(self.cumulative_points, amount);
        self.cumulative_points = transition.new_points;
        if amount > 0 {
            self.history.push(PointsEntry {
                amount,
                source,
                at: now,
            });
        }
        if transition.level_up {
            tracing::info!(
                account = %self.id,
                level = transition.new_level.level_number,
                title = %transition.new_level.title,
                points = self.cumulative_points,
                "level up"
            );
        }
        RewardApplication {
            new_cumulative_points: self.cumulative_points,
            level_up: transition.level_up,
            new_level: transition.level_up.then_some(transition.new_level),
            badges_issued: Vec::new(),
        }
    }

    /// Awards a badge. Returns `false` if already held.
    pub fn award_badge(&mut self, kind: BadgeKind, now: u64) -> bool {
        let awarded = self.badges.award(kind, now);
        if awarded {
            tracing::info!(account = %self.id, badge = %kind, "badge awarded");
        }
        awarded
    }

    /// Awards each badge not yet held; returns the ones newly awarded.
    pub fn award_badges(&mut self, kinds: &[BadgeKind], now: u64) -> Vec<BadgeKind> {
        kinds
            .iter()
            .copied()
            .filter(|&kind| self.award_badge(kind, now))
            .collect()
    }

    /// Sum of points earned at or after `since`.
    #[must_use]
    pub fn points_since(&self, since: u64) -> u64 {
        self.history
            .iter()
            .filter(|e| e.at >= since)
            .fold(0u64, |acc, e| acc.saturating_add(e.amount))
    }

    pub(crate) fn record_report(&mut self) -> u64 {
        self.reports_submitted = self.reports_submitted.saturating_add(1);
        self.reports_submitted
    }

    pub(crate) fn streak_mut(&mut self) -> &mut ParticipationStreak {
        &mut self.streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LevelTable {
        LevelTable::new(vec![
            LevelDefinition::new(1, "One", 0),
            LevelDefinition::new(2, "Two", 1000),
            LevelDefinition::new(3, "Three", 5000),
        ])
        .unwrap()
    }

    fn manual(reason: &str) -> RewardSource {
        RewardSource::Manual {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_new_account() {
        let account = UserAccount::new("u1", 7);
        assert_eq!(account.cumulative_points(), 0);
        assert_eq!(account.level(&table()).level_number, 1);
        assert!(account.badges().is_empty());
        assert_eq!(account.created_at(), 7);
    }

    #[test]
    fn test_award_points_level_up() {
        let table = table();
        let mut account = UserAccount::new("u1", 0);
        account.award_points(4800, manual("seed"), 1, &table);
        let applied = account.award_points(500, manual("report"), 2, &table);
        assert_eq!(applied.new_cumulative_points, 5300);
        assert!(applied.level_up);
        assert_eq!(applied.new_level.unwrap().level_number, 3);
    }

    #[test]
    fn test_award_points_no_level_up() {
        let table = table();
        let mut account = UserAccount::new("u1", 0);
        let applied = account.award_points(10, manual("x"), 1, &table);
        assert!(!applied.level_up);
        assert!(applied.new_level.is_none());
    }

    #[test]
    fn test_award_points_saturates() {
        let table = table();
        let mut account = UserAccount::new("u1", 0);
        account.award_points(u64::MAX - 1, manual("a"), 1, &table);
        let applied = account.award_points(100, manual("b"), 2, &table);
        assert_eq!(applied.new_cumulative_points, u64::MAX);
    }

    #[test]
    fn test_zero_award_not_recorded() {
        let mut account = UserAccount::new("u1", 0);
        account.award_points(0, manual("nothing"), 1, &table());
        assert!(account.history().is_empty());
    }

    #[test]
    fn test_badge_idempotent() {
        let mut account = UserAccount::new("u1", 0);
        assert!(account.award_badge(BadgeKind::EnergySaver, 1));
        assert!(!account.award_badge(BadgeKind::EnergySaver, 2));
        assert_eq!(account.badges().len(), 1);
        let issued = account.award_badges(
            &[BadgeKind::EnergySaver, BadgeKind::StreakWarrior],
            3,
        );
        assert_eq!(issued, vec![BadgeKind::StreakWarrior]);
        assert_eq!(account.badges().len(), 2);
    }

    #[test]
    fn test_points_since() {
        let table = table();
        let mut account = UserAccount::new("u1", 0);
        account.award_points(100, manual("old"), 10, &table);
        account.award_points(200, manual("new"), 20, &table);
        account.award_points(300, manual("newer"), 30, &table);
        assert_eq!(account.points_since(0), 600);
        assert_eq!(account.points_since(20), 500);
        assert_eq!(account.points_since(31), 0);
    }

    #[test]
    fn test_streak_first_activity() {
        let mut streak = ParticipationStreak::default();
        assert!(streak.record(100));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.best, 1);
    }

    #[test]
    fn test_streak_consecutive() {
        let mut streak = ParticipationStreak::default();
        streak.record(100);
        streak.record(101);
        streak.record(102);
        assert_eq!(streak.current, 3);
        assert_eq!(streak.best, 3);
    }

    #[test]
    fn test_streak_broken() {
        let mut streak = ParticipationStreak::default();
        streak.record(100);
        streak.record(101);
        streak.record(103);
        assert_eq!(streak.current, 1);
        assert_eq!(streak.best, 2);
    }

    #[test]
    fn test_streak_same_day_and_past() {
        let mut streak = ParticipationStreak::default();
        assert!(streak.record(100));
        assert!(!streak.record(100));
        assert!(!streak.record(99));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.last_day, Some(100));
    }

    #[test]
    fn test_streak_at_max_day() {
        let mut streak = ParticipationStreak {
            current: 4,
            best: 4,
            last_day: Some(u64::MAX - 1),
        };
        assert!(streak.record(u64::MAX));
        assert_eq!(streak.current, 5);

        assert!(!streak.record(u64::MAX));
        assert_eq!(streak.current, 5);
        assert_eq!(streak.last_day, Some(u64::MAX));
    }

    #[test]
    fn test_reward_application_serialization() {
        let applied = RewardApplication {
            new_cumulative_points: 5300,
            level_up: true,
            new_level: Some(LevelDefinition::new(3, "Three", 5000)),
            badges_issued: vec![BadgeKind::FirstReport],
        };
        let json = serde_json::to_string(&applied).expect("serialization failed");
        assert!(json.contains("\"newCumulativePoints\":5300"));
        assert!(json.contains("\"levelUp\":true"));
        assert!(json.contains("\"badgesIssued\":[\"first_report\"]"));

        let quiet = RewardApplication {
            new_cumulative_points: 1,
            level_up: false,
            new_level: None,
            badges_issued: vec![],
        };
        let json = serde_json::to_string(&quiet).unwrap();
        assert!(!json.contains("newLevel"));
    }

    #[test]
    fn test_account_serialization() {
        let table = table();
        let mut account = UserAccount::new("u1", 0);
        account.award_points(
            300,
            RewardSource::Mission {
                mission_id: "m1".into(),
                kind: MissionKind::PeakReduction,
            },
            5,
            &table,
        );
        account.award_badge(BadgeKind::PeakDestroyer, 5);
        let json = serde_json::to_string(&account).expect("serialization failed");
        let decoded: UserAccount = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded, account);
    }
}
