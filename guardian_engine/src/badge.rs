// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Badge catalogue, per-account badge sets and unlock rules.
//!
//! Badges are at-most-once per account: awarding a held kind is a silent no-op.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Every badge the platform can award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    /// First safety report filed.
    FirstReport,
    /// Peak-hour usage cut by half or more.
    PeakDestroyer,
    /// 100 kWh or more saved in a month.
    EnergySaver,
    /// Most reports in the neighborhood.
    NeighborhoodHero,
    /// Seven consecutive days of participation.
    StreakWarrior,
}

impl BadgeKind {
    /// Catalogue order.
    pub const ALL: [Self; 5] = [
        Self::FirstReport,
        Self::PeakDestroyer,
        Self::EnergySaver,
        Self::NeighborhoodHero,
        Self::StreakWarrior,
    ];

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstReport => "first_report",
            Self::PeakDestroyer => "peak_destroyer",
            Self::EnergySaver => "energy_saver",
            Self::NeighborhoodHero => "neighborhood_hero",
            Self::StreakWarrior => "streak_warrior",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FirstReport => "First Report",
            Self::PeakDestroyer => "Peak Destroyer",
            Self::EnergySaver => "Energy Saver",
            Self::NeighborhoodHero => "Neighborhood Hero",
            Self::StreakWarrior => "Streak Warrior",
        }
    }

    /// How the badge is earned.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstReport => "Filed your first safety report",
            Self::PeakDestroyer => "Cut peak-hour electricity use by 50% or more",
            Self::EnergySaver => "Saved 100 kWh or more in a month",
            Self::NeighborhoodHero => "Filed the most reports in your neighborhood",
            Self::StreakWarrior => "Took part in missions 7 days in a row",
        }
    }

    /// Icon asset path.
    #[must_use]
    pub const fn icon_path(self) -> &'static str {
        match self {
            Self::FirstReport => "/badges/first-report.svg",
            Self::PeakDestroyer => "/badges/peak-destroyer.svg",
            Self::EnergySaver => "/badges/energy-saver.svg",
            Self::NeighborhoodHero => "/badges/neighborhood-hero.svg",
            Self::StreakWarrior => "/badges/streak-warrior.svg",
        }
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EngineError::UnknownBadgeKind(s.to_string()))
    }
}

/// A badge held by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    /// Which badge.
    pub kind: BadgeKind,
    /// Unix millis of the first award.
    pub unlocked_at: u64,
}

/// Badges held by one account, unique by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BadgeAward>", into = "Vec<BadgeAward>")]
pub struct BadgeSet {
    awards: BTreeMap<BadgeKind, BadgeAward>,
}

impl From<Vec<BadgeAward>> for BadgeSet {
    fn from(list: Vec<BadgeAward>) -> Self {
        let mut set = Self::new();
        for award in list {
            set.award(award.kind, award.unlocked_at);
        }
        set
    }
}

impl From<BadgeSet> for Vec<BadgeAward> {
    fn from(set: BadgeSet) -> Self {
        set.awards.into_values().collect()
    }
}

impl BadgeSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Awards `kind`. Returns `false` without touching the set if already held.
    pub fn award(&mut self, kind: BadgeKind, now: u64) -> bool {
        if self.awards.contains_key(&kind) {
            return false;
        }
        self.awards.insert(
            kind,
            BadgeAward {
                kind,
                unlocked_at: now,
            },
        );
        true
    }

    /// Whether `kind` is held.
    #[must_use]
    pub fn contains(&self, kind: BadgeKind) -> bool {
        self.awards.contains_key(&kind)
    }

    /// Award record for `kind`.
    #[must_use]
    pub fn get(&self, kind: BadgeKind) -> Option<&BadgeAward> {
        self.awards.get(&kind)
    }

    /// Number of badges held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.awards.len()
    }

    /// Whether no badges are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.awards.is_empty()
    }

    /// Held awards in catalogue order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &BadgeAward> {
        self.awards.values()
    }
}

/// Activity counters the badge rules look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    /// Safety reports filed, including the one being processed.
    pub reports_submitted: u64,
    /// Energy saved this month, kWh.
    pub monthly_savings_kwh: f64,
    /// Best peak-hour reduction this period, percent.
    pub peak_reduction_percent: f64,
    /// Current participation streak in days.
    pub consecutive_days: u32,
    /// Whether the account leads its neighborhood board.
    pub is_local_leader: bool,
}

/// Minimum peak-hour reduction for [`BadgeKind::PeakDestroyer`].
pub const PEAK_DESTROYER_PERCENT: f64 = 50.0;
/// Minimum monthly savings for [`BadgeKind::EnergySaver`].
pub const ENERGY_SAVER_KWH: f64 = 100.0;
/// Minimum streak for [`BadgeKind::StreakWarrior`].
pub const STREAK_WARRIOR_DAYS: u32 = 7;

fn rule_met(kind: BadgeKind, stats: &ActivityStats) -> bool {
    match kind {
        BadgeKind::FirstReport => stats.reports_submitted >= 1,
        BadgeKind::PeakDestroyer => stats.peak_reduction_percent >= PEAK_DESTROYER_PERCENT,
        BadgeKind::EnergySaver => stats.monthly_savings_kwh >= ENERGY_SAVER_KWH,
        BadgeKind::NeighborhoodHero => stats.is_local_leader,
        BadgeKind::StreakWarrior => stats.consecutive_days >= STREAK_WARRIOR_DAYS,
    }
}

/// Badges whose rule is met by `stats` and that are not yet in `held`,
/// in catalogue order. Pure; the caller performs the awards.
#[must_use]
pub fn evaluate_badges(stats: &ActivityStats, held: &BadgeSet) -> Vec<BadgeKind> {
    BadgeKind::ALL
        .into_iter()
        .filter(|&kind| !held.contains(kind) && rule_met(kind, stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_idempotent() {
        let mut set = BadgeSet::new();
        assert!(set.award(BadgeKind::FirstReport, 10));
        assert!(!set.award(BadgeKind::FirstReport, 20));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(BadgeKind::FirstReport).unwrap().unlocked_at, 10);
    }

    #[test]
    fn test_badge_kind_round_trip_names() {
        for kind in BadgeKind::ALL {
            assert_eq!(kind.as_str().parse::<BadgeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_badge_kind() {
        assert_eq!(
            "gold_star".parse::<BadgeKind>().unwrap_err(),
            EngineError::UnknownBadgeKind("gold_star".into())
        );
    }

    #[test]
    fn test_badge_kind_serde_matches_as_str() {
        for kind in BadgeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_evaluate_nothing() {
        let held = BadgeSet::new();
        assert!(evaluate_badges(&ActivityStats::default(), &held).is_empty());
    }

    #[test]
    fn test_evaluate_thresholds() {
        let held = BadgeSet::new();
        let stats = ActivityStats {
            reports_submitted: 1,
            monthly_savings_kwh: 100.0,
            peak_reduction_percent: 49.9,
            consecutive_days: 7,
            is_local_leader: false,
        };
        assert_eq!(
            evaluate_badges(&stats, &held),
            vec![
                BadgeKind::FirstReport,
                BadgeKind::EnergySaver,
                BadgeKind::StreakWarrior
            ]
        );
    }

    #[test]
    fn test_evaluate_skips_held() {
        let mut held = BadgeSet::new();
        held.award(BadgeKind::NeighborhoodHero, 1);
        let stats = ActivityStats {
            is_local_leader: true,
            peak_reduction_percent: 60.0,
            ..Default::default()
        };
        assert_eq!(evaluate_badges(&stats, &held), vec![BadgeKind::PeakDestroyer]);
    }

    #[test]
    fn test_badge_set_deserialize_drops_duplicates() {
        let json = r#"[
            {"kind": "energy_saver", "unlockedAt": 5},
            {"kind": "energy_saver", "unlockedAt": 9}
        ]"#;
        let set: BadgeSet = serde_json::from_str(json).expect("valid badge list");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(BadgeKind::EnergySaver).unwrap().unlocked_at, 5);
    }

    #[test]
    fn test_catalogue_metadata() {
        assert_eq!(BadgeKind::StreakWarrior.display_name(), "Streak Warrior");
        assert!(BadgeKind::EnergySaver.description().contains("100 kWh"));
        assert_eq!(BadgeKind::FirstReport.icon_path(), "/badges/first-report.svg");
    }

    #[test]
    fn test_badge_set_iter_in_catalogue_order() {
        let mut set = BadgeSet::new();
        set.award(BadgeKind::StreakWarrior, 3);
        set.award(BadgeKind::FirstReport, 4);
        let kinds: Vec<BadgeKind> = set.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![BadgeKind::FirstReport, BadgeKind::StreakWarrior]);
    }
}
