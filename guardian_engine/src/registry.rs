// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Thread-safe in-process account store.
//!
//! Each account and its missions sit behind one mutex. Every mutating call
//! holds that mutex for the whole read-modify-write, so concurrent updates
//! to the same account apply one at a time and none is lost. Different
//! accounts never contend.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::account::{RewardApplication, RewardSource, UserAccount};
use crate::badge::ActivityStats;
use crate::engine::{MissionOutcome, RewardEngine};
use crate::error::{EngineError, Result};
use crate::mission::{MissionInstance, MissionKind};
use crate::report::{HazardCategory, HazardReport};
use crate::severity::SeverityEstimate;

/// An account together with its missions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// The account.
    pub account: UserAccount,
    /// Missions by id.
    pub missions: BTreeMap<String, MissionInstance>,
}

impl AccountState {
    fn new(account: UserAccount) -> Self {
        Self {
            account,
            missions: BTreeMap::new(),
        }
    }

    fn split_mission(
        &mut self,
        mission_id: &str,
    ) -> Result<(&mut UserAccount, &mut MissionInstance)> {
        let mission = self.missions.get_mut(mission_id).ok_or_else(|| {
            EngineError::NotFound(format!("mission {mission_id} of account {}", self.account.id()))
        })?;
        Ok((&mut self.account, mission))
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    /// Account id.
    pub account_id: String,
    /// Cumulative points.
    pub points: u64,
    /// Level number.
    pub level: u32,
    /// Level title.
    pub title: String,
}

/// Shared store of account state.
pub struct AccountRegistry {
    engine: RewardEngine,
    accounts: DashMap<String, Arc<Mutex<AccountState>>>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(engine: RewardEngine) -> Self {
        Self {
            engine,
            accounts: DashMap::new(),
        }
    }

    /// Engine used for every update.
    #[must_use]
    pub fn engine(&self) -> &RewardEngine {
        &self.engine
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry holds no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether `account_id` exists.
    #[must_use]
    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.contains_key(account_id)
    }

    /// Returns the account, creating it at `now` if absent.
    #[allow(clippy::must_use_candidate)]
    pub fn open(&self, account_id: &str, now: u64) -> UserAccount {
        let handle = Arc::clone(
            self.accounts
                .entry(account_id.to_string())
                .or_insert_with(|| {
                    tracing::debug!(account = %account_id, "account opened");
                    Arc::new(Mutex::new(AccountState::new(UserAccount::new(
                        account_id, now,
                    ))))
                })
                .value(),
        );
        let state = handle.lock();
        state.account.clone()
    }

    /// Loads previously persisted state.
    ///
    /// An existing account keeps its lock and has its contents replaced under
    /// it, so callers already holding that account see the restored state and
    /// their later writes land on it.
    pub fn restore(&self, state: AccountState) {
        let id = state.account.id().to_string();
        let existing = match self.accounts.entry(id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(state)));
                return;
            }
        };
        *existing.lock() = state;
    }

    // Clone the handle out so the map shard is released before locking.
    fn handle(&self, account_id: &str) -> Result<Arc<Mutex<AccountState>>> {
        self.accounts
            .get(account_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))
    }

    fn with_state<T>(
        &self,
        account_id: &str,
        f: impl FnOnce(&mut AccountState) -> Result<T>,
    ) -> Result<T> {
        let handle = self.handle(account_id)?;
        let mut state = handle.lock();
        f(&mut state)
    }

    /// Copy of the account and its missions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account.
    pub fn snapshot(&self, account_id: &str) -> Result<AccountState> {
        self.with_state(account_id, |state| Ok(state.clone()))
    }

    /// Copy of one mission.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account or mission.
    pub fn mission(&self, account_id: &str, mission_id: &str) -> Result<MissionInstance> {
        self.with_state(account_id, |state| {
            state
                .split_mission(mission_id)
                .map(|(_, mission)| mission.clone())
        })
    }

    /// Files a report for `account_id`. See [`RewardEngine::submit_report`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account, or the engine's error.
    pub fn submit_report(
        &self,
        account_id: &str,
        estimate: &SeverityEstimate,
        category: HazardCategory,
        report_id: impl Into<String>,
        stats: &ActivityStats,
        now: u64,
    ) -> Result<(HazardReport, RewardApplication)> {
        self.with_state(account_id, |state| {
            self.engine
                .submit_report(&mut state.account, estimate, category, report_id, stats, now)
        })
    }

    /// Adds points to `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account.
    pub fn apply_points(
        &self,
        account_id: &str,
        delta: u64,
        source: RewardSource,
        now: u64,
    ) -> Result<RewardApplication> {
        self.with_state(account_id, |state| {
            Ok(self.engine.apply_points(&mut state.account, delta, source, now))
        })
    }

    /// Starts a mission. Starting an id that already exists returns the
    /// existing mission unchanged, so retries are safe.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account.
    pub fn start_mission(
        &self,
        account_id: &str,
        kind: MissionKind,
        mission_id: &str,
        now: u64,
    ) -> Result<MissionInstance> {
        self.with_state(account_id, |state| {
            if let Some(existing) = state.missions.get(mission_id) {
                return Ok(existing.clone());
            }
            let mission = self.engine.start_mission(&state.account, kind, mission_id, now);
            state.missions.insert(mission_id.to_string(), mission.clone());
            Ok(mission)
        })
    }

    /// Reports mission progress. See [`RewardEngine::update_mission`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account or mission, or
    /// `InvalidProgress` for a non-finite value.
    pub fn update_mission(
        &self,
        account_id: &str,
        mission_id: &str,
        new_value: f64,
        now: u64,
    ) -> Result<MissionOutcome> {
        self.with_state(account_id, |state| {
            let (account, mission) = state.split_mission(mission_id)?;
            self.engine.update_mission(account, mission, new_value, now)
        })
    }

    /// Pauses a mission. Returns `false` if it was not active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account or mission.
    pub fn pause_mission(&self, account_id: &str, mission_id: &str, now: u64) -> Result<bool> {
        self.with_state(account_id, |state| {
            let (_, mission) = state.split_mission(mission_id)?;
            Ok(mission.pause(now))
        })
    }

    /// Resumes a paused mission. Returns `false` if it was not paused.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account or mission.
    pub fn resume_mission(&self, account_id: &str, mission_id: &str, now: u64) -> Result<bool> {
        self.with_state(account_id, |state| {
            let (_, mission) = state.split_mission(mission_id)?;
            Ok(mission.resume(now))
        })
    }

    /// Records daily participation. See [`RewardEngine::record_participation`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown account.
    pub fn record_participation(&self, account_id: &str, now: u64) -> Result<RewardApplication> {
        self.with_state(account_id, |state| {
            Ok(self.engine.record_participation(&mut state.account, now))
        })
    }

    /// Top `limit` accounts by points, ties broken by id.
    #[must_use]
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let handles: Vec<Arc<Mutex<AccountState>>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut standings: Vec<(String, u64)> = handles
            .iter()
            .map(|handle| {
                let state = handle.lock();
                (
                    state.account.id().to_string(),
                    state.account.cumulative_points(),
                )
            })
            .collect();
        standings.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let levels = self.engine.levels();
        standings
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (account_id, points))| {
                let level = levels.level_at(points);
                LeaderboardEntry {
                    rank: i + 1,
                    account_id,
                    points,
                    level: level.level_number,
                    title: level.title.clone(),
                }
            })
            .collect()
    }
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new(RewardEngine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::BadgeKind;
    use crate::mission::MissionStatus;

    const T0: u64 = 1_700_000_000_000;

    fn manual() -> RewardSource {
        RewardSource::Manual {
            reason: "test".into(),
        }
    }

    #[test]
    fn test_open_is_get_or_create() {
        let registry = AccountRegistry::default();
        assert!(registry.is_empty());
        registry.open("u1", T0);
        registry.apply_points("u1", 50, manual(), T0).unwrap();
        let again = registry.open("u1", T0 + 5);
        assert_eq!(again.cumulative_points(), 50);
        assert_eq!(again.created_at(), T0);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("u1"));
    }

    #[test]
    fn test_unknown_account() {
        let registry = AccountRegistry::default();
        assert!(matches!(
            registry.snapshot("ghost"),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            registry.apply_points("ghost", 1, manual(), T0),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_mission() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        assert!(matches!(
            registry.update_mission("u1", "m9", 1.0, T0),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            registry.pause_mission("u1", "m9", T0),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_mission_flow() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        registry
            .start_mission("u1", MissionKind::MonthlySavings, "m1", T0)
            .unwrap();

        let outcome = registry.update_mission("u1", "m1", 15.0, T0 + 1).unwrap();
        assert!(outcome.reward_issued);
        assert_eq!(outcome.badges_issued, vec![BadgeKind::EnergySaver]);

        let state = registry.snapshot("u1").unwrap();
        assert_eq!(state.account.cumulative_points(), 500);
        assert_eq!(state.missions["m1"].status(), MissionStatus::Completed);
    }

    #[test]
    fn test_start_mission_is_idempotent() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        let first = registry
            .start_mission("u1", MissionKind::PeakReduction, "m1", T0)
            .unwrap();
        registry.update_mission("u1", "m1", 5.0, T0 + 1).unwrap();
        let second = registry
            .start_mission("u1", MissionKind::StandbyPower, "m1", T0 + 2)
            .unwrap();
        assert_eq!(second.kind(), first.kind());
        assert!((second.current_value() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pause_resume() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        let mission = registry
            .start_mission("u1", MissionKind::PeakReduction, "m1", T0)
            .unwrap();
        assert!(registry.pause_mission("u1", "m1", T0 + 10).unwrap());
        assert!(!registry.pause_mission("u1", "m1", T0 + 20).unwrap());
        assert!(registry.resume_mission("u1", "m1", T0 + 110).unwrap());
        let resumed = registry.mission("u1", "m1").unwrap();
        assert_eq!(resumed.deadline(), mission.deadline() + 100);
    }

    #[test]
    fn test_leaderboard_order_and_limit() {
        let registry = AccountRegistry::default();
        for (id, points) in [("carol", 300), ("alice", 1200), ("bob", 300), ("dave", 10)] {
            registry.open(id, T0);
            registry.apply_points(id, points, manual(), T0).unwrap();
        }

        let board = registry.leaderboard(3);
        let ids: Vec<&str> = board.iter().map(|e| e.account_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].level, 2);
        assert_eq!(board[0].title, "Dedicated Guardian");
        assert_eq!(board[2].rank, 3);
        assert!(registry.leaderboard(0).is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        registry.apply_points("u1", 42, manual(), T0).unwrap();
        let state = registry.snapshot("u1").unwrap();

        let json = serde_json::to_string(&state).expect("serialization failed");
        let decoded: AccountState = serde_json::from_str(&json).expect("deserialization failed");

        let other = AccountRegistry::default();
        other.restore(decoded);
        assert_eq!(other.snapshot("u1").unwrap(), state);
    }

    #[test]
    fn test_restore_keeps_existing_handle() {
        let registry = AccountRegistry::default();
        registry.open("u1", T0);
        registry.apply_points("u1", 42, manual(), T0).unwrap();
        let saved = registry.snapshot("u1").unwrap();
        registry.apply_points("u1", 100, manual(), T0 + 1).unwrap();

        let before = registry.handle("u1").unwrap();
        registry.restore(saved);
        let after = registry.handle("u1").unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(before.lock().account.cumulative_points(), 42);

        // A write through the handle taken before the restore is kept.
        {
            let mut state = before.lock();
            let engine = RewardEngine::default();
            engine.apply_points(&mut state.account, 8, manual(), T0 + 2);
        }
        assert_eq!(registry.snapshot("u1").unwrap().account.cumulative_points(), 50);
    }
}
