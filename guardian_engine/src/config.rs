// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Engine configuration.
//!
//! Defaults reproduce the live K-Grid Guardians reward rules. Individual
//! values can be overridden from the environment with [`EngineConfig::from_env`]
//! or loaded from any serde format.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::level::LevelTable;
use crate::mission::validate_mission_table;
use crate::severity::{RiskTier, BASE_REPORT_POINTS};

/// Environment variable for the base report points.
pub const ENV_BASE_REPORT_POINTS: &str = "GUARDIAN_BASE_REPORT_POINTS";
/// Environment variable for the daily participation bonus.
pub const ENV_DAILY_BONUS_POINTS: &str = "GUARDIAN_DAILY_BONUS_POINTS";
/// Environment variable for the 7-day streak bonus.
pub const ENV_WEEKLY_STREAK_BONUS: &str = "GUARDIAN_WEEKLY_STREAK_BONUS";
/// Environment variable for the 30-day streak bonus.
pub const ENV_MONTHLY_STREAK_BONUS: &str = "GUARDIAN_MONTHLY_STREAK_BONUS";

/// Default daily participation bonus.
pub const DEFAULT_DAILY_BONUS_POINTS: u64 = 20;
/// Default bonus at every multiple of [`WEEKLY_STREAK_DAYS`].
pub const DEFAULT_WEEKLY_STREAK_BONUS: u64 = 100;
/// Default bonus at every multiple of [`MONTHLY_STREAK_DAYS`].
pub const DEFAULT_MONTHLY_STREAK_BONUS: u64 = 500;
/// Streak length of the weekly bonus.
pub const WEEKLY_STREAK_DAYS: u32 = 7;
/// Streak length of the monthly bonus.
pub const MONTHLY_STREAK_DAYS: u32 = 30;

mod env_parse {
    use super::{EngineError, Result};

    /// Parse a u64 from an environment variable.
    pub fn parse_u64(key: &str) -> Option<Result<u64>> {
        std::env::var(key).ok().map(|val| {
            val.trim()
                .parse()
                .map_err(|e| EngineError::InvalidConfig(format!("invalid {key}: {e}")))
        })
    }
}

/// Reward rule parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Points for a LOW-tier report; higher tiers multiply it.
    pub base_report_points: u64,
    /// Level ladder.
    pub levels: LevelTable,
    /// Points for the first activity of a day. 0 disables.
    pub daily_bonus_points: u64,
    /// Points when a streak reaches a multiple of 7 days.
    pub weekly_streak_bonus: u64,
    /// Points when a streak reaches a multiple of 30 days.
    pub monthly_streak_bonus: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_report_points: BASE_REPORT_POINTS,
            levels: LevelTable::default(),
            daily_bonus_points: DEFAULT_DAILY_BONUS_POINTS,
            weekly_streak_bonus: DEFAULT_WEEKLY_STREAK_BONUS,
            monthly_streak_bonus: DEFAULT_MONTHLY_STREAK_BONUS,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable is set but unparsable, or if the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(result) = env_parse::parse_u64(ENV_BASE_REPORT_POINTS) {
            config.base_report_points = result?;
            tracing::info!(value = config.base_report_points, "base report points overridden");
        }
        if let Some(result) = env_parse::parse_u64(ENV_DAILY_BONUS_POINTS) {
            config.daily_bonus_points = result?;
            tracing::info!(value = config.daily_bonus_points, "daily bonus overridden");
        }
        if let Some(result) = env_parse::parse_u64(ENV_WEEKLY_STREAK_BONUS) {
            config.weekly_streak_bonus = result?;
            tracing::info!(value = config.weekly_streak_bonus, "weekly streak bonus overridden");
        }
        if let Some(result) = env_parse::parse_u64(ENV_MONTHLY_STREAK_BONUS) {
            config.monthly_streak_bonus = result?;
            tracing::info!(
                value = config.monthly_streak_bonus,
                "monthly streak bonus overridden"
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base report points.
    #[must_use]
    pub const fn with_base_report_points(mut self, points: u64) -> Self {
        self.base_report_points = points;
        self
    }

    /// Set the level table.
    #[must_use]
    pub fn with_levels(mut self, levels: LevelTable) -> Self {
        self.levels = levels;
        self
    }

    /// Set the daily participation bonus.
    #[must_use]
    pub const fn with_daily_bonus_points(mut self, points: u64) -> Self {
        self.daily_bonus_points = points;
        self
    }

    /// Set the weekly streak bonus.
    #[must_use]
    pub const fn with_weekly_streak_bonus(mut self, points: u64) -> Self {
        self.weekly_streak_bonus = points;
        self
    }

    /// Set the monthly streak bonus.
    #[must_use]
    pub const fn with_monthly_streak_bonus(mut self, points: u64) -> Self {
        self.monthly_streak_bonus = points;
        self
    }

    /// Checks the configuration and the static mission table. Level table
    /// invariants are enforced when the table is built.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.base_report_points == 0 {
            return Err(EngineError::InvalidConfig(
                "base_report_points must be greater than 0".to_string(),
            ));
        }

        if self
            .base_report_points
            .checked_mul(RiskTier::High.multiplier())
            .is_none()
        {
            return Err(EngineError::InvalidConfig(format!(
                "base_report_points {} overflows the high-risk multiplier",
                self.base_report_points
            )));
        }

        validate_mission_table()
    }
}
