// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! Level ledger: cumulative points to level, title and progress.
//!
//! Levels come from a static threshold table sorted ascending. Every
//! non-negative point total maps to exactly one level, and the mapping is
//! monotonic, so a point award can only ever move an account up.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A rung of the level ladder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDefinition {
    /// Level number, starting at 1.
    pub level_number: u32,
    /// Display title.
    pub title: String,
    /// Minimum cumulative points to hold this level.
    pub point_threshold: u64,
}

impl LevelDefinition {
    /// Creates a level definition.
    #[must_use]
    pub fn new(level_number: u32, title: impl Into<String>, point_threshold: u64) -> Self {
        Self {
            level_number,
            title: title.into(),
            point_threshold,
        }
    }
}

/// Default guardian ladder.
const DEFAULT_LEVELS: [(u32, &str, u64); 5] = [
    (1, "Rookie Guardian", 0),
    (2, "Dedicated Guardian", 1_000),
    (3, "Veteran Guardian", 5_000),
    (4, "Elite Guardian", 15_000),
    (5, "Legendary Guardian", 50_000),
];

/// Validated, ascending level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelDefinition>", into = "Vec<LevelDefinition>")]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS
                .iter()
                .map(|&(n, title, threshold)| LevelDefinition::new(n, title, threshold))
                .collect(),
        }
    }
}

impl TryFrom<Vec<LevelDefinition>> for LevelTable {
    type Error = EngineError;

    fn try_from(levels: Vec<LevelDefinition>) -> Result<Self> {
        Self::new(levels)
    }
}

impl From<LevelTable> for Vec<LevelDefinition> {
    fn from(table: LevelTable) -> Self {
        table.levels
    }
}

impl LevelTable {
    /// Builds a table, checking that it is non-empty, starts at 0 points and
    /// strictly increases in both level number and threshold.
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self> {
        let first = levels
            .first()
            .ok_or_else(|| EngineError::InvalidConfig("level table is empty".into()))?;
        if first.point_threshold != 0 {
            return Err(EngineError::InvalidConfig(format!(
                "first level must start at 0 points, got {}",
                first.point_threshold
            )));
        }
        if first.level_number == 0 {
            return Err(EngineError::InvalidConfig(
                "level numbers must be positive".into(),
            ));
        }
        for pair in levels.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if hi.level_number <= lo.level_number {
                return Err(EngineError::InvalidConfig(format!(
                    "level numbers must strictly increase: {} then {}",
                    lo.level_number, hi.level_number
                )));
            }
            if hi.point_threshold <= lo.point_threshold {
                return Err(EngineError::InvalidConfig(format!(
                    "thresholds must strictly increase: level {} at {} then level {} at {}",
                    lo.level_number, lo.point_threshold, hi.level_number, hi.point_threshold
                )));
            }
        }
        Ok(Self { levels })
    }

    /// Definitions in ascending order.
    #[must_use]
    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    /// Highest level in the table.
    #[must_use]
    pub fn max_level(&self) -> &LevelDefinition {
        // Non-empty by construction.
        &self.levels[self.levels.len() - 1]
    }

    fn checked_points(points: i64) -> Result<u64> {
        u64::try_from(points).map_err(|_| EngineError::InvalidPoints(points))
    }

    /// Index of the highest level whose threshold is at most `points`.
    fn index_for(&self, points: u64) -> usize {
        // Thresholds are sorted and the first is 0, so the partition point is >= 1.
        self.levels
            .partition_point(|l| l.point_threshold <= points)
            .saturating_sub(1)
    }

    /// Level held at `points`. Negative points fail with [`EngineError::InvalidPoints`].
    pub fn level_for(&self, points: i64) -> Result<&LevelDefinition> {
        Ok(self.level_at(Self::checked_points(points)?))
    }

    /// Level held at a non-negative point total.
    #[must_use]
    pub fn level_at(&self, points: u64) -> &LevelDefinition {
        &self.levels[self.index_for(points)]
    }

    /// Level following the one held at `points`, if any.
    #[must_use]
    pub fn next_level_at(&self, points: u64) -> Option<&LevelDefinition> {
        self.levels.get(self.index_for(points) + 1)
    }

    /// Fraction of the way from the current level to the next, in `0..=1`.
    /// Saturates at exactly 1.0 on the top level.
    pub fn progress_fraction(&self, points: i64) -> Result<f64> {
        Ok(self.progress(Self::checked_points(points)?).fraction)
    }

    /// Points still needed for the next level, 0 on the top level.
    pub fn points_to_next_level(&self, points: i64) -> Result<u64> {
        let points = Self::checked_points(points)?;
        Ok(self
            .next_level_at(points)
            .map_or(0, |next| next.point_threshold - points))
    }

    /// Full progress snapshot at a point total.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self, points: u64) -> LevelProgress {
        let current = self.level_at(points);
        let next = self.next_level_at(points);

        let points_in_level = points - current.point_threshold;
        let (points_for_level, fraction) = match next {
            Some(next) => {
                let span = next.point_threshold - current.point_threshold;
                (span, (points_in_level as f64 / span as f64).min(1.0))
            }
            None => (0, 1.0),
        };

        LevelProgress {
            level: current.level_number,
            title: current.title.clone(),
            current_points: points,
            points_in_level,
            points_for_level,
            fraction,
            is_max_level: next.is_none(),
        }
    }

    /// Outcome of moving from `old_points` to `old_points + delta`.
    #[must_use]
    pub fn transition(&self, old_points: u64, delta: u64) -> LevelTransition {
        let new_points = old_points.saturating_add(delta);
        let old_level = self.level_at(old_points);
        let new_level = self.level_at(new_points);
        LevelTransition {
            new_points,
            level_up: new_level.level_number > old_level.level_number,
            new_level: new_level.clone(),
        }
    }
}

/// Result of applying a point delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTransition {
    /// Total after the delta.
    pub new_points: u64,
    /// Whether the level number increased.
    pub level_up: bool,
    /// Level held after the delta.
    pub new_level: LevelDefinition,
}

/// Progress within the current level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    /// Current level number.
    pub level: u32,
    /// Current level title.
    pub title: String,
    /// Total points accumulated.
    pub current_points: u64,
    /// Points earned since reaching the current level.
    pub points_in_level: u64,
    /// Width of the current level in points, 0 at the top level.
    pub points_for_level: u64,
    /// Fraction toward the next level.
    pub fraction: f64,
    /// Whether at the top level.
    pub is_max_level: bool,
}

impl LevelProgress {
    /// Fraction as a percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.fraction * 100.0
    }
}
