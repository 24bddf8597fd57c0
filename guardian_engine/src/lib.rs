// SPDX-License-Identifier: BSL-1.1 OR Apache-2.0
//! K-Grid Guardians rules engine
//!
//! This crate turns citizen activity on the grid-safety platform into
//! points, levels, badges and mission progress:
//!
//! - Severity scores from the hazard vision model become tiered report rewards
//! - Cumulative points map onto a level ladder with progress fractions
//! - Energy-saving missions track monotonic progress toward a target and pay
//!   out exactly once
//! - Badges are awarded at most once per account
//! - Daily participation builds streaks that earn bonuses
//!
//! The core is synchronous and pure over caller-owned state. [`AccountRegistry`]
//! adds per-account locking for callers that share accounts across threads.
//!
//! # Example
//!
//! ```
//! use guardian_engine::{
//!     AccountRegistry, ActivityStats, HazardCategory, MissionKind, RewardEngine,
//!     EngineConfig, SeverityEstimate,
//! };
//!
//! let engine = RewardEngine::new(EngineConfig::default())?;
//! let registry = AccountRegistry::new(engine);
//! registry.open("guardian-1", 0);
//!
//! let estimate = SeverityEstimate::new(8, 0.92);
//! let (report, applied) = registry.submit_report(
//!     "guardian-1",
//!     &estimate,
//!     HazardCategory::Tilting,
//!     "report-1",
//!     &ActivityStats::default(),
//!     0,
//! )?;
//! assert_eq!(report.reward_points, 500);
//! assert_eq!(applied.new_cumulative_points, 500);
//!
//! registry.start_mission("guardian-1", MissionKind::PeakReduction, "m-1", 0)?;
//! let outcome = registry.update_mission("guardian-1", "m-1", 25.0, 1)?;
//! assert!(outcome.reward_issued);
//! # Ok::<(), guardian_engine::EngineError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rustdoc::broken_intra_doc_links
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::use_self)]

pub mod account;
pub mod badge;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod level;
pub mod mission;
pub mod registry;
pub mod report;
pub mod severity;

pub use account::{ParticipationStreak, PointsEntry, RewardApplication, RewardSource, UserAccount};
pub use badge::{evaluate_badges, ActivityStats, BadgeAward, BadgeKind, BadgeSet};
pub use config::EngineConfig;
pub use engine::{MissionOutcome, RewardEngine};
pub use error::{EngineError, Result};
pub use level::{LevelDefinition, LevelProgress, LevelTable, LevelTransition};
pub use mission::{
    validate_mission_table, Difficulty, MissionConfig, MissionInstance, MissionKind,
    MissionStatus, MissionUpdate,
};
pub use registry::{AccountRegistry, AccountState, LeaderboardEntry};
pub use report::{HazardCategory, HazardReport, ReportStatus};
pub use severity::{
    compute_report_reward, reward_with_base, RiskTier, Severity, SeverityEstimate, Urgency,
    BASE_REPORT_POINTS,
};
