//! # Atelier Core
//!
//! Core game logic for Atelier: drawing scene normalization, art-movement
//! conformance scoring, and player progression. Pure logic with no I/O, so
//! the same crate backs the live advisory path and the authoritative save
//! path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  atelier-core                    │
//! ├──────────────────────────────────────────────────┤
//! │  Scene Graph      │  Normalizer                  │
//! │  - Shapes         │  - Canonical snapshot        │
//! │  - Z-order        │  - Tool-state stripping      │
//! ├──────────────────────────────────────────────────┤
//! │  Scoring Engine   │  Progression Ledger          │
//! │  - Rule tables    │  - XP / levels / coins       │
//! │  - Feedback       │  - Achievement unlocks       │
//! └──────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod movement;
pub mod progression;
pub mod scene;
pub mod score;
pub mod snapshot;

pub use error::{GameError, GameResult};
pub use movement::{Difficulty, Movement, MovementCatalog, RuleMetric, ScoringRule};
pub use progression::{
    builtin_achievements, Achievement, AchievementCondition, AwardSummary, LifetimeStats,
    ProgressionLedger, UserProgression,
};
pub use scene::{DrawingScene, PathPoint, SceneShape, ShapeForm, ShapeId};
pub use score::{score, ScoreResult, CATEGORY_MAX, TOTAL_MAX};
pub use snapshot::{normalize, CanvasObject, DrawingSnapshot, ShapeKind};

/// Core crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
