//! Player progression: experience, levels, coins, achievements.
//!
//! [`ProgressionLedger::apply`] is the only way progression advances. It is a
//! pure state transition from the previous progression plus the authoritative
//! score of one saved artwork to the next progression, returning an
//! [`AwardSummary`] delta. Levels, coins, and the unlocked-achievement set are
//! monotone under this transition.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::movement::{Movement, MovementCatalog};
use crate::score::ScoreResult;

/// Coins granted to a freshly provisioned user.
pub const STARTING_COINS: u64 = 100;

/// Experience required to advance from `level` to `level + 1`.
#[must_use]
pub fn level_threshold(level: u32) -> u64 {
    u64::from(level) * 100
}

/// A user's cumulative progression state.
///
/// Mutated only through [`ProgressionLedger::apply`]; the set of unlocked
/// movements is always derived from `level`, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgression {
    /// Current level, starting at 1.
    pub level: u32,
    /// Cumulative experience points.
    pub experience: u64,
    /// Spendable coin balance.
    pub coins: u64,
    /// Ids of unlocked achievements. Unlocks are permanent.
    pub achievements: BTreeSet<String>,
}

impl UserProgression {
    /// A freshly provisioned user: level 1, no experience, starting coins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: 1,
            experience: 0,
            coins: STARTING_COINS,
            achievements: BTreeSet::new(),
        }
    }

    /// Movements this user has unlocked: `{m : m.unlock_level <= level}`.
    pub fn movements_unlocked<'a>(
        &self,
        catalog: &'a MovementCatalog,
    ) -> impl Iterator<Item = &'a Movement> + 'a {
        let level = self.level;
        catalog.movements().filter(move |m| m.unlock_level <= level)
    }

    /// Check whether a movement is available at this user's level.
    #[must_use]
    pub fn can_use(&self, movement: &Movement) -> bool {
        movement.unlock_level <= self.level
    }
}

impl Default for UserProgression {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative lifetime statistics feeding achievement predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    /// Total artworks saved.
    pub artworks_created: u64,
    /// Best authoritative score across all saves.
    pub best_score: f64,
    /// Sum of authoritative scores across all saves.
    pub total_score: f64,
    /// Likes received across all artworks.
    pub likes_received: u64,
    /// Ids of movements the user has saved an artwork in.
    pub movements_tried: BTreeSet<String>,
}

/// A predicate over progression and lifetime statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", content = "params", rename_all = "snake_case")]
pub enum AchievementCondition {
    /// Save at least this many artworks.
    ArtworksCreated(u64),
    /// Reach at least this score on any single artwork.
    MinScore(f64),
    /// Save an artwork in every movement of the catalog.
    AllMovements,
    /// Reach at least this level.
    ReachLevel(u32),
    /// Receive at least this many likes.
    LikesReceived(u64),
}

/// An unlockable achievement with its coin reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    /// Stable identifier.
    pub achievement_id: String,
    /// Display name.
    pub name: String,
    /// Player-facing description.
    pub description: String,
    /// Coins granted when unlocked.
    pub coin_reward: u64,
    /// Unlock predicate.
    pub condition: AchievementCondition,
}

impl Achievement {
    fn new(
        achievement_id: &str,
        name: &str,
        description: &str,
        coin_reward: u64,
        condition: AchievementCondition,
    ) -> Self {
        Self {
            achievement_id: achievement_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            coin_reward,
            condition,
        }
    }
}

/// The built-in achievement set of the default deployment.
#[must_use]
pub fn builtin_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first-artwork",
            "First Stroke",
            "Create your first artwork",
            50,
            AchievementCondition::ArtworksCreated(1),
        ),
        Achievement::new(
            "five-artworks",
            "Creative Soul",
            "Create 5 artworks",
            100,
            AchievementCondition::ArtworksCreated(5),
        ),
        Achievement::new(
            "ten-artworks",
            "Prolific Artist",
            "Create 10 artworks",
            200,
            AchievementCondition::ArtworksCreated(10),
        ),
        Achievement::new(
            "perfect-score",
            "Perfection",
            "Get a perfect score (100+)",
            150,
            AchievementCondition::MinScore(100.0),
        ),
        Achievement::new(
            "all-movements",
            "Renaissance Artist",
            "Create an artwork in every movement",
            300,
            AchievementCondition::AllMovements,
        ),
        Achievement::new(
            "level-5",
            "Rising Star",
            "Reach level 5",
            100,
            AchievementCondition::ReachLevel(5),
        ),
        Achievement::new(
            "level-10",
            "Master Artist",
            "Reach level 10",
            250,
            AchievementCondition::ReachLevel(10),
        ),
        Achievement::new(
            "first-like",
            "Appreciated",
            "Receive your first like",
            25,
            AchievementCondition::LikesReceived(1),
        ),
    ]
}

/// The progression delta produced by one save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardSummary {
    /// Experience gained by this save.
    pub experience_gained: u64,
    /// Coins gained, including achievement rewards.
    pub coins_gained: u64,
    /// Achievements newly unlocked in this transition.
    pub newly_unlocked: Vec<String>,
    /// The new level, if it changed.
    pub new_level: Option<u32>,
}

/// The pure progression transition applied on every save.
#[derive(Debug, Clone)]
pub struct ProgressionLedger {
    achievements: Vec<Achievement>,
    movement_count: usize,
}

impl ProgressionLedger {
    /// Create a ledger over an achievement catalog.
    ///
    /// `movement_count` is the catalog size used by the all-movements
    /// predicate.
    #[must_use]
    pub fn new(achievements: Vec<Achievement>, movement_count: usize) -> Self {
        Self {
            achievements,
            movement_count,
        }
    }

    /// A ledger over the built-in achievement set.
    #[must_use]
    pub fn with_builtin(movement_count: usize) -> Self {
        Self::new(builtin_achievements(), movement_count)
    }

    /// The achievement catalog this ledger evaluates.
    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// Apply one saved artwork to a user's progression.
    ///
    /// Experience and coins scale with the authoritative score and the
    /// movement's difficulty multiplier; any save grants at least 1 XP. A
    /// single save may cross several level thresholds. Every still-locked
    /// achievement is re-evaluated against the post-save state; newly
    /// satisfied ones unlock and pay out within the same transition.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply(
        &self,
        progression: &UserProgression,
        stats: &LifetimeStats,
        score: &ScoreResult,
        movement: &Movement,
    ) -> (UserProgression, LifetimeStats, AwardSummary) {
        let multiplier = movement.difficulty.reward_multiplier();

        let mut next_stats = stats.clone();
        next_stats.artworks_created += 1;
        next_stats.best_score = next_stats.best_score.max(score.total_score);
        next_stats.total_score += score.total_score;
        next_stats
            .movements_tried
            .insert(movement.movement_id.clone());

        let experience_gained = (score.total_score * multiplier).round().max(1.0) as u64;
        let mut coins_gained = (score.total_score / 10.0 * multiplier).round() as u64;

        let mut next = progression.clone();
        next.experience += experience_gained;
        while next.experience >= level_threshold(next.level) {
            next.level += 1;
        }

        let mut newly_unlocked = Vec::new();
        for achievement in &self.achievements {
            if next.achievements.contains(&achievement.achievement_id) {
                continue;
            }
            if self.condition_met(&achievement.condition, &next, &next_stats) {
                next.achievements.insert(achievement.achievement_id.clone());
                coins_gained += achievement.coin_reward;
                newly_unlocked.push(achievement.achievement_id.clone());
                tracing::debug!(
                    achievement = %achievement.achievement_id,
                    reward = achievement.coin_reward,
                    "achievement unlocked"
                );
            }
        }

        next.coins += coins_gained;

        let new_level = (next.level != progression.level).then_some(next.level);
        let award = AwardSummary {
            experience_gained,
            coins_gained,
            newly_unlocked,
            new_level,
        };

        (next, next_stats, award)
    }

    fn condition_met(
        &self,
        condition: &AchievementCondition,
        progression: &UserProgression,
        stats: &LifetimeStats,
    ) -> bool {
        match condition {
            AchievementCondition::ArtworksCreated(n) => stats.artworks_created >= *n,
            AchievementCondition::MinScore(threshold) => stats.best_score >= *threshold,
            AchievementCondition::AllMovements => {
                self.movement_count > 0 && stats.movements_tried.len() >= self.movement_count
            }
            AchievementCondition::ReachLevel(level) => progression.level >= *level,
            AchievementCondition::LikesReceived(n) => stats.likes_received >= *n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementCatalog;
    use std::collections::BTreeMap;

    fn score_of(total: f64) -> ScoreResult {
        ScoreResult {
            total_score: total,
            breakdown: BTreeMap::new(),
            bonus: 0.0,
            feedback: Vec::new(),
        }
    }

    fn movement(id: &str) -> Movement {
        MovementCatalog::builtin().get(id).expect("exists").clone()
    }

    #[test]
    fn test_any_save_grants_at_least_one_xp() {
        let ledger = ProgressionLedger::with_builtin(5);
        let (_, _, award) = ledger.apply(
            &UserProgression::new(),
            &LifetimeStats::default(),
            &score_of(0.0),
            &movement("minimalism"),
        );
        assert_eq!(award.experience_gained, 1);
    }

    #[test]
    fn test_progression_is_monotone() {
        let ledger = ProgressionLedger::with_builtin(5);
        let mut progression = UserProgression::new();
        let mut stats = LifetimeStats::default();

        for total in [0.0, 42.5, 135.0, 88.0] {
            let before = progression.clone();
            let (next, next_stats, _) =
                ledger.apply(&progression, &stats, &score_of(total), &movement("pop_art"));

            assert!(next.level >= before.level);
            assert!(next.experience >= before.experience);
            assert!(next.coins >= before.coins);
            assert!(next.achievements.is_superset(&before.achievements));

            progression = next;
            stats = next_stats;
        }
    }

    #[test]
    fn test_single_save_can_cross_multiple_levels() {
        // Level 3 at 290 XP; a 125-point save in a Hard movement grants
        // 250 XP, crossing the 300, 400, and 500 thresholds at once
        let ledger = ProgressionLedger::with_builtin(5);
        let progression = UserProgression {
            level: 3,
            experience: 290,
            coins: 0,
            achievements: BTreeSet::new(),
        };

        let (next, _, award) = ledger.apply(
            &progression,
            &LifetimeStats::default(),
            &score_of(125.0),
            &movement("surrealism"),
        );

        assert_eq!(award.experience_gained, 250);
        assert_eq!(next.experience, 540);
        assert_eq!(next.level, 6);
        assert_eq!(award.new_level, Some(6));
    }

    #[test]
    fn test_new_level_none_when_unchanged() {
        let ledger = ProgressionLedger::with_builtin(5);
        let progression = UserProgression {
            level: 5,
            experience: 410,
            coins: 0,
            achievements: BTreeSet::new(),
        };

        let (_, _, award) = ledger.apply(
            &progression,
            &LifetimeStats::default(),
            &score_of(10.0),
            &movement("minimalism"),
        );
        assert_eq!(award.new_level, None);
    }

    #[test]
    fn test_first_save_unlocks_first_artwork() {
        let ledger = ProgressionLedger::with_builtin(5);
        let (next, _, award) = ledger.apply(
            &UserProgression::new(),
            &LifetimeStats::default(),
            &score_of(60.0),
            &movement("minimalism"),
        );

        assert!(award.newly_unlocked.contains(&"first-artwork".to_string()));
        assert!(next.achievements.contains("first-artwork"));
        // Reward coins arrive in the same transition
        assert!(award.coins_gained >= 50);
    }

    #[test]
    fn test_high_score_unlocks_multiple_achievements_at_once() {
        let ledger = ProgressionLedger::with_builtin(5);
        let (_, _, award) = ledger.apply(
            &UserProgression::new(),
            &LifetimeStats::default(),
            &score_of(120.0),
            &movement("minimalism"),
        );

        assert!(award.newly_unlocked.contains(&"first-artwork".to_string()));
        assert!(award.newly_unlocked.contains(&"perfect-score".to_string()));
    }

    #[test]
    fn test_achievements_never_relock() {
        let ledger = ProgressionLedger::with_builtin(5);
        let (first, stats, _) = ledger.apply(
            &UserProgression::new(),
            &LifetimeStats::default(),
            &score_of(110.0),
            &movement("minimalism"),
        );

        // A later low-scoring save must not remove perfect-score
        let (second, _, award) =
            ledger.apply(&first, &stats, &score_of(5.0), &movement("minimalism"));
        assert!(second.achievements.contains("perfect-score"));
        assert!(!award.newly_unlocked.contains(&"perfect-score".to_string()));
    }

    #[test]
    fn test_likes_unlock_on_next_save() {
        let ledger = ProgressionLedger::with_builtin(5);
        let stats = LifetimeStats {
            likes_received: 1,
            ..LifetimeStats::default()
        };

        let (_, _, award) = ledger.apply(
            &UserProgression::new(),
            &stats,
            &score_of(20.0),
            &movement("pop_art"),
        );
        assert!(award.newly_unlocked.contains(&"first-like".to_string()));
    }

    #[test]
    fn test_all_movements_achievement() {
        let catalog = MovementCatalog::builtin();
        let ledger = ProgressionLedger::with_builtin(catalog.len());
        let mut progression = UserProgression::new();
        let mut stats = LifetimeStats::default();
        let mut unlocked_at = None;

        for (i, m) in catalog.movements().enumerate() {
            let (next, next_stats, award) =
                ledger.apply(&progression, &stats, &score_of(50.0), m);
            if award.newly_unlocked.contains(&"all-movements".to_string()) {
                unlocked_at = Some(i);
            }
            progression = next;
            stats = next_stats;
        }

        // Only the save covering the final movement unlocks it
        assert_eq!(unlocked_at, Some(catalog.len() - 1));
    }

    #[test]
    fn test_movements_unlocked_derived_from_level() {
        let catalog = MovementCatalog::builtin();
        let ledger = ProgressionLedger::with_builtin(catalog.len());
        let mut progression = UserProgression::new();
        let mut stats = LifetimeStats::default();

        for _ in 0..12 {
            let expected: Vec<&str> = catalog
                .movements()
                .filter(|m| m.unlock_level <= progression.level)
                .map(|m| m.movement_id.as_str())
                .collect();
            let derived: Vec<&str> = progression
                .movements_unlocked(&catalog)
                .map(|m| m.movement_id.as_str())
                .collect();
            assert_eq!(derived, expected);

            let (next, next_stats, _) =
                ledger.apply(&progression, &stats, &score_of(100.0), &movement("pop_art"));
            progression = next;
            stats = next_stats;
        }
    }

    #[test]
    fn test_difficulty_multiplier_scales_rewards() {
        let ledger = ProgressionLedger::with_builtin(5);
        let base = UserProgression::new();
        let stats = LifetimeStats::default();

        let (_, _, easy) = ledger.apply(&base, &stats, &score_of(100.0), &movement("pop_art"));
        let (_, _, hard) = ledger.apply(&base, &stats, &score_of(100.0), &movement("surrealism"));

        assert_eq!(easy.experience_gained, 100);
        assert_eq!(hard.experience_gained, 200);
    }
}
