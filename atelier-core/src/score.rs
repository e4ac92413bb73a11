//! Movement-conformance scoring.
//!
//! [`score`] is a pure function from a [`DrawingSnapshot`] and a [`Movement`]
//! to a [`ScoreResult`]. Every scoring rule of the movement maps to one
//! breakdown category worth up to [`CATEGORY_MAX`] points; a flat bonus is
//! added when every category clears a high bar simultaneously. The same
//! function backs both the advisory (live) and authoritative (save-time)
//! paths.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::movement::{Movement, RuleMetric, ScoringRule};
use crate::snapshot::{DrawingSnapshot, ShapeKind};

/// Maximum points per scoring category.
pub const CATEGORY_MAX: f64 = 30.0;

/// Maximum total score.
pub const TOTAL_MAX: f64 = 150.0;

/// Flat bonus for satisfying every rule at once.
const ALL_RULES_BONUS: f64 = 15.0;

/// Fraction of [`CATEGORY_MAX`] every category must reach for the bonus.
const BONUS_THRESHOLD: f64 = 0.8;

/// Categories below this fraction of max get their shortfall feedback.
const SHORTFALL_THRESHOLD: f64 = 0.5;

/// Categories at or above this fraction of max get their praise feedback.
const PRAISE_THRESHOLD: f64 = 0.85;

/// Score ratio used when a metric is undefined for the snapshot.
const BASELINE_RATIO: f64 = 0.5;

/// Feedback for a snapshot with nothing drawn.
pub const EMPTY_CANVAS_FEEDBACK: &str = "Add some elements to get scored";

/// Smallest effective scale area considered when comparing object scales.
const MIN_SCALE_AREA: f64 = 0.1;

/// The result of scoring a snapshot against a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Total score in `[0, 150]`.
    pub total_score: f64,
    /// Per-category subscores, each in `[0, 30]`.
    pub breakdown: BTreeMap<String, f64>,
    /// All-rules bonus, additive beyond the breakdown sum.
    pub bonus: f64,
    /// Feedback messages, worst-scoring category first.
    pub feedback: Vec<String>,
}

/// Score a snapshot against a movement's rule table.
///
/// Pure and deterministic: no I/O, no clocks, no randomness. An empty
/// snapshot scores zero in every category. A metric that is undefined for
/// the snapshot (e.g. balance over a single object) scores the baseline of
/// 50% of the category maximum rather than failing.
#[must_use]
pub fn score(snapshot: &DrawingSnapshot, movement: &Movement) -> ScoreResult {
    if snapshot.is_empty() {
        let breakdown = movement
            .scoring
            .iter()
            .map(|rule| (rule.category.clone(), 0.0))
            .collect();
        return ScoreResult {
            total_score: 0.0,
            breakdown,
            bonus: 0.0,
            feedback: vec![EMPTY_CANVAS_FEEDBACK.to_string()],
        };
    }

    let features = Features::extract(snapshot);

    let mut breakdown = BTreeMap::new();
    let mut scored_rules: Vec<(&ScoringRule, f64)> = Vec::with_capacity(movement.scoring.len());
    for rule in &movement.scoring {
        let ratio = metric_ratio(&rule.metric, &features, movement)
            .unwrap_or(BASELINE_RATIO)
            .clamp(0.0, 1.0);
        let points = round1(ratio * CATEGORY_MAX);
        breakdown.insert(rule.category.clone(), points);
        scored_rules.push((rule, points));
    }

    let all_high = !scored_rules.is_empty()
        && scored_rules
            .iter()
            .all(|(_, points)| *points >= BONUS_THRESHOLD * CATEGORY_MAX);
    let bonus = if all_high { ALL_RULES_BONUS } else { 0.0 };

    let feedback = collect_feedback(&scored_rules);

    let sum: f64 = breakdown.values().sum();
    let total_score = round1((sum + bonus).clamp(0.0, TOTAL_MAX));

    tracing::debug!(
        movement = %movement.movement_id,
        total = total_score,
        bonus,
        "scored snapshot"
    );

    ScoreResult {
        total_score,
        breakdown,
        bonus,
        feedback,
    }
}

/// At most one message per category, ordered by ascending score so the
/// weakest areas surface first. Ties keep rule-table order.
fn collect_feedback(scored_rules: &[(&ScoringRule, f64)]) -> Vec<String> {
    let mut messages: Vec<(f64, &str)> = Vec::new();
    for (rule, points) in scored_rules {
        if *points < SHORTFALL_THRESHOLD * CATEGORY_MAX {
            messages.push((*points, rule.shortfall.as_str()));
        } else if *points >= PRAISE_THRESHOLD * CATEGORY_MAX {
            messages.push((*points, rule.praise.as_str()));
        }
    }
    messages.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    messages.into_iter().map(|(_, m)| m.to_string()).collect()
}

/// Snapshot measurements shared by all metrics.
struct Features {
    object_count: usize,
    /// Distinct fill + stroke colors, uppercased.
    distinct_colors: HashSet<String>,
    /// Fill color per filled object, uppercased.
    fill_colors: Vec<String>,
    /// Fraction of the canvas covered by object bounding boxes.
    covered_fraction: f64,
    /// Object count per shape kind.
    kind_counts: HashMap<ShapeKind, usize>,
    /// Effective scale area per object.
    scale_areas: Vec<f64>,
    /// Centroid of object centers, if the canvas has usable area.
    centroid: Option<(f64, f64)>,
    canvas_width: f64,
    canvas_height: f64,
}

impl Features {
    #[allow(clippy::cast_precision_loss)]
    fn extract(snapshot: &DrawingSnapshot) -> Self {
        let mut distinct_colors = HashSet::new();
        let mut fill_colors = Vec::new();
        let mut kind_counts: HashMap<ShapeKind, usize> = HashMap::new();
        let mut scale_areas = Vec::new();
        let mut covered_area = 0.0;
        let (mut cx_sum, mut cy_sum) = (0.0, 0.0);

        for obj in &snapshot.objects {
            if let Some(fill) = &obj.fill {
                let fill = fill.to_uppercase();
                distinct_colors.insert(fill.clone());
                fill_colors.push(fill);
            }
            if let Some(stroke) = &obj.stroke {
                distinct_colors.insert(stroke.to_uppercase());
            }
            *kind_counts.entry(obj.kind).or_insert(0) += 1;

            let w = obj.width * obj.scale_x;
            let h = obj.height * obj.scale_y;
            covered_area += w * h;
            scale_areas.push((obj.scale_x * obj.scale_y).max(MIN_SCALE_AREA));
            cx_sum += obj.x + w / 2.0;
            cy_sum += obj.y + h / 2.0;
        }

        let canvas_area = snapshot.width * snapshot.height;
        let covered_fraction = if canvas_area > 0.0 {
            (covered_area / canvas_area).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let count = snapshot.objects.len();
        let centroid = if count > 0 && canvas_area > 0.0 {
            Some((cx_sum / count as f64, cy_sum / count as f64))
        } else {
            None
        };

        Self {
            object_count: count,
            distinct_colors,
            fill_colors,
            covered_fraction,
            kind_counts,
            scale_areas,
            centroid,
            canvas_width: snapshot.width,
            canvas_height: snapshot.height,
        }
    }
}

/// Reduce one metric to a ratio in `[0, 1]`, or `None` when the metric is
/// undefined for this snapshot.
#[allow(clippy::cast_precision_loss)]
fn metric_ratio(metric: &RuleMetric, features: &Features, movement: &Movement) -> Option<f64> {
    let count = features.object_count as f64;
    match metric {
        RuleMetric::PaletteAdherence => {
            if features.fill_colors.is_empty() {
                return None;
            }
            let palette: HashSet<String> = movement
                .color_palette
                .iter()
                .map(|c| c.to_uppercase())
                .collect();
            let matching = features
                .fill_colors
                .iter()
                .filter(|c| palette.contains(*c))
                .count();
            Some(matching as f64 / features.fill_colors.len() as f64)
        }
        RuleMetric::ColorLimit { max_colors } => {
            let used = features.distinct_colors.len();
            if used <= *max_colors {
                Some(1.0)
            } else {
                Some(*max_colors as f64 / used as f64)
            }
        }
        RuleMetric::ColorRichness { min_colors } => {
            Some((features.distinct_colors.len() as f64 / *min_colors as f64).min(1.0))
        }
        RuleMetric::ElementBudget { max_elements } => {
            if features.object_count <= *max_elements {
                Some(1.0)
            } else {
                Some(*max_elements as f64 / count)
            }
        }
        RuleMetric::ElementRichness { min_elements } => {
            Some((count / *min_elements as f64).min(1.0))
        }
        RuleMetric::NegativeSpace { min_fraction } => {
            let negative = 1.0 - features.covered_fraction;
            Some((negative / min_fraction).min(1.0))
        }
        RuleMetric::Coverage { min_fraction } => {
            Some((features.covered_fraction / min_fraction).min(1.0))
        }
        RuleMetric::ShapeVariety { target_kinds } => {
            Some((features.kind_counts.len() as f64 / *target_kinds as f64).min(1.0))
        }
        RuleMetric::Repetition { min_repeats } => {
            let largest = features.kind_counts.values().copied().max().unwrap_or(0);
            Some((largest as f64 / *min_repeats as f64).min(1.0))
        }
        RuleMetric::ShapeFamily { kinds, min_count } => {
            let matching: usize = kinds
                .iter()
                .map(|k| features.kind_counts.get(k).copied().unwrap_or(0))
                .sum();
            Some((matching as f64 / *min_count as f64).min(1.0))
        }
        RuleMetric::ScaleContrast { min_ratio } => {
            if features.object_count < 2 {
                return None;
            }
            let max = features
                .scale_areas
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let min = features
                .scale_areas
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min);
            Some((max / min / min_ratio).min(1.0))
        }
        RuleMetric::SpatialBalance => {
            if features.object_count < 2 {
                return None;
            }
            let (cx, cy) = features.centroid?;
            let dx = cx - features.canvas_width / 2.0;
            let dy = cy - features.canvas_height / 2.0;
            let half_diagonal =
                (features.canvas_width.powi(2) + features.canvas_height.powi(2)).sqrt() / 2.0;
            if half_diagonal <= 0.0 {
                return None;
            }
            Some(1.0 - ((dx * dx + dy * dy).sqrt() / half_diagonal))
        }
    }
}

/// Round to one decimal place, matching the wire format of score values.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementCatalog;
    use crate::scene::{DrawingScene, SceneShape, ShapeForm};
    use crate::snapshot::normalize;
    use proptest::prelude::*;

    fn minimalism() -> Movement {
        MovementCatalog::builtin()
            .get("minimalism")
            .expect("exists")
            .clone()
    }

    fn assert_total_invariant(result: &ScoreResult) {
        let sum: f64 = result.breakdown.values().sum();
        let expected = ((sum + result.bonus).clamp(0.0, TOTAL_MAX) * 10.0).round() / 10.0;
        assert!(
            (result.total_score - expected).abs() < 1e-9,
            "total {} != clamp(sum {} + bonus {})",
            result.total_score,
            sum,
            result.bonus
        );
    }

    #[test]
    fn test_empty_snapshot_scores_zero() {
        let snapshot = normalize(&DrawingScene::default());
        for movement in MovementCatalog::builtin().movements() {
            let result = score(&snapshot, movement);
            assert!((result.total_score - 0.0).abs() < f64::EPSILON);
            assert!(result.breakdown.values().all(|v| v.abs() < f64::EPSILON));
            assert_eq!(result.feedback, vec![EMPTY_CANVAS_FEEDBACK.to_string()]);
            assert_total_invariant(&result);
        }
    }

    #[test]
    fn test_palette_conformant_rectangle_scores_high() {
        // One rectangle in a palette color, well within the element budget
        let mut scene = DrawingScene::default();
        scene.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 60.0,
            })
            .at(350.0, 270.0)
            .with_fill("#FFFFFF"),
        );

        let result = score(&normalize(&scene), &minimalism());
        let palette = result.breakdown.get("palette").expect("palette category");
        assert!(
            *palette >= PRAISE_THRESHOLD * CATEGORY_MAX,
            "palette category should be near max, got {palette}"
        );
        assert!(result.total_score > 0.0);
        assert_total_invariant(&result);
    }

    #[test]
    fn test_all_rules_satisfied_awards_bonus() {
        let mut scene = DrawingScene::default();
        scene.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 60.0,
            })
            .with_fill("#FFFFFF"),
        );

        let result = score(&normalize(&scene), &minimalism());
        assert!((result.bonus - ALL_RULES_BONUS).abs() < f64::EPSILON);
        assert_total_invariant(&result);
    }

    #[test]
    fn test_palette_violation_surfaces_first() {
        // 20 objects, 15 distinct off-palette colors: palette scores 0 and
        // its shortfall message leads the feedback
        let mut scene = DrawingScene::default();
        for i in 0..20 {
            let color = format!("#0{:02}F{:02}", i % 15, (i % 15) * 3);
            scene.add_shape(
                SceneShape::new(ShapeForm::Rect {
                    width: 40.0,
                    height: 40.0,
                })
                .at(f64::from(i) * 30.0, f64::from(i) * 20.0)
                .with_fill(color),
            );
        }

        let movement = minimalism();
        let result = score(&normalize(&scene), &movement);
        assert!((result.breakdown["palette"] - 0.0).abs() < f64::EPSILON);
        assert_eq!(
            result.feedback.first().map(String::as_str),
            Some("Stay within the movement palette.")
        );
        assert_total_invariant(&result);
    }

    #[test]
    fn test_undefined_balance_scores_baseline() {
        // SpatialBalance is undefined for a single object
        let mut scene = DrawingScene::default();
        scene.add_shape(
            SceneShape::new(ShapeForm::Circle { radius: 30.0 }).with_fill("#FF6347"),
        );

        let pop_art = MovementCatalog::builtin()
            .get("pop_art")
            .expect("exists")
            .clone();
        let result = score(&normalize(&scene), &pop_art);
        assert!(
            (result.breakdown["balance"] - BASELINE_RATIO * CATEGORY_MAX).abs() < f64::EPSILON
        );
        assert_total_invariant(&result);
    }

    #[test]
    fn test_scale_contrast_rewards_distortion() {
        let surrealism = MovementCatalog::builtin()
            .get("surrealism")
            .expect("exists")
            .clone();

        let mut flat = DrawingScene::default();
        for _ in 0..3 {
            flat.add_shape(SceneShape::new(ShapeForm::Circle { radius: 20.0 }).with_fill("#9370DB"));
        }

        let mut distorted = flat.clone();
        distorted.add_shape(
            SceneShape::new(ShapeForm::Circle { radius: 20.0 })
                .with_fill("#9370DB")
                .with_scale(3.0, 3.0),
        );

        let flat_score = score(&normalize(&flat), &surrealism);
        let distorted_score = score(&normalize(&distorted), &surrealism);
        assert!(
            distorted_score.breakdown["juxtaposition"] > flat_score.breakdown["juxtaposition"]
        );
    }

    #[test]
    fn test_centered_composition_beats_cornered() {
        let pop_art = MovementCatalog::builtin()
            .get("pop_art")
            .expect("exists")
            .clone();

        let mut centered = DrawingScene::default();
        centered.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 100.0,
            })
            .at(300.0, 250.0)
            .with_fill("#FF6347"),
        );
        centered.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 100.0,
            })
            .at(400.0, 250.0)
            .with_fill("#FFD700"),
        );

        let mut cornered = DrawingScene::default();
        cornered.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 100.0,
            })
            .with_fill("#FF6347"),
        );
        cornered.add_shape(
            SceneShape::new(ShapeForm::Rect {
                width: 100.0,
                height: 100.0,
            })
            .at(50.0, 0.0)
            .with_fill("#FFD700"),
        );

        let centered_score = score(&normalize(&centered), &pop_art);
        let cornered_score = score(&normalize(&cornered), &pop_art);
        assert!(centered_score.breakdown["balance"] > cornered_score.breakdown["balance"]);
    }

    #[test]
    fn test_feedback_at_most_one_message_per_category() {
        let mut scene = DrawingScene::default();
        for i in 0..8 {
            scene.add_shape(
                SceneShape::new(ShapeForm::Circle { radius: 15.0 })
                    .at(f64::from(i) * 90.0, 300.0)
                    .with_fill("#123456"),
            );
        }

        for movement in MovementCatalog::builtin().movements() {
            let result = score(&normalize(&scene), movement);
            assert!(result.feedback.len() <= movement.scoring.len());
        }
    }

    proptest! {
        #[test]
        fn prop_score_bounds_hold(
            shapes in prop::collection::vec(
                (0usize..5, 0.0f64..800.0, 0.0f64..600.0, 5.0f64..120.0, 0usize..8),
                0..30,
            )
        ) {
            let palette = ["#FFFFFF", "#000000", "#FF6347", "#123456", "#ABCDEF", "#0000FF", "#00FF00", "#FA8072"];
            let mut scene = DrawingScene::default();
            for (kind, x, y, size, color) in shapes {
                let form = match kind {
                    0 => ShapeForm::Rect { width: size, height: size * 0.75 },
                    1 => ShapeForm::Circle { radius: size / 2.0 },
                    2 => ShapeForm::Triangle { width: size, height: size },
                    3 => ShapeForm::Line { dx: size, dy: size / 3.0 },
                    _ => ShapeForm::Freehand {
                        points: vec![
                            crate::scene::PathPoint { x: 0.0, y: 0.0 },
                            crate::scene::PathPoint { x: size, y: size / 2.0 },
                        ],
                    },
                };
                scene.add_shape(
                    SceneShape::new(form).at(x, y).with_fill(palette[color]),
                );
            }

            let snapshot = normalize(&scene);
            for movement in MovementCatalog::builtin().movements() {
                let result = score(&snapshot, movement);
                prop_assert!(result.total_score >= 0.0);
                prop_assert!(result.total_score <= TOTAL_MAX);
                prop_assert!(result.bonus >= 0.0);
                for value in result.breakdown.values() {
                    prop_assert!(*value >= 0.0 && *value <= CATEGORY_MAX);
                }
                let sum: f64 = result.breakdown.values().sum();
                let expected = ((sum + result.bonus).clamp(0.0, TOTAL_MAX) * 10.0).round() / 10.0;
                prop_assert!((result.total_score - expected).abs() < 1e-9);
            }
        }
    }
}
