//! Art movements: immutable reference data with machine-checkable rule
//! tables.
//!
//! A [`Movement`] pairs the player-facing description of an art style (era,
//! palette, rule text, tool whitelist) with its [`ScoringRule`] table, which
//! the scoring engine evaluates against a drawing snapshot. The built-in
//! catalog ships the five movements of the default deployment; a deployment
//! can replace it with JSON reference data at startup.

use serde::{Deserialize, Serialize};

use crate::snapshot::ShapeKind;
use crate::{GameError, GameResult};

/// Difficulty tier of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Forgiving rules, low reward multiplier.
    Easy,
    /// Moderate rules and rewards.
    Medium,
    /// Strict rules, highest reward multiplier.
    Hard,
}

impl Difficulty {
    /// Reward multiplier applied to experience and coin gains.
    #[must_use]
    pub fn reward_multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Medium => 1.5,
            Self::Hard => 2.0,
        }
    }
}

/// A machine-checkable metric over a drawing snapshot.
///
/// Each metric reduces the snapshot to a ratio in `[0, 1]`; the scoring
/// engine maps that ratio onto the category's point scale. Metrics that are
/// undefined for a given snapshot (for example balance over a single object)
/// yield no ratio and fall back to the engine's documented baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", content = "params", rename_all = "snake_case")]
pub enum RuleMetric {
    /// Fraction of object fill colors present in the movement palette.
    PaletteAdherence,

    /// Distinct colors used must stay at or under a cap.
    ColorLimit {
        /// Maximum number of distinct colors.
        max_colors: usize,
    },

    /// Distinct colors used should reach a floor.
    ColorRichness {
        /// Number of distinct colors for full credit.
        min_colors: usize,
    },

    /// Object count must stay at or under a cap.
    ElementBudget {
        /// Maximum number of objects.
        max_elements: usize,
    },

    /// Object count should reach a floor.
    ElementRichness {
        /// Number of objects for full credit.
        min_elements: usize,
    },

    /// Fraction of the canvas left uncovered should reach a floor.
    NegativeSpace {
        /// Uncovered fraction for full credit.
        min_fraction: f64,
    },

    /// Fraction of the canvas covered should reach a floor.
    Coverage {
        /// Covered fraction for full credit.
        min_fraction: f64,
    },

    /// Distinct shape kinds should reach a target.
    ShapeVariety {
        /// Number of distinct kinds for full credit.
        target_kinds: usize,
    },

    /// The largest same-kind group should reach a floor.
    Repetition {
        /// Repeat count for full credit.
        min_repeats: usize,
    },

    /// Objects drawn from a set of kinds should reach a floor.
    ShapeFamily {
        /// Kinds that count toward the metric.
        kinds: Vec<ShapeKind>,
        /// Matching-object count for full credit.
        min_count: usize,
    },

    /// The ratio between the largest and smallest effective scale areas
    /// should reach a floor. Undefined below two objects.
    ScaleContrast {
        /// Area ratio for full credit.
        min_ratio: f64,
    },

    /// How close the centroid of object centers sits to the canvas center.
    /// Undefined below two objects.
    SpatialBalance,
}

/// One scoring category of a movement: a metric plus its canned feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    /// Breakdown category name.
    pub category: String,
    /// The metric evaluated for this category.
    pub metric: RuleMetric,
    /// Feedback shown when the category scores poorly.
    pub shortfall: String,
    /// Feedback shown when the category scores near its maximum.
    pub praise: String,
}

impl ScoringRule {
    fn new(
        category: &str,
        metric: RuleMetric,
        shortfall: &str,
        praise: &str,
    ) -> Self {
        Self {
            category: category.to_string(),
            metric,
            shortfall: shortfall.to_string(),
            praise: praise.to_string(),
        }
    }
}

/// A named art movement with its rule set and unlock requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Stable identifier.
    pub movement_id: String,
    /// Display name.
    pub name: String,
    /// Era label, e.g. "1907-1920s".
    pub era: String,
    /// Player-facing description.
    pub description: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Level required before the movement can be selected.
    pub unlock_level: u32,
    /// Ordered palette of hex colors; never empty.
    pub color_palette: Vec<String>,
    /// Human-readable rule list shown beside the canvas.
    pub rules: Vec<String>,
    /// Tools usable in this movement.
    pub tools: Vec<String>,
    /// Machine-checkable scoring rule table.
    pub scoring: Vec<ScoringRule>,
}

/// The set of movements available to a deployment.
///
/// Loaded once per session; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementCatalog {
    movements: Vec<Movement>,
}

impl MovementCatalog {
    /// Create a catalog from an explicit movement list.
    #[must_use]
    pub fn new(movements: Vec<Movement>) -> Self {
        Self { movements }
    }

    /// Load a catalog from JSON reference data.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> GameResult<Self> {
        serde_json::from_str(json).map_err(GameError::Serialization)
    }

    /// Look up a movement by id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownMovement`] if the id is not in the catalog.
    pub fn get(&self, movement_id: &str) -> GameResult<&Movement> {
        self.movements
            .iter()
            .find(|m| m.movement_id == movement_id)
            .ok_or_else(|| GameError::UnknownMovement(movement_id.to_string()))
    }

    /// All movements in catalog order.
    pub fn movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.iter()
    }

    /// Number of movements in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// The built-in movement set of the default deployment.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn builtin() -> Self {
        Self::new(vec![
            Movement {
                movement_id: "minimalism".to_string(),
                name: "Minimalism".to_string(),
                era: "1960s-Present".to_string(),
                description: "Less is more. Create with maximum simplicity using minimal colors and geometric shapes.".to_string(),
                difficulty: Difficulty::Easy,
                unlock_level: 1,
                color_palette: hex_list(&["#FFFFFF", "#000000", "#808080", "#E0E0E0"]),
                rules: str_list(&[
                    "Use \u{2264}3 colors",
                    "Use \u{2264}5 elements",
                    "Maintain \u{2265}40% negative space",
                    "Use geometric shapes only",
                ]),
                tools: str_list(&["rectangle", "circle", "line", "fill"]),
                scoring: vec![
                    ScoringRule::new(
                        "colors",
                        RuleMetric::ColorLimit { max_colors: 3 },
                        "Too many colors. Try using 3 or fewer.",
                        "Great color restraint!",
                    ),
                    ScoringRule::new(
                        "elements",
                        RuleMetric::ElementBudget { max_elements: 5 },
                        "Too many elements. Keep it simple with 5 or fewer.",
                        "Perfect element count!",
                    ),
                    ScoringRule::new(
                        "negative_space",
                        RuleMetric::NegativeSpace { min_fraction: 0.4 },
                        "More negative space needed. Let the canvas breathe.",
                        "Excellent use of negative space!",
                    ),
                    ScoringRule::new(
                        "palette",
                        RuleMetric::PaletteAdherence,
                        "Stay within the movement palette.",
                        "Beautiful palette discipline!",
                    ),
                ],
            },
            Movement {
                movement_id: "pop_art".to_string(),
                name: "Pop Art".to_string(),
                era: "1950s-1970s".to_string(),
                description: "Bold, vibrant, and commercial. Embrace bright colors, repetition, and high contrast.".to_string(),
                difficulty: Difficulty::Easy,
                unlock_level: 1,
                color_palette: hex_list(&["#FF6347", "#FFD700", "#00CED1", "#FF1493", "#32CD32"]),
                rules: str_list(&[
                    "Use bold primary colors",
                    "Include repetition patterns",
                    "Create high contrast",
                    "Use outline effects",
                ]),
                tools: str_list(&["bold-brush", "halftone", "duplicate", "outline", "fill"]),
                scoring: vec![
                    ScoringRule::new(
                        "colors",
                        RuleMetric::ColorRichness { min_colors: 3 },
                        "Add more vibrant colors!",
                        "Great use of bold colors!",
                    ),
                    ScoringRule::new(
                        "repetition",
                        RuleMetric::Repetition { min_repeats: 3 },
                        "Try adding more repetition of elements.",
                        "Great repetition pattern!",
                    ),
                    ScoringRule::new(
                        "palette",
                        RuleMetric::PaletteAdherence,
                        "Lean into the movement's bold palette.",
                        "Electric palette choices!",
                    ),
                    ScoringRule::new(
                        "balance",
                        RuleMetric::SpatialBalance,
                        "Center your composition for more impact.",
                        "Striking visual balance!",
                    ),
                ],
            },
            Movement {
                movement_id: "impressionism".to_string(),
                name: "Impressionism".to_string(),
                era: "1860s-1880s".to_string(),
                description: "Capture light and movement. Use visible brushstrokes and vibrant colors to convey atmosphere.".to_string(),
                difficulty: Difficulty::Medium,
                unlock_level: 2,
                color_palette: hex_list(&["#87CEEB", "#98FB98", "#FFB6C1", "#DDA0DD", "#F0E68C"]),
                rules: str_list(&[
                    "Use visible brushstrokes",
                    "Focus on light effects",
                    "Use soft pastel colors",
                    "Capture movement",
                ]),
                tools: str_list(&["soft-brush", "stipple", "blend", "light-effect", "texture"]),
                scoring: vec![
                    ScoringRule::new(
                        "brushstrokes",
                        RuleMetric::ElementRichness { min_elements: 10 },
                        "Layer more strokes to capture light.",
                        "Wonderful brushwork effect!",
                    ),
                    ScoringRule::new(
                        "colors",
                        RuleMetric::ColorRichness { min_colors: 3 },
                        "Try adding more soft pastel colors.",
                        "Beautiful color palette!",
                    ),
                    ScoringRule::new(
                        "palette",
                        RuleMetric::PaletteAdherence,
                        "Reach for the movement's pastels.",
                        "Lovely pastel harmony!",
                    ),
                    ScoringRule::new(
                        "atmosphere",
                        RuleMetric::Coverage { min_fraction: 0.3 },
                        "Fill more of the canvas to build atmosphere.",
                        "Great atmospheric effect!",
                    ),
                ],
            },
            Movement {
                movement_id: "cubism".to_string(),
                name: "Cubism".to_string(),
                era: "1907-1920s".to_string(),
                description: "Fragment reality into geometric forms. Show multiple perspectives simultaneously.".to_string(),
                difficulty: Difficulty::Medium,
                unlock_level: 3,
                color_palette: hex_list(&["#8B4513", "#2F4F4F", "#DAA520", "#696969", "#A0522D"]),
                rules: str_list(&[
                    "Use geometric fragmentation",
                    "Show multiple angles",
                    "Use muted earth tones",
                    "Overlap shapes",
                ]),
                tools: str_list(&["polygon", "triangle", "fragment", "rotate", "overlap"]),
                scoring: vec![
                    ScoringRule::new(
                        "fragmentation",
                        RuleMetric::ShapeFamily {
                            kinds: vec![ShapeKind::Rectangle, ShapeKind::Triangle],
                            min_count: 5,
                        },
                        "Add more geometric shapes for fragmentation.",
                        "Excellent geometric fragmentation!",
                    ),
                    ScoringRule::new(
                        "layering",
                        RuleMetric::ElementRichness { min_elements: 4 },
                        "Try overlapping more shapes.",
                        "Good layering of elements!",
                    ),
                    ScoringRule::new(
                        "palette",
                        RuleMetric::PaletteAdherence,
                        "Use muted earth tones.",
                        "Nice use of earth tones!",
                    ),
                    ScoringRule::new(
                        "variety",
                        RuleMetric::ShapeVariety { target_kinds: 3 },
                        "Show the subject from more angles.",
                        "Strong multi-angle composition!",
                    ),
                ],
            },
            Movement {
                movement_id: "surrealism".to_string(),
                name: "Surrealism".to_string(),
                era: "1920s-1950s".to_string(),
                description: "Unlock your subconscious. Create dreamlike, unexpected combinations that defy logic.".to_string(),
                difficulty: Difficulty::Hard,
                unlock_level: 5,
                color_palette: hex_list(&["#9370DB", "#20B2AA", "#FF69B4", "#4169E1", "#FFD700"]),
                rules: str_list(&[
                    "Create unexpected juxtapositions",
                    "Use dreamlike imagery",
                    "Distort proportions",
                    "Include symbolic elements",
                ]),
                tools: str_list(&["freehand", "warp", "blend", "mirror", "gradient"]),
                scoring: vec![
                    ScoringRule::new(
                        "creativity",
                        RuleMetric::ShapeVariety { target_kinds: 3 },
                        "Try using different element types.",
                        "Great variety of elements!",
                    ),
                    ScoringRule::new(
                        "juxtaposition",
                        RuleMetric::ScaleContrast { min_ratio: 2.0 },
                        "Try varying sizes more dramatically.",
                        "Surreal scale distortions!",
                    ),
                    ScoringRule::new(
                        "dreamlike_colors",
                        RuleMetric::ColorRichness { min_colors: 4 },
                        "Add more dreamlike colors.",
                        "Hypnotic color choices!",
                    ),
                    ScoringRule::new(
                        "palette",
                        RuleMetric::PaletteAdherence,
                        "Draw from the dream palette.",
                        "Visions in perfect hues!",
                    ),
                ],
            },
        ])
    }
}

impl Default for MovementCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn hex_list(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|c| (*c).to_string()).collect()
}

fn str_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
