//! Canonical drawing representation and canvas-state normalization.
//!
//! [`normalize`] projects a mutable [`DrawingScene`] into an immutable
//! [`DrawingSnapshot`]: a serializable record of everything that affects the
//! visual appearance of the composition, with tool-internal state (selection,
//! locking, shape ids) stripped. The projection is deterministic and
//! side-effect free, so normalizing an unchanged scene twice yields
//! structurally equal snapshots.

use serde::{Deserialize, Serialize};

use crate::scene::{DrawingScene, PathPoint, SceneShape, ShapeForm};

/// The kind of a normalized canvas object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// An axis-aligned rectangle.
    Rectangle,
    /// An ellipse (circles normalize to this).
    Ellipse,
    /// A triangle.
    Triangle,
    /// A straight line segment.
    Line,
    /// A freehand brush path.
    FreehandPath,
}

/// A normalized canvas object.
///
/// Carries only appearance-affecting attributes. Geometry is a position plus
/// a bounding size; freehand paths additionally retain their points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasObject {
    /// Shape kind.
    pub kind: ShapeKind,
    /// Fill color as hex, if filled.
    pub fill: Option<String>,
    /// Stroke color as hex, if stroked.
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// X position (pixels from left).
    pub x: f64,
    /// Y position (pixels from top).
    pub y: f64,
    /// Bounding width in pixels (2x radius for circles).
    pub width: f64,
    /// Bounding height in pixels (2x radius for circles).
    pub height: f64,
    /// Horizontal scale factor (1 when the tool set none).
    pub scale_x: f64,
    /// Vertical scale factor (1 when the tool set none).
    pub scale_y: f64,
    /// Path points for freehand objects; empty otherwise.
    pub points: Vec<PathPoint>,
}

/// Canonical, immutable representation of a vector composition.
///
/// Object order equals scene z-order (insertion order). No current scoring
/// rule reads z-order, but it is preserved for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSnapshot {
    /// Normalized objects, bottom-most first.
    pub objects: Vec<CanvasObject>,
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Canvas background color as hex.
    pub background: String,
}

impl DrawingSnapshot {
    /// Number of objects in the snapshot.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Check if the snapshot has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Project a drawing scene into its canonical snapshot.
///
/// Tool-internal state is dropped; circles become ellipses with
/// `width == height == 2 * radius`; missing scale factors default to 1;
/// object order equals scene z-order.
#[must_use]
pub fn normalize(scene: &DrawingScene) -> DrawingSnapshot {
    DrawingSnapshot {
        objects: scene.shapes().map(normalize_shape).collect(),
        width: scene.width,
        height: scene.height,
        background: scene.background.clone(),
    }
}

fn normalize_shape(shape: &SceneShape) -> CanvasObject {
    let (kind, width, height, points) = match &shape.form {
        ShapeForm::Rect { width, height } => (ShapeKind::Rectangle, *width, *height, Vec::new()),
        ShapeForm::Circle { radius } => {
            (ShapeKind::Ellipse, radius * 2.0, radius * 2.0, Vec::new())
        }
        ShapeForm::Ellipse { radius_x, radius_y } => {
            (ShapeKind::Ellipse, radius_x * 2.0, radius_y * 2.0, Vec::new())
        }
        ShapeForm::Triangle { width, height } => (ShapeKind::Triangle, *width, *height, Vec::new()),
        ShapeForm::Line { dx, dy } => (ShapeKind::Line, dx.abs(), dy.abs(), Vec::new()),
        ShapeForm::Freehand { points } => {
            let (width, height) = path_bounds(points);
            (ShapeKind::FreehandPath, width, height, points.clone())
        }
    };

    CanvasObject {
        kind,
        fill: shape.fill.clone(),
        stroke: shape.stroke.clone(),
        stroke_width: shape.stroke_width,
        x: shape.x,
        y: shape.y,
        width,
        height,
        scale_x: shape.scale_x.unwrap_or(1.0),
        scale_y: shape.scale_y.unwrap_or(1.0),
        points,
    }
}

/// Bounding box size of a freehand path.
fn path_bounds(points: &[PathPoint]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x, max_y - min_y)
}
