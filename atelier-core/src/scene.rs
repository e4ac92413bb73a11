//! The mutable drawing scene graph held by the drawing surface.
//!
//! A [`DrawingScene`] is what the editing tools mutate directly: shapes carry
//! tool state (selection, locking) alongside their visual attributes. The
//! canonical, tool-free representation is produced by
//! [`crate::snapshot::normalize`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GameError, GameResult};

/// Unique identifier for a shape in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(Uuid);

impl ShapeId {
    /// Create a new unique shape ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point on a freehand path, in canvas coordinates relative to the shape
/// origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// X offset from the shape origin.
    pub x: f64,
    /// Y offset from the shape origin.
    pub y: f64,
}

/// The geometric form of a shape as the drawing tools describe it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", content = "data", rename_all = "snake_case")]
pub enum ShapeForm {
    /// An axis-aligned rectangle.
    Rect {
        /// Width in pixels.
        width: f64,
        /// Height in pixels.
        height: f64,
    },

    /// A circle described only by its radius.
    Circle {
        /// Radius in pixels.
        radius: f64,
    },

    /// An ellipse with independent radii.
    Ellipse {
        /// Horizontal radius in pixels.
        radius_x: f64,
        /// Vertical radius in pixels.
        radius_y: f64,
    },

    /// An isoceles triangle fitted to a bounding box.
    Triangle {
        /// Width in pixels.
        width: f64,
        /// Height in pixels.
        height: f64,
    },

    /// A straight line segment from the shape origin.
    Line {
        /// Horizontal extent in pixels.
        dx: f64,
        /// Vertical extent in pixels.
        dy: f64,
    },

    /// A freehand brush path.
    Freehand {
        /// Path points relative to the shape origin, in draw order.
        points: Vec<PathPoint>,
    },
}

/// A shape in the drawing scene, including tool-internal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneShape {
    /// Unique identifier.
    pub id: ShapeId,
    /// Geometric form.
    pub form: ShapeForm,
    /// X position (pixels from left).
    pub x: f64,
    /// Y position (pixels from top).
    pub y: f64,
    /// Fill color as hex, if filled.
    pub fill: Option<String>,
    /// Stroke color as hex, if stroked.
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Horizontal scale factor applied by the transform tool, if any.
    pub scale_x: Option<f64>,
    /// Vertical scale factor applied by the transform tool, if any.
    pub scale_y: Option<f64>,
    /// Whether this shape is currently selected in the editor.
    pub selected: bool,
    /// Whether this shape is locked against editing.
    pub locked: bool,
}

impl SceneShape {
    /// Create a new shape with the given form at the origin.
    #[must_use]
    pub fn new(form: ShapeForm) -> Self {
        Self {
            id: ShapeId::new(),
            form,
            x: 0.0,
            y: 0.0,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            scale_x: None,
            scale_y: None,
            selected: false,
            locked: false,
        }
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    /// Set the stroke color and width.
    #[must_use]
    pub fn with_stroke(mut self, stroke: impl Into<String>, width: f64) -> Self {
        self.stroke = Some(stroke.into());
        self.stroke_width = width;
        self
    }

    /// Set the scale factors.
    #[must_use]
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = Some(scale_x);
        self.scale_y = Some(scale_y);
        self
    }
}

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

/// Default canvas background color.
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";

/// A drawing scene containing all shapes in z-order.
///
/// Shape order is insertion order, which is also z-order: later shapes draw
/// on top of earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingScene {
    /// All shapes, bottom-most first.
    shapes: Vec<SceneShape>,
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Canvas background color as hex.
    pub background: String,
}

impl DrawingScene {
    /// Create a new empty scene with the given canvas size.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            shapes: Vec::new(),
            width,
            height,
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }

    /// Add a shape to the top of the scene.
    pub fn add_shape(&mut self, shape: SceneShape) -> ShapeId {
        let id = shape.id;
        self.shapes.push(shape);
        id
    }

    /// Remove a shape from the scene.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeNotFound`] if the shape is not in the scene.
    pub fn remove_shape(&mut self, id: ShapeId) -> GameResult<SceneShape> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| GameError::ShapeNotFound(id.to_string()))?;
        Ok(self.shapes.remove(index))
    }

    /// Get a shape by ID.
    #[must_use]
    pub fn get_shape(&self, id: ShapeId) -> Option<&SceneShape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Get a mutable reference to a shape by ID.
    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut SceneShape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// All shapes in z-order, bottom-most first.
    pub fn shapes(&self) -> impl Iterator<Item = &SceneShape> {
        self.shapes.iter()
    }

    /// Move a shape to the top of the z-order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeNotFound`] if the shape is not in the scene.
    pub fn bring_to_front(&mut self, id: ShapeId) -> GameResult<()> {
        let shape = self.remove_shape(id)?;
        self.shapes.push(shape);
        Ok(())
    }

    /// Select a shape, deselecting nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ShapeNotFound`] if the shape is not in the scene.
    pub fn select(&mut self, id: ShapeId) -> GameResult<()> {
        let shape = self
            .get_shape_mut(id)
            .ok_or_else(|| GameError::ShapeNotFound(id.to_string()))?;
        shape.selected = true;
        Ok(())
    }

    /// Deselect all shapes.
    pub fn deselect_all(&mut self) {
        for shape in &mut self.shapes {
            shape.selected = false;
        }
    }

    /// Number of shapes in the scene.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Check if the scene has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Remove all shapes and restore the default background.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.background = DEFAULT_BACKGROUND.to_string();
    }

    /// Serialize the scene to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> GameResult<String> {
        serde_json::to_string(self).map_err(GameError::Serialization)
    }

    /// Deserialize a scene from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> GameResult<Self> {
        serde_json::from_str(json).map_err(GameError::Serialization)
    }
}

impl Default for DrawingScene {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}
