// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation shape data structures.
//!
//! A [`Shape`] stores its geometry in the pixel space of the viewport it was
//! last committed against (its *reference* size). Rendering at any other
//! size goes through [`crate::util::geometry::normalize`]; stored geometry is
//! only rewritten by [`Shape::rebase`] when a drag or transform commits.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::EngineError;
use crate::util::geometry::{self, Bounds, RenderGeometry};

/// Length of the time window given to freshly drawn shapes, in seconds.
pub const DEFAULT_WINDOW_SECS: f64 = 0.5;
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_OPACITY: f64 = 1.0;
pub const DEFAULT_COLOR: &str = "red";

/// Opaque, unique shape identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Generate a fresh identifier. Identifiers are never reused.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 2D point in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pixel size of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(500.0, 300.0)
    }
}

/// Kind of annotation. Fixed for the lifetime of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[serde(rename = "rectangle")]
    Rectangle,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "line", alias = "polyline")]
    Polyline,
}

impl ShapeKind {
    /// Name used in the interchange format.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Polyline => "line",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific geometry, relative to the shape origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rectangle { width: f64, height: f64 },
    /// The origin is the centre.
    Circle { radius: f64 },
    /// Flat `[dx0, dy0, dx1, dy1, ..]` offsets from the origin.
    Polyline { points: Vec<f64>, tension: Option<f64> },
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Polyline { .. } => ShapeKind::Polyline,
        }
    }

    /// Minimal geometry a shape starts with when a draw session begins.
    pub fn default_for(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Geometry::Rectangle {
                width: 4.0,
                height: 4.0,
            },
            ShapeKind::Circle => Geometry::Circle { radius: 20.0 },
            ShapeKind::Polyline => Geometry::Polyline {
                points: vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0],
                tension: None,
            },
        }
    }

    /// Geometry spanned by a pointer drag of `(dx, dy)` from the origin.
    pub fn from_drag(kind: ShapeKind, dx: f64, dy: f64) -> Self {
        match kind {
            ShapeKind::Rectangle => Geometry::Rectangle {
                width: dx,
                height: dy,
            },
            ShapeKind::Circle => Geometry::Circle {
                radius: dx.hypot(dy),
            },
            ShapeKind::Polyline => Geometry::Polyline {
                points: vec![0.0, 0.0, dx, dy],
                tension: None,
            },
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidGeometry {
            kind: self.kind().as_str(),
            reason: reason.to_string(),
        };
        match self {
            Geometry::Rectangle { width, height } => {
                if !width.is_finite() || !height.is_finite() {
                    return Err(invalid("width and height must be finite"));
                }
            }
            Geometry::Circle { radius } => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(invalid("radius must be finite and non-negative"));
                }
            }
            Geometry::Polyline { points, .. } => {
                if points.len() % 2 != 0 {
                    return Err(invalid("points must come in (x, y) pairs"));
                }
                if points.iter().any(|p| !p.is_finite()) {
                    return Err(invalid("points must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// Playback interval `[start, end]` during which a shape is shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, EngineError> {
        if !(start < end) {
            return Err(EngineError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of the default length beginning at `start`.
    pub fn starting_at(start: f64) -> Self {
        Self {
            start,
            end: start + DEFAULT_WINDOW_SECS,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }
}

/// One annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    id: ShapeId,
    pub color: String,
    pub label: String,
    /// Host payload. Never interpreted by the engine.
    pub data: Map<String, Value>,
    origin: Point,
    geometry: Geometry,
    pub stroke_width: f64,
    pub opacity: f64,
    /// Legacy per-axis scale, kept for interchange compatibility.
    pub scale: (f64, f64),
    reference: ViewportSize,
    pub time_window: TimeWindow,
}

impl Shape {
    /// Create a shape with default styling.
    pub fn new(
        id: ShapeId,
        origin: Point,
        geometry: Geometry,
        reference: ViewportSize,
        time_window: TimeWindow,
    ) -> Result<Self, EngineError> {
        geometry.validate()?;
        Ok(Self {
            id,
            color: DEFAULT_COLOR.to_string(),
            label: String::new(),
            data: Map::new(),
            origin,
            geometry,
            stroke_width: DEFAULT_STROKE_WIDTH,
            opacity: DEFAULT_OPACITY,
            scale: (1.0, 1.0),
            reference,
            time_window,
        })
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_style(mut self, stroke_width: f64, opacity: f64) -> Self {
        self.stroke_width = stroke_width;
        self.opacity = opacity;
        self
    }

    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Viewport size the stored geometry is expressed in.
    pub fn reference(&self) -> ViewportSize {
        self.reference
    }

    /// Geometry in the pixel space of `viewport`.
    pub fn rendered(&self, viewport: ViewportSize) -> RenderGeometry {
        geometry::normalize(self, viewport)
    }

    /// Rendered extents relative to the rendered origin.
    pub fn local_bounds(&self, viewport: ViewportSize) -> Bounds {
        self.rendered(viewport).local_bounds()
    }

    /// Replace the geometry while drawing. A geometry of a different kind is
    /// rejected and the shape left untouched.
    pub(crate) fn reshape(&mut self, geometry: Geometry) -> bool {
        if geometry.kind() != self.kind() {
            log::warn!(
                "Refusing to reshape {} {} into a {}",
                self.kind(),
                self.id,
                geometry.kind()
            );
            return false;
        }
        self.geometry = geometry;
        true
    }

    /// Bake the geometry rendered at `viewport` into the stored fields and
    /// adopt `viewport` as the new reference size.
    pub fn rebase(&mut self, viewport: ViewportSize) {
        let (origin, geometry) = match self.rendered(viewport) {
            RenderGeometry::Rectangle {
                x,
                y,
                width,
                height,
            } => (Point::new(x, y), Geometry::Rectangle { width, height }),
            RenderGeometry::Circle { x, y, radius } => {
                (Point::new(x, y), Geometry::Circle { radius })
            }
            RenderGeometry::Polyline { x, y, points, .. } => {
                let tension = match &self.geometry {
                    Geometry::Polyline { tension, .. } => *tension,
                    _ => None,
                };
                (Point::new(x, y), Geometry::Polyline { points, tension })
            }
        };
        self.origin = origin;
        self.geometry = geometry;
        self.reference = viewport;
    }

    /// Commit a drag: the shape is rebased and its origin moved to `origin`,
    /// which is given in `viewport` pixels.
    pub fn move_to(&mut self, origin: Point, viewport: ViewportSize) {
        self.rebase(viewport);
        self.origin = origin;
    }

    /// Commit a resize: the shape is rebased, the scale folded into its
    /// geometry and its origin moved to `origin`.
    pub fn fold_scale(&mut self, scale_x: f64, scale_y: f64, origin: Point, viewport: ViewportSize) {
        self.rebase(viewport);
        self.origin = origin;
        match &mut self.geometry {
            Geometry::Rectangle { width, height } => {
                *width *= scale_x;
                *height *= scale_y;
            }
            // Circles stay circles: only the horizontal factor applies.
            Geometry::Circle { radius } => *radius *= scale_x,
            Geometry::Polyline { points, .. } => {
                for (i, p) in points.iter_mut().enumerate() {
                    *p *= if i % 2 == 0 { scale_x } else { scale_y };
                }
            }
        }
    }

    /// Hit test at `viewport` scale with a pick `tolerance` in pixels.
    pub fn contains(&self, point: Point, viewport: ViewportSize, tolerance: f64) -> bool {
        let tolerance = tolerance.max(self.stroke_width / 2.0);
        self.rendered(viewport).contains(point, tolerance)
    }

    pub fn is_visible_at(&self, t: f64) -> bool {
        self.time_window.contains(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64, reference: ViewportSize) -> Shape {
        Shape::new(
            ShapeId::from("r"),
            Point::new(x, y),
            Geometry::Rectangle { width: w, height: h },
            reference,
            TimeWindow::starting_at(0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_time_window_rejects_inverted_bounds() {
        assert!(TimeWindow::new(1.0, 1.0).is_err());
        assert!(matches!(
            TimeWindow::new(2.0, 1.0),
            Err(EngineError::InvalidTimeWindow { .. })
        ));
        assert!(TimeWindow::new(1.0, 1.5).is_ok());
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let window = TimeWindow::new(1.0, 2.0).unwrap();
        assert!(window.contains(1.0));
        assert!(window.contains(2.0));
        assert!(!window.contains(0.999));
        assert!(!window.contains(2.001));
    }

    #[test]
    fn test_polyline_requires_point_pairs() {
        let result = Shape::new(
            ShapeId::generate(),
            Point::default(),
            Geometry::Polyline {
                points: vec![0.0, 0.0, 1.0],
                tension: None,
            },
            ViewportSize::default(),
            TimeWindow::starting_at(0.0),
        );
        assert!(matches!(result, Err(EngineError::InvalidGeometry { .. })));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ShapeId::generate(), ShapeId::generate());
    }

    #[test]
    fn test_rebase_bakes_rendered_geometry() {
        let mut shape = rect(100.0, 50.0, 40.0, 20.0, ViewportSize::new(640.0, 360.0));
        let viewport = ViewportSize::new(1280.0, 720.0);
        let before = shape.rendered(viewport);

        shape.rebase(viewport);

        assert_eq!(shape.reference(), viewport);
        assert_eq!(shape.origin(), Point::new(200.0, 100.0));
        assert_eq!(
            shape.geometry(),
            &Geometry::Rectangle {
                width: 80.0,
                height: 40.0
            }
        );
        assert_eq!(shape.rendered(viewport), before);
    }

    #[test]
    fn test_fold_scale_per_kind() {
        let viewport = ViewportSize::new(640.0, 360.0);
        let mut r = rect(10.0, 10.0, 40.0, 20.0, viewport);
        r.fold_scale(2.0, 0.5, Point::new(5.0, 6.0), viewport);
        assert_eq!(r.origin(), Point::new(5.0, 6.0));
        assert_eq!(
            r.geometry(),
            &Geometry::Rectangle {
                width: 80.0,
                height: 10.0
            }
        );

        let mut c = Shape::new(
            ShapeId::generate(),
            Point::new(50.0, 50.0),
            Geometry::Circle { radius: 10.0 },
            viewport,
            TimeWindow::starting_at(0.0),
        )
        .unwrap();
        c.fold_scale(3.0, 1.0, Point::new(50.0, 50.0), viewport);
        assert_eq!(c.geometry(), &Geometry::Circle { radius: 30.0 });

        let mut l = Shape::new(
            ShapeId::generate(),
            Point::new(0.0, 0.0),
            Geometry::Polyline {
                points: vec![0.0, 0.0, 10.0, 20.0],
                tension: Some(0.5),
            },
            viewport,
            TimeWindow::starting_at(0.0),
        )
        .unwrap();
        l.fold_scale(2.0, 3.0, Point::new(1.0, 1.0), viewport);
        assert_eq!(
            l.geometry(),
            &Geometry::Polyline {
                points: vec![0.0, 0.0, 20.0, 60.0],
                tension: Some(0.5)
            }
        );
    }

    #[test]
    fn test_reshape_keeps_kind() {
        let mut shape = rect(0.0, 0.0, 4.0, 4.0, ViewportSize::default());
        assert!(!shape.reshape(Geometry::Circle { radius: 3.0 }));
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        assert!(shape.reshape(Geometry::Rectangle {
            width: 9.0,
            height: 9.0
        }));
    }
}
