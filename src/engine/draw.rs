// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Draw session state machine.
//!
//! `Idle -> Drawing` on pointer-down with a drawing tool, `Drawing -> Idle`
//! on pointer-up. While drawing, the candidate's geometry follows the
//! pointer delta from the anchor. Pointer moves are rate limited; the
//! pointer-up position is always applied.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::shape::{Geometry, Point, Shape, ShapeId, ShapeKind, TimeWindow, ViewportSize};

/// Default minimum spacing between applied pointer moves.
pub const DEFAULT_MOVE_INTERVAL: Duration = Duration::from_millis(100);

/// Current tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer tool: select, drag and resize existing shapes.
    #[default]
    #[serde(rename = "none", alias = "select")]
    Select,
    Rectangle,
    Circle,
    #[serde(alias = "line")]
    Polyline,
}

impl Tool {
    /// The shape kind this tool draws, if it is a drawing tool.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Select => None,
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Circle => Some(ShapeKind::Circle),
            Tool::Polyline => Some(ShapeKind::Polyline),
        }
    }

    pub fn is_drawing(self) -> bool {
        self.shape_kind().is_some()
    }
}

/// Everything a new candidate inherits from the engine at pointer-down.
#[derive(Debug, Clone)]
pub struct DrawContext {
    pub time: f64,
    pub viewport: ViewportSize,
    pub color: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

/// Drops pointer samples that arrive faster than `interval`.
#[derive(Debug, Clone)]
pub struct PointerThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PointerThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a sample at `now` should be applied.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone)]
enum DrawState {
    Idle,
    Drawing { anchor: Point, candidate: Shape },
}

/// Draw session for one overlay.
#[derive(Debug, Clone)]
pub struct DrawSession {
    state: DrawState,
    throttle: PointerThrottle,
}

impl Default for DrawSession {
    fn default() -> Self {
        Self::new(DEFAULT_MOVE_INTERVAL)
    }
}

impl DrawSession {
    pub fn new(move_interval: Duration) -> Self {
        Self {
            state: DrawState::Idle,
            throttle: PointerThrottle::new(move_interval),
        }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing { .. })
    }

    /// The in-progress shape, if any.
    pub fn candidate(&self) -> Option<&Shape> {
        match &self.state {
            DrawState::Drawing { candidate, .. } => Some(candidate),
            DrawState::Idle => None,
        }
    }

    /// Start drawing with `tool` at `at`. Returns `false` (and stays idle)
    /// when the tool does not draw.
    pub fn begin(&mut self, tool: Tool, at: Point, ctx: &DrawContext) -> bool {
        let Some(kind) = tool.shape_kind() else {
            log::warn!("Tool {:?} cannot draw; ignoring pointer-down", tool);
            return false;
        };

        let candidate = Shape::new(
            ShapeId::generate(),
            at,
            Geometry::default_for(kind),
            ctx.viewport,
            TimeWindow::starting_at(ctx.time),
        );
        match candidate {
            Ok(candidate) => {
                let candidate = candidate
                    .with_color(ctx.color.clone())
                    .with_style(ctx.stroke_width, ctx.opacity);
                log::debug!("Started drawing {} {} at ({:.1}, {:.1})", kind, candidate.id(), at.x, at.y);
                self.throttle.reset();
                self.state = DrawState::Drawing {
                    anchor: at,
                    candidate,
                };
                true
            }
            Err(e) => {
                log::error!("Failed to create {} candidate: {}", kind, e);
                false
            }
        }
    }

    /// Follow the pointer. Returns whether the candidate changed; samples
    /// inside the throttle interval are dropped.
    pub fn update(&mut self, at: Point, now: Instant) -> bool {
        if !self.is_drawing() || !self.throttle.ready(now) {
            return false;
        }
        self.apply(at)
    }

    /// Finish the session. The pointer-up position, when known, is applied
    /// before the candidate is handed back.
    pub fn finish(&mut self, at: Option<Point>) -> Option<Shape> {
        if let Some(at) = at {
            self.apply(at);
        }
        self.cancel()
    }

    /// Drop back to idle, returning whatever was being drawn.
    pub fn cancel(&mut self) -> Option<Shape> {
        match std::mem::replace(&mut self.state, DrawState::Idle) {
            DrawState::Drawing { candidate, .. } => Some(candidate),
            DrawState::Idle => None,
        }
    }

    fn apply(&mut self, at: Point) -> bool {
        let DrawState::Drawing { anchor, candidate } = &mut self.state else {
            return false;
        };
        // No movement keeps the default minimal geometry.
        if at == *anchor {
            return false;
        }
        let geometry = Geometry::from_drag(candidate.kind(), at.x - anchor.x, at.y - anchor.y);
        candidate.reshape(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DrawContext {
        DrawContext {
            time: 3.0,
            viewport: ViewportSize::new(640.0, 360.0),
            color: "blue".to_string(),
            stroke_width: 3.0,
            opacity: 0.8,
        }
    }

    #[test]
    fn test_select_tool_never_starts_session() {
        let mut session = DrawSession::default();
        assert!(!session.begin(Tool::Select, Point::new(1.0, 1.0), &ctx()));
        assert!(!session.is_drawing());
        assert!(session.finish(Some(Point::new(5.0, 5.0))).is_none());
    }

    #[test]
    fn test_candidate_defaults() {
        let mut session = DrawSession::default();
        assert!(session.begin(Tool::Circle, Point::new(10.0, 20.0), &ctx()));
        let candidate = session.candidate().unwrap();
        assert_eq!(candidate.geometry(), &Geometry::Circle { radius: 20.0 });
        assert_eq!(candidate.color, "blue");
        assert_eq!(candidate.stroke_width, 3.0);
        assert_eq!(candidate.opacity, 0.8);
        assert!(candidate.label.is_empty());
        assert!(candidate.data.is_empty());
        assert_eq!(candidate.time_window.start(), 3.0);
        assert_eq!(candidate.time_window.end(), 3.5);
        assert_eq!(candidate.reference(), ViewportSize::new(640.0, 360.0));
    }

    #[test]
    fn test_geometry_follows_delta_per_kind() {
        let now = Instant::now();
        let mut session = DrawSession::default();

        session.begin(Tool::Rectangle, Point::new(50.0, 50.0), &ctx());
        assert!(session.update(Point::new(150.0, 120.0), now));
        assert_eq!(
            session.candidate().unwrap().geometry(),
            &Geometry::Rectangle {
                width: 100.0,
                height: 70.0
            }
        );

        session.begin(Tool::Circle, Point::new(0.0, 0.0), &ctx());
        session.update(Point::new(3.0, 4.0), now);
        assert_eq!(session.candidate().unwrap().geometry(), &Geometry::Circle { radius: 5.0 });

        session.begin(Tool::Polyline, Point::new(10.0, 10.0), &ctx());
        session.update(Point::new(30.0, 5.0), now);
        assert_eq!(
            session.candidate().unwrap().geometry(),
            &Geometry::Polyline {
                points: vec![0.0, 0.0, 20.0, -5.0],
                tension: None
            }
        );
    }

    #[test]
    fn test_moves_are_throttled_but_pointer_up_wins() {
        let start = Instant::now();
        let mut session = DrawSession::new(Duration::from_millis(100));
        session.begin(Tool::Rectangle, Point::new(0.0, 0.0), &ctx());

        assert!(session.update(Point::new(10.0, 10.0), start));
        assert!(!session.update(Point::new(20.0, 20.0), start + Duration::from_millis(50)));
        assert_eq!(
            session.candidate().unwrap().geometry(),
            &Geometry::Rectangle {
                width: 10.0,
                height: 10.0
            }
        );
        assert!(session.update(Point::new(30.0, 30.0), start + Duration::from_millis(150)));

        let shape = session.finish(Some(Point::new(42.0, 7.0))).unwrap();
        assert_eq!(
            shape.geometry(),
            &Geometry::Rectangle {
                width: 42.0,
                height: 7.0
            }
        );
        assert!(!session.is_drawing());
    }

    #[test]
    fn test_click_without_movement_keeps_minimal_geometry() {
        let mut session = DrawSession::default();
        session.begin(Tool::Rectangle, Point::new(5.0, 5.0), &ctx());
        let shape = session.finish(Some(Point::new(5.0, 5.0))).unwrap();
        assert_eq!(
            shape.geometry(),
            &Geometry::Rectangle {
                width: 4.0,
                height: 4.0
            }
        );
    }

    #[test]
    fn test_tool_names() {
        let tool: Tool = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(tool, Tool::Polyline);
        let tool: Tool = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(tool, Tool::Select);
        assert!(serde_json::from_str::<Tool>("\"hexagon\"").is_err());
    }
}
