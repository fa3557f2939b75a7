// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Selection, drag and resize handling.
//!
//! The controller owns the selected id and the state of an in-flight drag or
//! transform. Gesture starts checkpoint the history; gesture ends rebase the
//! shape to the current viewport and write the result into stored geometry.
//! Whether a gesture is allowed at all (edit lock, fullscreen, active tool)
//! is decided by the engine before calling in here.

use crate::engine::history::History;
use crate::models::shape::{Point, Shape, ShapeId, ViewportSize};
use crate::util::geometry::clamp_origin;

/// The host widget's view of a shape being resized.
///
/// `x`/`y` are the node's position in viewport pixels and `scale_x`/
/// `scale_y` the scale the user applied. The engine folds the scale into the
/// shape and resets the node's scale to 1 so it never compounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl NodeTransform {
    pub fn new(x: f64, y: f64, scale_x: f64, scale_y: f64) -> Self {
        Self {
            x,
            y,
            scale_x,
            scale_y,
        }
    }
}

#[derive(Debug, Clone)]
struct DragState {
    id: ShapeId,
    position: Option<Point>,
}

/// Selection and manipulation state for one overlay.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selected: Option<ShapeId>,
    drag: Option<DragState>,
    transforming: Option<ShapeId>,
}

fn find<'a>(shapes: &'a [Shape], id: &ShapeId) -> Option<&'a Shape> {
    shapes.iter().find(|shape| shape.id() == id)
}

fn find_mut<'a>(shapes: &'a mut [Shape], id: &ShapeId) -> Option<&'a mut Shape> {
    shapes.iter_mut().find(|shape| shape.id() == id)
}

impl SelectionController {
    pub fn selected(&self) -> Option<&ShapeId> {
        self.selected.as_ref()
    }

    /// Change the selection. Returns whether it changed.
    pub fn select(&mut self, id: Option<ShapeId>) -> bool {
        if self.selected == id {
            return false;
        }
        log::debug!(
            "Selection changed to {}",
            id.as_ref().map_or("none", |id| id.as_str())
        );
        self.selected = id;
        true
    }

    pub fn clear(&mut self) -> bool {
        self.select(None)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_transforming(&self) -> bool {
        self.transforming.is_some()
    }

    /// Clamped position computed by the most recent drag move.
    pub fn last_drag_position(&self) -> Option<Point> {
        self.drag.as_ref().and_then(|drag| drag.position)
    }

    /// Start dragging `id`, which must be the selected shape.
    pub fn begin_drag(&mut self, id: &ShapeId, shapes: &[Shape], history: &mut History) -> bool {
        if self.selected.as_ref() != Some(id) || find(shapes, id).is_none() {
            log::warn!("Ignoring drag of unselected shape {}", id);
            return false;
        }
        history.checkpoint(shapes);
        self.drag = Some(DragState {
            id: id.clone(),
            position: None,
        });
        true
    }

    /// Clamp a proposed origin for the dragged shape and remember it.
    pub fn drag_to(&mut self, proposed: Point, shapes: &[Shape], viewport: ViewportSize) -> Option<Point> {
        let drag = self.drag.as_mut()?;
        let shape = find(shapes, &drag.id)?;
        let clamped = clamp_origin(proposed, &shape.local_bounds(viewport), viewport);
        drag.position = Some(clamped);
        Some(clamped)
    }

    /// Finish the drag, storing the last clamped position. Returns the moved
    /// shape's id, or `None` when there was no movement to commit.
    pub fn end_drag(&mut self, shapes: &mut [Shape], viewport: ViewportSize) -> Option<ShapeId> {
        let drag = self.drag.take()?;
        let position = drag.position?;
        let shape = find_mut(shapes, &drag.id)?;
        shape.move_to(position, viewport);
        log::info!(
            "Moved {} {} to ({:.1}, {:.1})",
            shape.kind(),
            drag.id,
            position.x,
            position.y
        );
        Some(drag.id)
    }

    /// Start resizing `id`, which must be the selected shape.
    pub fn begin_transform(&mut self, id: &ShapeId, shapes: &[Shape], history: &mut History) -> bool {
        if self.selected.as_ref() != Some(id) || find(shapes, id).is_none() {
            log::warn!("Ignoring transform of unselected shape {}", id);
            return false;
        }
        history.checkpoint(shapes);
        self.transforming = Some(id.clone());
        true
    }

    /// Finish the resize. The node's scale is always reset; the shape is only
    /// written when `commit` is set.
    pub fn end_transform(
        &mut self,
        node: &mut NodeTransform,
        shapes: &mut [Shape],
        viewport: ViewportSize,
        commit: bool,
    ) -> Option<ShapeId> {
        let id = self.transforming.take()?;
        let (scale_x, scale_y) = (node.scale_x, node.scale_y);
        node.scale_x = 1.0;
        node.scale_y = 1.0;
        if !commit {
            log::debug!("Transform of {} not committed", id);
            return None;
        }

        let shape = find_mut(shapes, &id)?;
        shape.fold_scale(scale_x, scale_y, Point::new(node.x, node.y), viewport);
        let origin = clamp_origin(shape.origin(), &shape.local_bounds(viewport), viewport);
        shape.move_to(origin, viewport);
        log::info!(
            "Resized {} {} by ({:.3}, {:.3})",
            shape.kind(),
            id,
            scale_x,
            scale_y
        );
        Some(id)
    }

    /// Remove the selected shape. Returns the removed id.
    pub fn delete_selected(&mut self, shapes: &mut Vec<Shape>, history: &mut History) -> Option<ShapeId> {
        let id = self.selected.take()?;
        if find(shapes, &id).is_none() {
            return None;
        }
        history.commit(shapes, |shapes| shapes.retain(|shape| shape.id() != &id));
        log::info!("Deleted shape {}, total: {}", id, shapes.len());
        Some(id)
    }

    /// Forget any in-flight drag or transform without writing anything.
    pub fn abort_gestures(&mut self) {
        self.drag = None;
        self.transforming = None;
    }

    /// Drop the selection when it can no longer be edited. Returns whether
    /// it was cleared.
    pub fn enforce(&mut self, shapes: &[Shape], t: f64, playing: bool, locked: bool) -> bool {
        let Some(id) = &self.selected else {
            return false;
        };
        let visible = find(shapes, id).is_some_and(|shape| shape.is_visible_at(t));
        if playing || locked || !visible {
            self.abort_gestures();
            return self.clear();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shape::{Geometry, TimeWindow};

    const VIEWPORT: ViewportSize = ViewportSize {
        width: 640.0,
        height: 360.0,
    };

    fn rect(id: &str, x: f64, y: f64) -> Shape {
        Shape::new(
            ShapeId::from(id),
            Point::new(x, y),
            Geometry::Rectangle {
                width: 100.0,
                height: 50.0,
            },
            VIEWPORT,
            TimeWindow::new(0.0, 1.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_drag_requires_selection() {
        let shapes = vec![rect("a", 10.0, 10.0)];
        let mut history = History::default();
        let mut controller = SelectionController::default();
        assert!(!controller.begin_drag(&ShapeId::from("a"), &shapes, &mut history));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_drag_clamps_and_commits() {
        let mut shapes = vec![rect("a", 10.0, 10.0)];
        let mut history = History::default();
        let mut controller = SelectionController::default();
        let id = ShapeId::from("a");
        controller.select(Some(id.clone()));

        assert!(controller.begin_drag(&id, &shapes, &mut history));
        assert!(history.can_undo());
        let clamped = controller.drag_to(Point::new(600.0, -30.0), &shapes, VIEWPORT).unwrap();
        assert_eq!(clamped, Point::new(540.0, 0.0));
        assert_eq!(controller.last_drag_position(), Some(clamped));

        assert_eq!(controller.end_drag(&mut shapes, VIEWPORT), Some(id));
        assert_eq!(shapes[0].origin(), Point::new(540.0, 0.0));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_drag_commit_rebases_to_current_viewport() {
        let mut shapes = vec![rect("a", 10.0, 10.0)];
        let mut history = History::default();
        let mut controller = SelectionController::default();
        let id = ShapeId::from("a");
        controller.select(Some(id.clone()));
        let big = ViewportSize::new(1280.0, 720.0);

        controller.begin_drag(&id, &shapes, &mut history);
        controller.drag_to(Point::new(300.0, 300.0), &shapes, big);
        controller.end_drag(&mut shapes, big);

        assert_eq!(shapes[0].reference(), big);
        assert_eq!(
            shapes[0].geometry(),
            &Geometry::Rectangle {
                width: 200.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn test_transform_resets_node_scale() {
        let mut shapes = vec![rect("a", 10.0, 10.0)];
        let mut history = History::default();
        let mut controller = SelectionController::default();
        let id = ShapeId::from("a");
        controller.select(Some(id.clone()));

        assert!(controller.begin_transform(&id, &shapes, &mut history));
        let mut node = NodeTransform::new(20.0, 30.0, 2.0, 1.5);
        assert_eq!(controller.end_transform(&mut node, &mut shapes, VIEWPORT, true), Some(id));
        assert_eq!((node.scale_x, node.scale_y), (1.0, 1.0));
        assert_eq!(shapes[0].origin(), Point::new(20.0, 30.0));
        assert_eq!(
            shapes[0].geometry(),
            &Geometry::Rectangle {
                width: 200.0,
                height: 75.0
            }
        );
    }

    #[test]
    fn test_suppressed_transform_leaves_shape() {
        let mut shapes = vec![rect("a", 10.0, 10.0)];
        let before = shapes.clone();
        let mut history = History::default();
        let mut controller = SelectionController::default();
        let id = ShapeId::from("a");
        controller.select(Some(id.clone()));

        controller.begin_transform(&id, &shapes, &mut history);
        let mut node = NodeTransform::new(20.0, 30.0, 2.0, 2.0);
        assert!(controller.end_transform(&mut node, &mut shapes, VIEWPORT, false).is_none());
        assert_eq!(node.scale_x, 1.0);
        assert_eq!(shapes, before);
    }

    #[test]
    fn test_enforce_clears_outside_window() {
        let shapes = vec![rect("a", 10.0, 10.0)];
        let mut controller = SelectionController::default();
        controller.select(Some(ShapeId::from("a")));
        assert!(!controller.enforce(&shapes, 0.5, false, false));
        assert!(controller.enforce(&shapes, 1.5, false, false));
        assert!(controller.selected().is_none());

        controller.select(Some(ShapeId::from("a")));
        assert!(controller.enforce(&shapes, 0.5, true, false));
        controller.select(Some(ShapeId::from("a")));
        assert!(controller.enforce(&shapes, 0.5, false, true));
    }

    #[test]
    fn test_delete_selected_is_undoable() {
        let mut shapes = vec![rect("a", 0.0, 0.0), rect("b", 0.0, 0.0)];
        let mut history = History::default();
        let mut controller = SelectionController::default();
        controller.select(Some(ShapeId::from("a")));

        assert_eq!(
            controller.delete_selected(&mut shapes, &mut history),
            Some(ShapeId::from("a"))
        );
        assert_eq!(shapes.len(), 1);
        assert!(controller.selected().is_none());
        assert!(history.undo(&mut shapes));
        assert_eq!(shapes.len(), 2);
    }
}
