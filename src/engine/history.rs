// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Linear undo/redo over whole-collection snapshots.
//!
//! Every mutation of the shape collection that is not itself an undo or redo
//! goes through [`History::commit`] (atomic edits) or [`History::checkpoint`]
//! (gestures that record state when they start and apply when they end).
//! Both push the *pre-mutation* collection and clear the redo stack.

use crate::models::shape::Shape;

/// History system for undo/redo functionality.
#[derive(Debug, Clone)]
pub struct History {
    /// Undo stack (past states)
    undo_stack: Vec<Vec<Shape>>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<Vec<Shape>>,
    /// Maximum number of undo entries; `None` keeps every snapshot
    max_size: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(None)
    }
}

impl History {
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.map(|max| max.max(1)),
        }
    }

    /// Record `shapes` as the state to return to, and drop redo entries.
    pub fn checkpoint(&mut self, shapes: &[Shape]) {
        self.undo_stack.push(shapes.to_vec());
        if let Some(max) = self.max_size {
            if self.undo_stack.len() > max {
                self.undo_stack.remove(0);
            }
        }
        self.redo_stack.clear();
    }

    /// Snapshot, clear redo, then apply `mutation` to the collection.
    pub fn commit<R>(&mut self, shapes: &mut Vec<Shape>, mutation: impl FnOnce(&mut Vec<Shape>) -> R) -> R {
        self.checkpoint(shapes);
        mutation(shapes)
    }

    /// Restore the previous state. Returns `false` when there is nothing to
    /// undo.
    pub fn undo(&mut self, shapes: &mut Vec<Shape>) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.redo_stack.push(std::mem::replace(shapes, previous));
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone state. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self, shapes: &mut Vec<Shape>) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(shapes, next));
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shape::{Geometry, Point, ShapeId, TimeWindow, ViewportSize};

    fn circle(id: &str) -> Shape {
        Shape::new(
            ShapeId::from(id),
            Point::new(10.0, 10.0),
            Geometry::Circle { radius: 5.0 },
            ViewportSize::default(),
            TimeWindow::starting_at(0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = History::default();
        let mut shapes = vec![circle("a")];
        assert!(!history.undo(&mut shapes));
        assert!(!history.redo(&mut shapes));
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_commit_records_pre_mutation_state() {
        let mut history = History::default();
        let mut shapes = Vec::new();

        history.commit(&mut shapes, |s| s.push(circle("a")));
        assert_eq!(shapes.len(), 1);

        assert!(history.undo(&mut shapes));
        assert!(shapes.is_empty());
        assert!(history.redo(&mut shapes));
        assert_eq!(shapes[0].id().as_str(), "a");
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = History::default();
        let mut shapes = Vec::new();
        history.commit(&mut shapes, |s| s.push(circle("a")));
        history.undo(&mut shapes);
        assert!(history.can_redo());

        history.commit(&mut shapes, |s| s.push(circle("b")));
        assert!(!history.can_redo());
        assert!(!history.redo(&mut shapes));
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].id().as_str(), "b");
    }

    #[test]
    fn test_limit_drops_oldest_entry() {
        let mut history = History::new(Some(2));
        let mut shapes = Vec::new();
        for id in ["a", "b", "c"] {
            history.commit(&mut shapes, |s| s.push(circle(id)));
        }
        assert_eq!(history.undo_len(), 2);
        history.undo(&mut shapes);
        history.undo(&mut shapes);
        // The empty starting state fell off the bottom of the stack.
        assert_eq!(shapes.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_default_history_is_unbounded() {
        let mut history = History::default();
        let mut shapes = Vec::new();
        for i in 0..120 {
            history.commit(&mut shapes, |s| s.push(circle(&format!("c{i}"))));
        }
        assert_eq!(history.undo_len(), 120);
        while history.undo(&mut shapes) {}
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        let mut shapes = Vec::new();
        history.commit(&mut shapes, |s| s.push(circle("a")));
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
