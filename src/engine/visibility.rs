// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback-time visibility filter.
//!
//! A shape is visible, and therefore drawable and selectable, exactly when
//! the playback time lies inside its time window, bounds included.

use crate::models::shape::{Shape, ShapeId};

/// Visible shapes at time `t`, in z-order.
pub fn visible_shapes(shapes: &[Shape], t: f64) -> impl Iterator<Item = &Shape> {
    shapes.iter().filter(move |shape| shape.is_visible_at(t))
}

/// Whether the shape with `id` exists and is visible at `t`.
pub fn is_visible(shapes: &[Shape], id: &ShapeId, t: f64) -> bool {
    shapes
        .iter()
        .find(|shape| shape.id() == id)
        .is_some_and(|shape| shape.is_visible_at(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shape::{Geometry, Point, TimeWindow, ViewportSize};

    fn windowed(id: &str, start: f64, end: f64) -> Shape {
        Shape::new(
            ShapeId::from(id),
            Point::default(),
            Geometry::Rectangle {
                width: 1.0,
                height: 1.0,
            },
            ViewportSize::default(),
            TimeWindow::new(start, end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_filter_keeps_order_and_bounds() {
        let shapes = vec![
            windowed("a", 0.0, 1.0),
            windowed("b", 1.0, 2.0),
            windowed("c", 2.5, 3.0),
        ];
        let ids: Vec<&str> = visible_shapes(&shapes, 1.0).map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(visible_shapes(&shapes, 2.2).count(), 0);
    }

    #[test]
    fn test_is_visible_unknown_id() {
        let shapes = vec![windowed("a", 0.0, 1.0)];
        assert!(is_visible(&shapes, &ShapeId::from("a"), 0.5));
        assert!(!is_visible(&shapes, &ShapeId::from("zzz"), 0.5));
    }
}
