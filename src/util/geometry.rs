// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate normalization between a shape's
//! reference viewport and the current viewport, bounding boxes, drag
//! clamping and hit testing.

use crate::models::shape::{Geometry, Point, Shape, ViewportSize};

/// Per-axis factors mapping reference pixels to current pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Factors from `reference` to `current`. A non-positive reference axis
    /// maps 1:1.
    pub fn between(reference: ViewportSize, current: ViewportSize) -> Self {
        let axis = |cur: f64, refv: f64| if refv > 0.0 { cur / refv } else { 1.0 };
        Self {
            x: axis(current.width, reference.width),
            y: axis(current.height, reference.height),
        }
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn translate(&self, by: Point) -> Bounds {
        Bounds {
            min_x: self.min_x + by.x,
            min_y: self.min_y + by.y,
            max_x: self.max_x + by.x,
            max_y: self.max_y + by.y,
        }
    }

    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        point.x >= self.min_x - tolerance
            && point.x <= self.max_x + tolerance
            && point.y >= self.min_y - tolerance
            && point.y <= self.max_y + tolerance
    }
}

/// Shape geometry in current-viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderGeometry {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
    Polyline {
        x: f64,
        y: f64,
        points: Vec<f64>,
        tension: f64,
    },
}

impl RenderGeometry {
    pub fn origin(&self) -> Point {
        match self {
            RenderGeometry::Rectangle { x, y, .. }
            | RenderGeometry::Circle { x, y, .. }
            | RenderGeometry::Polyline { x, y, .. } => Point::new(*x, *y),
        }
    }

    /// Extents relative to the origin. Rectangles drawn "backwards" have
    /// negative width or height and extend left of / above the origin.
    pub fn local_bounds(&self) -> Bounds {
        match self {
            RenderGeometry::Rectangle { width, height, .. } => Bounds {
                min_x: width.min(0.0),
                min_y: height.min(0.0),
                max_x: width.max(0.0),
                max_y: height.max(0.0),
            },
            RenderGeometry::Circle { radius, .. } => Bounds {
                min_x: -radius,
                min_y: -radius,
                max_x: *radius,
                max_y: *radius,
            },
            RenderGeometry::Polyline { points, .. } => {
                if points.len() < 2 {
                    return Bounds {
                        min_x: 0.0,
                        min_y: 0.0,
                        max_x: 0.0,
                        max_y: 0.0,
                    };
                }
                let mut bounds = Bounds {
                    min_x: f64::INFINITY,
                    min_y: f64::INFINITY,
                    max_x: f64::NEG_INFINITY,
                    max_y: f64::NEG_INFINITY,
                };
                for pair in points.chunks_exact(2) {
                    bounds.min_x = bounds.min_x.min(pair[0]);
                    bounds.max_x = bounds.max_x.max(pair[0]);
                    bounds.min_y = bounds.min_y.min(pair[1]);
                    bounds.max_y = bounds.max_y.max(pair[1]);
                }
                bounds
            }
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.local_bounds().translate(self.origin())
    }

    /// Whether `point` lies on (or within `tolerance` of) the shape.
    pub fn contains(&self, point: Point, tolerance: f64) -> bool {
        match self {
            RenderGeometry::Rectangle { .. } => self.bounds().contains(point, tolerance),
            RenderGeometry::Circle { x, y, radius } => {
                point.distance_to(&Point::new(*x, *y)) <= radius + tolerance
            }
            RenderGeometry::Polyline { x, y, points, .. } => {
                let vertices: Vec<Point> = points
                    .chunks_exact(2)
                    .map(|pair| Point::new(x + pair[0], y + pair[1]))
                    .collect();
                match vertices.as_slice() {
                    [] => false,
                    [only] => only.distance_to(&point) <= tolerance,
                    _ => vertices
                        .windows(2)
                        .any(|seg| distance_to_segment(point, seg[0], seg[1]) <= tolerance),
                }
            }
        }
    }
}

/// Map a shape's stored geometry into `viewport` pixels.
///
/// Each axis scales independently. Circle radii use the horizontal factor
/// only, so a non-uniform resize keeps a round circle whose size follows the
/// width.
pub fn normalize(shape: &Shape, viewport: ViewportSize) -> RenderGeometry {
    let f = ScaleFactors::between(shape.reference(), viewport);
    let origin = shape.origin();
    let (x, y) = (origin.x * f.x, origin.y * f.y);
    match shape.geometry() {
        Geometry::Rectangle { width, height } => RenderGeometry::Rectangle {
            x,
            y,
            width: width * f.x,
            height: height * f.y,
        },
        Geometry::Circle { radius } => RenderGeometry::Circle {
            x,
            y,
            radius: radius * f.x,
        },
        Geometry::Polyline { points, tension } => RenderGeometry::Polyline {
            x,
            y,
            points: points
                .iter()
                .enumerate()
                .map(|(i, p)| if i % 2 == 0 { p * f.x } else { p * f.y })
                .collect(),
            tension: tension.unwrap_or(0.0),
        },
    }
}

/// Clamp a proposed origin so that `local` (extents relative to the origin)
/// stays inside `[0, width] x [0, height]`. Each axis is clamped on its own;
/// a shape larger than the viewport is pinned to the top/left edge.
pub fn clamp_origin(proposed: Point, local: &Bounds, viewport: ViewportSize) -> Point {
    Point::new(
        clamp_axis(proposed.x, -local.min_x, viewport.width - local.max_x),
        clamp_axis(proposed.y, -local.min_y, viewport.height - local.max_y),
    )
}

fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if hi < lo {
        lo
    } else {
        value.max(lo).min(hi)
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}
