// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VAO - Video Annotation Overlay
//!
//! A headless engine for time-bound vector annotations (rectangles, circles
//! and polylines) drawn over a playing video. Shapes are stored against the
//! viewport they were drawn at and scaled to whatever size the host renders,
//! each one is visible only inside its time window, and every committed edit
//! can be undone and redone.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod models;
pub mod util;

pub use config::EngineConfig;
pub use engine::draw::Tool;
pub use engine::events::{HostEvent, Key, KeyPress};
pub use engine::selection::NodeTransform;
pub use engine::{AnnotationEngine, RenderedShape};
pub use error::EngineError;
pub use io::serialization::{ShapeProperties, ShapeRecord};
pub use models::shape::{Geometry, Point, Shape, ShapeId, ShapeKind, TimeWindow, ViewportSize};
pub use util::geometry::RenderGeometry;
