// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine error types.

use crate::models::shape::ShapeId;

/// Errors raised by the annotation engine and its data model.
///
/// All of these are recoverable: the host corrects the precondition (for
/// example by selecting a shape first) and retries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("No selection")]
    NoSelection,
    #[error("duplicate shape id: {0}")]
    DuplicateId(ShapeId),
    #[error("invalid time window: start {start} must be before end {end}")]
    InvalidTimeWindow { start: f64, end: f64 },
    #[error("invalid geometry for {kind}: {reason}")]
    InvalidGeometry { kind: &'static str, reason: String },
}
