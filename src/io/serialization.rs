// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shape interchange format.
//!
//! This module maps shapes to and from the record layout hosts exchange
//! (`{ id, color, label, data, properties: { type, x, y, .. } }`) and
//! encodes whole collections as YAML or JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::models::shape::{
    Geometry, Point, Shape, ShapeId, ShapeKind, TimeWindow, ViewportSize, DEFAULT_COLOR,
    DEFAULT_OPACITY, DEFAULT_STROKE_WIDTH,
};

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn unit_scale() -> f64 {
    1.0
}

/// One shape as exchanged with the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub id: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub properties: ShapeProperties,
}

/// Geometry, timing and styling of a [`ShapeRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProperties {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub screen_width: f64,
    #[serde(default)]
    pub screen_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

fn missing(kind: ShapeKind, field: &str) -> EngineError {
    EngineError::InvalidGeometry {
        kind: kind.as_str(),
        reason: format!("missing {}", field),
    }
}

impl TryFrom<ShapeRecord> for Shape {
    type Error = EngineError;

    fn try_from(record: ShapeRecord) -> Result<Self, Self::Error> {
        let p = record.properties;
        let geometry = match p.kind {
            ShapeKind::Rectangle => Geometry::Rectangle {
                width: p.width.ok_or_else(|| missing(p.kind, "width"))?,
                height: p.height.ok_or_else(|| missing(p.kind, "height"))?,
            },
            ShapeKind::Circle => Geometry::Circle {
                radius: p.radius.ok_or_else(|| missing(p.kind, "radius"))?,
            },
            ShapeKind::Polyline => Geometry::Polyline {
                points: p.points.ok_or_else(|| missing(p.kind, "points"))?,
                tension: p.tension,
            },
        };

        let mut shape = Shape::new(
            ShapeId::from(record.id),
            Point::new(p.x, p.y),
            geometry,
            ViewportSize::new(p.screen_width, p.screen_height),
            TimeWindow::new(p.start_time, p.end_time)?,
        )?
        .with_color(record.color)
        .with_label(record.label)
        .with_style(
            p.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
            p.opacity.unwrap_or(DEFAULT_OPACITY),
        );
        shape.data = record.data;
        shape.scale = (p.scale_x, p.scale_y);
        Ok(shape)
    }
}

impl From<&Shape> for ShapeRecord {
    fn from(shape: &Shape) -> Self {
        let origin = shape.origin();
        let reference = shape.reference();
        let mut properties = ShapeProperties {
            kind: shape.kind(),
            x: origin.x,
            y: origin.y,
            width: None,
            height: None,
            radius: None,
            points: None,
            tension: None,
            start_time: shape.time_window.start(),
            end_time: shape.time_window.end(),
            scale_x: shape.scale.0,
            scale_y: shape.scale.1,
            screen_width: reference.width,
            screen_height: reference.height,
            stroke_width: Some(shape.stroke_width),
            opacity: Some(shape.opacity),
        };
        match shape.geometry() {
            Geometry::Rectangle { width, height } => {
                properties.width = Some(*width);
                properties.height = Some(*height);
            }
            Geometry::Circle { radius } => properties.radius = Some(*radius),
            Geometry::Polyline { points, tension } => {
                properties.points = Some(points.clone());
                properties.tension = *tension;
            }
        }
        Self {
            id: shape.id().to_string(),
            color: shape.color.clone(),
            label: shape.label.clone(),
            data: shape.data.clone(),
            properties,
        }
    }
}

/// Convert records into shapes, failing on the first invalid one.
pub fn shapes_from_records(records: Vec<ShapeRecord>) -> Result<Vec<Shape>, EngineError> {
    records.into_iter().map(Shape::try_from).collect()
}

pub fn records_from_shapes(shapes: &[Shape]) -> Vec<ShapeRecord> {
    shapes.iter().map(ShapeRecord::from).collect()
}

/// Encode a collection as pretty JSON.
pub fn to_json(shapes: &[Shape]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&records_from_shapes(shapes))?)
}

/// Encode a collection as YAML.
pub fn to_yaml(shapes: &[Shape]) -> Result<String> {
    Ok(serde_yaml::to_string(&records_from_shapes(shapes))?)
}

/// Decode a JSON collection.
pub fn from_json(json: &str) -> Result<Vec<ShapeRecord>> {
    serde_json::from_str(json).context("Failed to parse annotations as JSON")
}

/// Decode a YAML collection.
pub fn from_yaml(yaml: &str) -> Result<Vec<ShapeRecord>> {
    serde_yaml::from_str(yaml).context("Failed to parse annotations as YAML")
}

/// Read annotation records from a `.json`, `.yaml` or `.yml` file.
pub fn import_records(path: &Path) -> Result<Vec<ShapeRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => from_yaml(&text),
        Some("json") => from_json(&text),
        other => anyhow::bail!("Unsupported file extension: {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_interchange_rectangle() {
        let value = json!([{
            "id": "abc",
            "color": "green",
            "label": "car",
            "data": { "plate": "XYZ" },
            "properties": {
                "type": "rectangle",
                "x": 10, "y": 20, "width": 30, "height": 40,
                "startTime": 1.0, "endTime": 1.5,
                "scaleX": 1, "scaleY": 1,
                "screenWidth": 640, "screenHeight": 360
            }
        }]);
        let records = from_json(&value.to_string()).unwrap();
        let shapes = shapes_from_records(records).unwrap();
        let shape = &shapes[0];

        assert_eq!(shape.id().as_str(), "abc");
        assert_eq!(shape.color, "green");
        assert_eq!(shape.label, "car");
        assert_eq!(shape.data["plate"], json!("XYZ"));
        assert_eq!(
            shape.geometry(),
            &Geometry::Rectangle {
                width: 30.0,
                height: 40.0
            }
        );
        assert_eq!(shape.reference(), ViewportSize::new(640.0, 360.0));
        assert_eq!(shape.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(shape.opacity, DEFAULT_OPACITY);
    }

    #[test]
    fn test_encode_uses_interchange_names() {
        let shape = Shape::new(
            ShapeId::from("l1"),
            Point::new(1.0, 2.0),
            Geometry::Polyline {
                points: vec![0.0, 0.0, 5.0, 5.0],
                tension: None,
            },
            ViewportSize::new(800.0, 450.0),
            TimeWindow::new(0.0, 0.5).unwrap(),
        )
        .unwrap();
        let value = serde_json::to_value(ShapeRecord::from(&shape)).unwrap();
        let props = &value["properties"];

        assert_eq!(props["type"], json!("line"));
        assert_eq!(props["points"], json!([0.0, 0.0, 5.0, 5.0]));
        assert_eq!(props["startTime"], json!(0.0));
        assert_eq!(props["screenWidth"], json!(800.0));
        assert_eq!(props["strokeWidth"], json!(2.0));
        assert!(props.get("width").is_none());
        assert!(props.get("tension").is_none());
    }

    #[test]
    fn test_missing_kind_field_is_rejected() {
        let value = json!([{
            "id": "c",
            "properties": { "type": "circle", "x": 0, "y": 0, "startTime": 0, "endTime": 1 }
        }]);
        let records = from_json(&value.to_string()).unwrap();
        assert!(matches!(
            shapes_from_records(records),
            Err(EngineError::InvalidGeometry { kind: "circle", .. })
        ));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let value = json!([{
            "id": "c",
            "properties": { "type": "circle", "x": 0, "y": 0, "radius": 3, "startTime": 2, "endTime": 1 }
        }]);
        let records = from_json(&value.to_string()).unwrap();
        assert!(matches!(
            shapes_from_records(records),
            Err(EngineError::InvalidTimeWindow { .. })
        ));
    }

    #[test]
    fn test_yaml_file_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.yaml");
        let yaml = "- id: a\n  properties:\n    type: circle\n    x: 5\n    y: 5\n    radius: 2\n    startTime: 0\n    endTime: 1\n";
        std::fs::write(&path, yaml).unwrap();

        let records = import_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].color, DEFAULT_COLOR);

        let bad = dir.path().join("seed.txt");
        std::fs::write(&bad, yaml).unwrap();
        assert!(import_records(&bad).is_err());
    }
}
