// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine configuration.
//!
//! Options use the host-facing camelCase names (`selectedShapeTool`,
//! `lockEdit`, `initialData`, ...) and can be read from JSON or YAML.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::draw::{Tool, DEFAULT_MOVE_INTERVAL};
use crate::io::serialization::ShapeRecord;
use crate::models::shape::{ViewportSize, DEFAULT_COLOR, DEFAULT_OPACITY, DEFAULT_STROKE_WIDTH};

/// Recognised engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Video source. Playback itself belongs to the host.
    pub video_url: String,
    /// `null`/`"none"` selects the pointer tool.
    pub selected_shape_tool: Option<Tool>,
    /// Suppresses rendering only; data and history are untouched.
    pub hide_annotations: bool,
    /// Disables every mutating interaction.
    pub lock_edit: bool,
    pub annotation_color: String,
    pub stroke_width: f64,
    pub opacity: f64,
    /// Seed collection.
    pub initial_data: Vec<ShapeRecord>,
    /// Cap on undo snapshots. Unset keeps the whole history.
    pub history_limit: Option<usize>,
    pub pointer_move_interval_ms: u64,
    /// Render surface size before the host reports one.
    pub viewport: ViewportSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            video_url: String::new(),
            selected_shape_tool: None,
            hide_annotations: false,
            lock_edit: false,
            annotation_color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            opacity: DEFAULT_OPACITY,
            initial_data: Vec::new(),
            history_limit: None,
            pointer_move_interval_ms: DEFAULT_MOVE_INTERVAL.as_millis() as u64,
            viewport: ViewportSize::default(),
        }
    }
}

impl EngineConfig {
    pub fn tool(&self) -> Tool {
        self.selected_shape_tool.unwrap_or_default()
    }

    pub fn pointer_move_interval(&self) -> Duration {
        Duration::from_millis(self.pointer_move_interval_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid JSON configuration")
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid YAML configuration")
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            other => anyhow::bail!("Unsupported config extension: {:?}", other),
        };
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_json_str(r#"{ "lockEdit": true }"#).unwrap();
        assert!(config.lock_edit);
        assert_eq!(config.tool(), Tool::Select);
        assert_eq!(config.annotation_color, DEFAULT_COLOR);
        assert_eq!(config.history_limit, None);
        assert_eq!(config.pointer_move_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_host_option_names() {
        let yaml = "videoUrl: clip.mp4\nselectedShapeTool: line\nhideAnnotations: true\nannotationColor: '#00ff00'\nstrokeWidth: 4\nopacity: 0.5\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.video_url, "clip.mp4");
        assert_eq!(config.tool(), Tool::Polyline);
        assert!(config.hide_annotations);
        assert_eq!(config.annotation_color, "#00ff00");
        assert_eq!(config.stroke_width, 4.0);
        assert_eq!(config.opacity, 0.5);
    }

    #[test]
    fn test_history_limit_is_opt_in() {
        let config = EngineConfig::from_json_str(r#"{ "historyLimit": 10 }"#).unwrap();
        assert_eq!(config.history_limit, Some(10));
    }

    #[test]
    fn test_null_tool_is_pointer() {
        let config = EngineConfig::from_json_str(r#"{ "selectedShapeTool": null }"#).unwrap();
        assert_eq!(config.tool(), Tool::Select);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}
