// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation properties panel.
//!
//! Lists every annotation with its time window and lets the user rename the
//! selected one, merge JSON into its data payload, or delete it.

use serde_json::{Map, Value};
use vao::{AnnotationEngine, ShapeId};

/// Result of properties panel interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertiesAction {
    None,
    /// Seek to the shape's start time and select it.
    Select(ShapeId, f64),
    Rename(String),
    MergeData(Map<String, Value>),
    Delete,
}

/// Edit buffers for the selected shape.
#[derive(Debug, Clone, Default)]
pub struct PropertiesState {
    editing: Option<ShapeId>,
    label: String,
    data: String,
    data_error: Option<String>,
}

impl PropertiesState {
    fn sync(&mut self, engine: &AnnotationEngine) {
        let selected = engine.selected_id().cloned();
        if selected == self.editing {
            return;
        }
        self.editing = selected;
        self.label = engine.selected_shape().map(|s| s.label.clone()).unwrap_or_default();
        self.data = String::from("{}");
        self.data_error = None;
    }
}

fn parse_data(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Data must be a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, engine: &AnnotationEngine, state: &mut PropertiesState) -> PropertiesAction {
    let mut action = PropertiesAction::None;
    state.sync(engine);

    ui.heading("Annotations");
    ui.separator();

    if engine.shapes().is_empty() {
        ui.label(egui::RichText::new("No annotations yet").weak());
    }

    egui::ScrollArea::vertical()
        .id_source("annotation_list")
        .max_height(ui.available_height() * 0.5)
        .show(ui, |ui| {
            for shape in engine.shapes() {
                let window = shape.time_window;
                let name = if shape.label.is_empty() {
                    shape.kind().to_string()
                } else {
                    shape.label.clone()
                };
                let text = format!("{}  [{:.2}s - {:.2}s]", name, window.start(), window.end());
                let text = if shape.is_visible_at(engine.current_time()) {
                    egui::RichText::new(text)
                } else {
                    egui::RichText::new(text).weak()
                };
                let selected = engine.selected_id() == Some(shape.id());
                if ui.selectable_label(selected, text).clicked() && !selected {
                    action = PropertiesAction::Select(shape.id().clone(), window.start());
                }
            }
        });

    ui.separator();

    let Some(shape) = engine.selected_shape() else {
        ui.label(egui::RichText::new("Select an annotation to edit it").weak());
        return action;
    };

    egui::Grid::new("selected_properties").num_columns(2).show(ui, |ui| {
        ui.label("Id");
        ui.label(egui::RichText::new(shape.id().as_str()).monospace());
        ui.end_row();

        ui.label("Type");
        ui.label(shape.kind().as_str());
        ui.end_row();

        ui.label("Origin");
        let origin = shape.origin();
        ui.label(format!("({:.1}, {:.1})", origin.x, origin.y));
        ui.end_row();

        ui.label("Label");
        let response = ui.text_edit_singleline(&mut state.label);
        if response.lost_focus() && state.label != shape.label {
            action = PropertiesAction::Rename(state.label.clone());
        }
        ui.end_row();
    });

    ui.add_space(6.0);
    ui.label("Data");
    let current = serde_json::to_string_pretty(&shape.data).unwrap_or_default();
    ui.label(egui::RichText::new(current).monospace().small());

    ui.add(
        egui::TextEdit::multiline(&mut state.data)
            .code_editor()
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );
    ui.horizontal(|ui| {
        if ui.button("Merge Data").clicked() {
            match parse_data(&state.data) {
                Ok(map) => {
                    state.data_error = None;
                    action = PropertiesAction::MergeData(map);
                }
                Err(e) => state.data_error = Some(e),
            }
        }
        if ui.button("🗑 Delete").clicked() {
            action = PropertiesAction::Delete;
        }
    });
    if let Some(error) = &state.data_error {
        ui.colored_label(egui::Color32::LIGHT_RED, error);
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_requires_object() {
        assert_eq!(parse_data(r#"{"a": 1}"#).unwrap()["a"], Value::from(1));
        assert!(parse_data("[1, 2]").is_err());
        assert!(parse_data("{").is_err());
    }
}
