// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! Tool, colour and stroke pickers plus the lock and hide toggles. The panel
//! edits a [`ToolSettings`] snapshot; the app applies whatever changed.

use vao::{AnnotationEngine, Tool};

/// Colours offered as swatches.
pub const PALETTE: &[&str] = &["red", "orange", "yellow", "green", "cyan", "blue", "magenta", "white"];

/// The engine options the toolbar can change.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: String,
    pub stroke_width: f64,
    pub opacity: f64,
    pub locked: bool,
    pub hidden: bool,
}

impl ToolSettings {
    pub fn from_engine(engine: &AnnotationEngine) -> Self {
        Self {
            tool: engine.tool(),
            color: engine.annotation_color().to_string(),
            stroke_width: engine.stroke_width(),
            opacity: engine.opacity(),
            locked: engine.is_locked(),
            hidden: engine.annotations_hidden(),
        }
    }

    /// Push changed options into the engine.
    pub fn apply(&self, engine: &mut AnnotationEngine) {
        if self.tool != engine.tool() {
            log::debug!("Tool changed to {:?}", self.tool);
            engine.set_tool(self.tool);
        }
        if self.color != engine.annotation_color() {
            engine.set_annotation_color(self.color.clone());
        }
        if self.stroke_width != engine.stroke_width() {
            engine.set_stroke_width(self.stroke_width);
        }
        if self.opacity != engine.opacity() {
            engine.set_opacity(self.opacity);
        }
        if self.locked != engine.is_locked() {
            engine.set_lock_edit(self.locked);
        }
        if self.hidden != engine.annotations_hidden() {
            engine.set_hide_annotations(self.hidden);
        }
    }
}

/// Display the toolbar.
pub fn show(ui: &mut egui::Ui, settings: &mut ToolSettings) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");
        ui.separator();

        for (tool, text) in [
            (Tool::Select, "⬆ Select"),
            (Tool::Rectangle, "▭ Rectangle"),
            (Tool::Circle, "○ Circle"),
            (Tool::Polyline, "⟋ Line"),
        ] {
            let button = ui.add_enabled(
                !settings.locked || tool == Tool::Select,
                egui::SelectableLabel::new(settings.tool == tool, text),
            );
            if button.clicked() {
                settings.tool = tool;
            }
        }

        ui.separator();

        for name in PALETTE {
            let color = super::canvas::parse_color(name);
            let (rect, response) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::click());
            let outline = if settings.color == *name {
                egui::Stroke::new(2.0, egui::Color32::WHITE)
            } else {
                egui::Stroke::new(1.0, egui::Color32::from_gray(80))
            };
            ui.painter().rect_filled(rect, 2.0, color);
            ui.painter().rect_stroke(rect, 2.0, outline);
            if response.on_hover_text(*name).clicked() {
                settings.color = name.to_string();
            }
        }

        ui.separator();

        ui.add(
            egui::DragValue::new(&mut settings.stroke_width)
                .range(1.0..=20.0)
                .speed(0.1)
                .prefix("stroke "),
        );
        ui.add(
            egui::DragValue::new(&mut settings.opacity)
                .range(0.1..=1.0)
                .speed(0.01)
                .prefix("opacity "),
        );

        ui.separator();

        ui.checkbox(&mut settings.locked, "🔒 Lock");
        ui.checkbox(&mut settings.hidden, "Hide");

        ui.separator();

        let tool_text = match settings.tool {
            _ if settings.locked => "Editing is locked",
            Tool::Select => "Click to select, drag to move, drag the corner handle to resize",
            Tool::Rectangle | Tool::Circle => "Press and drag to draw",
            Tool::Polyline => "Press and drag to draw a line",
        };
        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}
