// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `VaoApp` is a reference host for the annotation engine: it mounts the
//! engine, forwards window, keyboard and playback events to it, and applies
//! the gestures recognised by the canvas.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

use vao::io::media::{self, LoadedFrame, FRAME_EXTENSIONS};
use vao::io::serialization;
use vao::{AnnotationEngine, EngineConfig, HostEvent, Key, KeyPress};

use crate::ui::canvas::{self, CanvasAction, CanvasState};
use crate::ui::properties::{self, PropertiesAction, PropertiesState};
use crate::ui::timeline::{self, PlaybackClock};
use crate::ui::toolbar::{self, ToolSettings};

/// Keys forwarded to the engine.
const ENGINE_KEYS: [(egui::Key, Key); 5] = [
    (egui::Key::Z, Key::Z),
    (egui::Key::Y, Key::Y),
    (egui::Key::Delete, Key::Delete),
    (egui::Key::Backspace, Key::Backspace),
    (egui::Key::Escape, Key::Escape),
];

/// Main application state.
pub struct VaoApp {
    engine: AnnotationEngine,

    /// Backdrop texture and its aspect ratio
    backdrop: Option<(egui::TextureHandle, f32)>,

    /// Receiver for background frame loading
    frame_loader: Option<Receiver<Result<LoadedFrame, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    clock: PlaybackClock,
    canvas: CanvasState,
    properties: PropertiesState,

    /// Last state forwarded to the engine
    fullscreen: bool,
    focused: bool,
    playing: bool,

    /// Latest message for the status bar
    status: Rc<RefCell<String>>,
    resizing: Rc<RefCell<bool>>,
}

impl VaoApp {
    /// Create the app around a configured engine.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let video_url = config.video_url.clone();
        let mut engine = AnnotationEngine::new(config)?;

        let status = Rc::new(RefCell::new(String::from("Ready")));
        let sink = Rc::clone(&status);
        engine.on_selection_change(move |shape| {
            *sink.borrow_mut() = match shape {
                Some(shape) => format!("Selected {} {}", shape.kind(), shape.id()),
                None => String::from("Nothing selected"),
            };
        });
        let resizing = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&resizing);
        engine.on_resizing(move |active| *flag.borrow_mut() = active);
        engine.mount();

        let mut clock = PlaybackClock::default();
        if let Some(end) = engine.shapes().iter().map(|s| s.time_window.end()).reduce(f64::max) {
            clock.extend_to(end);
        }
        if !video_url.is_empty() {
            log::info!("Video source: {}", video_url);
        }

        Ok(Self {
            engine,
            backdrop: None,
            frame_loader: None,
            loading_message: None,
            clock,
            canvas: CanvasState::default(),
            properties: PropertiesState::default(),
            fullscreen: false,
            focused: true,
            playing: false,
            status,
            resizing,
        })
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = message.into();
    }

    /// Load a backdrop frame (asynchronously).
    fn load_frame_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.frame_loader = Some(receiver);
        self.loading_message = Some("Loading frame...".to_string());

        std::thread::spawn(move || {
            let result = media::load_frame(&path).map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Replace all annotations with the contents of a file.
    fn import_annotations(&mut self, path: PathBuf) {
        let result = serialization::import_records(&path).and_then(|records| {
            let shapes = serialization::shapes_from_records(records)?;
            Ok(shapes)
        });
        match result.map(|shapes| {
            let end = shapes.iter().map(|s| s.time_window.end()).reduce(f64::max);
            (self.engine.replace_shapes(shapes), end)
        }) {
            Ok((Ok(()), end)) => {
                if let Some(end) = end {
                    self.clock.extend_to(end);
                }
                self.set_status(format!("Loaded {} annotations", self.engine.shapes().len()));
            }
            Ok((Err(e), _)) => {
                log::error!("Failed to load annotations: {}", e);
                self.set_status(format!("Load failed: {}", e));
            }
            Err(e) => {
                log::error!("Failed to load annotations: {:#}", e);
                self.set_status(format!("Load failed: {}", e));
            }
        }
    }

    /// Export annotations to a file.
    fn export_annotations(&self, path: PathBuf) {
        let extension = path.extension().and_then(|s| s.to_str());
        let encoded = match extension {
            Some("yaml") | Some("yml") => serialization::to_yaml(self.engine.shapes()),
            Some("json") => serialization::to_json(self.engine.shapes()),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };
        match encoded.and_then(|text| Ok(std::fs::write(&path, text)?)) {
            Ok(()) => {
                log::info!("Exported annotations to {}", path.display());
                self.set_status(format!("Exported to {}", path.display()));
            }
            Err(e) => log::error!("Failed to export annotations: {:#}", e),
        }
    }

    fn copy_json(&self, ctx: &egui::Context) {
        match serialization::to_json(self.engine.shapes()) {
            Ok(json) => {
                ctx.output_mut(|o| o.copied_text = json);
                self.set_status("Copied annotations as JSON");
            }
            Err(e) => log::error!("Failed to encode annotations: {:#}", e),
        }
    }

    /// Forward window and playback state changes to the engine.
    fn sync_host_state(&mut self, ctx: &egui::Context) {
        let (fullscreen, focused) = ctx.input(|i| {
            let viewport = i.viewport();
            (viewport.fullscreen.unwrap_or(false), viewport.focused.unwrap_or(true))
        });
        if fullscreen != self.fullscreen {
            self.fullscreen = fullscreen;
            self.engine.handle_event(HostEvent::FullscreenChanged(fullscreen));
        }
        if focused != self.focused {
            self.focused = focused;
            if !focused {
                self.engine.handle_event(HostEvent::FocusLost);
            }
        }

        let position = self.clock.tick(Instant::now());
        if self.clock.is_playing() != self.playing {
            self.playing = self.clock.is_playing();
            self.engine.handle_event(HostEvent::PlaybackChanged { playing: self.playing });
        }
        if position != self.engine.current_time() {
            self.engine.handle_event(HostEvent::TimeUpdate(position));
        }
        if self.playing {
            ctx.request_repaint();
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::F11)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!self.fullscreen));
        }
        // Leave editing keys to a focused text field.
        if ctx.wants_keyboard_input() {
            return;
        }
        let presses: Vec<KeyPress> = ctx.input(|i| {
            ENGINE_KEYS
                .iter()
                .filter(|(egui_key, _)| i.key_pressed(*egui_key))
                .map(|(_, key)| KeyPress {
                    key: *key,
                    command: i.modifiers.command,
                    shift: i.modifiers.shift,
                })
                .collect()
        });
        for press in presses {
            self.engine.handle_event(HostEvent::Key(press));
        }
    }

    fn apply_canvas_action(&mut self, action: CanvasAction) {
        match action {
            CanvasAction::PointerDown(at) => {
                self.engine.pointer_down(at);
            }
            CanvasAction::PointerMove(at) => {
                self.engine.pointer_move(at);
            }
            CanvasAction::PointerUp(at) => {
                if let Some(id) = self.engine.pointer_up(at) {
                    self.set_status(format!("Added {}", id));
                }
            }
            CanvasAction::ClickShape(id) => {
                self.engine.click_shape(&id);
            }
            CanvasAction::ClickStage => self.engine.click_stage(),
            CanvasAction::DragStart(id) => {
                self.engine.drag_start(&id);
            }
            CanvasAction::DragMove(to) => {
                self.engine.drag_move(to);
            }
            CanvasAction::DragEnd => {
                self.engine.drag_end();
            }
            CanvasAction::TransformStart(id) => {
                self.engine.transform_start(&id);
            }
            CanvasAction::TransformEnd(mut node) => {
                self.engine.transform_end(&mut node);
            }
        }
    }

    fn apply_properties_action(&mut self, action: PropertiesAction) {
        let result = match action {
            PropertiesAction::None => Ok(()),
            PropertiesAction::Select(id, start) => {
                self.clock.set_playing(false);
                self.clock.seek(start);
                self.engine.set_playing(false);
                self.playing = false;
                self.engine.set_current_time(self.clock.position());
                self.engine.click_shape(&id);
                Ok(())
            }
            PropertiesAction::Rename(label) => self.engine.set_selected_label(label),
            PropertiesAction::MergeData(data) => self.engine.set_selected_annotation_data(data),
            PropertiesAction::Delete => {
                self.engine.delete_shape();
                Ok(())
            }
        };
        if let Err(e) = result {
            log::warn!("Properties edit rejected: {}", e);
            self.set_status(e.to_string());
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Backdrop Frame...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Images", FRAME_EXTENSIONS)
                            .pick_file()
                        {
                            self.load_frame_file(path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Load Annotations...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Annotations", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_annotations(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.menu_button("Export Annotations", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("annotations.yaml")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                    });
                    if ui.button("Copy as JSON").clicked() {
                        self.copy_json(ui.ctx());
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.engine.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.engine.undo();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.engine.can_redo(), egui::Button::new("Redo (Ctrl+Y)"))
                        .clicked()
                    {
                        self.engine.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_selection = self.engine.selected_id().is_some();
                    if ui
                        .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                        .clicked()
                    {
                        self.engine.delete_shape();
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Toggle Fullscreen (F11)").clicked() {
                        ui.ctx()
                            .send_viewport_cmd(egui::ViewportCommand::Fullscreen(!self.fullscreen));
                        ui.close_menu();
                    }
                });
            });
        });
    }
}

impl eframe::App for VaoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed frame loading
        if let Some(ref receiver) = self.frame_loader {
            if let Ok(result) = receiver.try_recv() {
                self.frame_loader = None;
                self.loading_message = None;

                match result {
                    Ok(frame) => {
                        let size = [frame.width as usize, frame.height as usize];
                        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.pixels);
                        let texture = ctx.load_texture("backdrop", image, egui::TextureOptions::LINEAR);
                        self.backdrop = Some((texture, frame.aspect_ratio()));
                    }
                    Err(e) => {
                        log::error!("Failed to load frame: {}", e);
                        self.set_status(format!("Failed to load frame: {}", e));
                    }
                }
            }
        }
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        self.sync_host_state(ctx);
        self.handle_keys(ctx);

        if !self.fullscreen {
            self.menu_bar(ctx);

            let mut settings = ToolSettings::from_engine(&self.engine);
            egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
                toolbar::show(ui, &mut settings);
            });
            settings.apply(&mut self.engine);

            let action = egui::SidePanel::right("properties")
                .default_width(260.0)
                .show(ctx, |ui| properties::show(ui, &self.engine, &mut self.properties))
                .inner;
            self.apply_properties_action(action);
        }

        egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| {
            timeline::show(ui, &mut self.clock);
            ui.horizontal(|ui| {
                ui.label(format!("Tool: {:?}", self.engine.tool()));
                ui.separator();
                ui.label(format!("{} annotations", self.engine.shapes().len()));
                ui.separator();
                if self.engine.is_locked() {
                    ui.label("Locked");
                    ui.separator();
                }
                if *self.resizing.borrow() {
                    ui.label("Resizing");
                    ui.separator();
                }
                ui.label(self.status.borrow().as_str());
            });
        });

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                        ui.label(message);
                    });
                    Vec::new()
                } else {
                    let backdrop = self.backdrop.as_ref().map(|(texture, aspect)| (texture, *aspect));
                    canvas::show(ui, &mut self.engine, &mut self.canvas, backdrop)
                }
            })
            .inner;
        for action in actions {
            self.apply_canvas_action(action);
        }
    }
}
