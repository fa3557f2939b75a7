// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The annotation engine.
//!
//! [`AnnotationEngine`] owns the shape collection, its undo/redo history and
//! all interaction state for one video overlay. Hosts feed it pointer,
//! keyboard, playback-time and resize events and read back the shapes to
//! render. Everything runs synchronously on the host's event loop.

pub mod draw;
pub mod events;
pub mod history;
pub mod selection;
pub mod visibility;

use std::collections::HashSet;
use std::time::Instant;

use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::io::serialization::{self, ShapeRecord};
use crate::models::shape::{Point, Shape, ShapeId, ShapeKind, ViewportSize};
use crate::util::geometry::RenderGeometry;

use self::draw::{DrawContext, DrawSession, Tool};
use self::events::{HostEvent, Shortcut};
use self::history::History;
use self::selection::{NodeTransform, SelectionController};

/// Pick radius for [`AnnotationEngine::hit_test`], in pixels.
pub const HIT_TOLERANCE: f64 = 4.0;

/// Called with the new selection whenever it changes.
pub type SelectionCallback = Box<dyn FnMut(Option<&Shape>)>;
/// Called with `true` when a resize starts and `false` when it ends.
pub type ResizingCallback = Box<dyn FnMut(bool)>;

/// A shape ready to paint at the current viewport size.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedShape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    pub color: String,
    pub label: String,
    pub stroke_width: f64,
    pub opacity: f64,
    pub selected: bool,
    /// Still being drawn.
    pub candidate: bool,
    pub geometry: RenderGeometry,
}

impl RenderedShape {
    fn new(shape: &Shape, viewport: ViewportSize, selected: bool, candidate: bool) -> Self {
        Self {
            id: shape.id().clone(),
            kind: shape.kind(),
            color: shape.color.clone(),
            label: shape.label.clone(),
            stroke_width: shape.stroke_width,
            opacity: shape.opacity,
            selected,
            candidate,
            geometry: shape.rendered(viewport),
        }
    }
}

fn check_unique(shapes: &[Shape]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for shape in shapes {
        if !seen.insert(shape.id()) {
            return Err(EngineError::DuplicateId(shape.id().clone()));
        }
    }
    Ok(())
}

/// Annotation engine for one video overlay.
pub struct AnnotationEngine {
    config: EngineConfig,
    shapes: Vec<Shape>,
    history: History,
    draw: DrawSession,
    selection: SelectionController,
    viewport: ViewportSize,
    current_time: f64,
    playing: bool,
    fullscreen: bool,
    mounted: bool,
    on_selection_change: Option<SelectionCallback>,
    on_resizing: Option<ResizingCallback>,
}

impl AnnotationEngine {
    /// Create an engine seeded with `config.initial_data`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let shapes = serialization::shapes_from_records(config.initial_data.clone())?;
        check_unique(&shapes)?;
        log::info!("Annotation engine created with {} shapes", shapes.len());

        Ok(Self {
            history: History::new(config.history_limit),
            draw: DrawSession::new(config.pointer_move_interval()),
            selection: SelectionController::default(),
            viewport: config.viewport,
            current_time: 0.0,
            playing: false,
            fullscreen: false,
            mounted: false,
            on_selection_change: None,
            on_resizing: None,
            shapes,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle and host callbacks
    // ------------------------------------------------------------------

    /// Start receiving host events.
    pub fn mount(&mut self) {
        self.mounted = true;
    }

    /// Stop receiving host events. In-flight gestures are abandoned.
    pub fn unmount(&mut self) {
        self.abort_interaction();
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn on_selection_change(&mut self, callback: impl FnMut(Option<&Shape>) + 'static) {
        self.on_selection_change = Some(Box::new(callback));
    }

    pub fn on_resizing(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_resizing = Some(Box::new(callback));
    }

    /// Dispatch a host event. Returns `false` when the engine is not mounted
    /// or the event maps to nothing.
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        if !self.mounted {
            log::debug!("Dropping {:?}: engine not mounted", event);
            return false;
        }
        match event {
            HostEvent::Key(press) => match Shortcut::from_key(press) {
                Some(Shortcut::Undo) => self.undo(),
                Some(Shortcut::Redo) => self.redo(),
                Some(Shortcut::Delete) => self.delete_shape(),
                Some(Shortcut::CancelDraw) => self.cancel_draw(),
                None => false,
            },
            HostEvent::FullscreenChanged(fullscreen) => {
                self.set_fullscreen(fullscreen);
                true
            }
            HostEvent::Resized(size) => {
                self.set_viewport(size);
                true
            }
            HostEvent::TimeUpdate(t) => {
                self.set_current_time(t);
                true
            }
            HostEvent::PlaybackChanged { playing } => {
                self.set_playing(playing);
                true
            }
            HostEvent::FocusLost => {
                self.abort_interaction();
                true
            }
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// The current shape collection, in z-order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// The collection in interchange form.
    pub fn records(&self) -> Vec<ShapeRecord> {
        serialization::records_from_shapes(&self.shapes)
    }

    pub fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id() == id)
    }

    pub fn selected_id(&self) -> Option<&ShapeId> {
        self.selection.selected()
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selection.selected().and_then(|id| self.shape(id))
    }

    /// The shape being drawn, if a draw session is active.
    pub fn candidate(&self) -> Option<&Shape> {
        self.draw.candidate()
    }

    pub fn last_drag_position(&self) -> Option<Point> {
        self.selection.last_drag_position()
    }

    pub fn visible_shapes(&self) -> Vec<&Shape> {
        visibility::visible_shapes(&self.shapes, self.current_time).collect()
    }

    /// Shapes to paint now: visible shapes in z-order, then the candidate.
    /// Empty while annotations are hidden.
    pub fn render_list(&self) -> Vec<RenderedShape> {
        if self.config.hide_annotations {
            return Vec::new();
        }
        let selected = self.selection.selected();
        let mut list: Vec<RenderedShape> = visibility::visible_shapes(&self.shapes, self.current_time)
            .map(|shape| RenderedShape::new(shape, self.viewport, Some(shape.id()) == selected, false))
            .collect();
        if let Some(candidate) = self.draw.candidate() {
            list.push(RenderedShape::new(candidate, self.viewport, false, true));
        }
        list
    }

    /// Topmost visible shape under `point`.
    pub fn hit_test(&self, point: Point) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .filter(|shape| shape.is_visible_at(self.current_time))
            .find(|shape| shape.contains(point, self.viewport, HIT_TOLERANCE))
            .map(|shape| shape.id().clone())
    }

    pub fn tool(&self) -> Tool {
        self.config.tool()
    }

    pub fn video_url(&self) -> &str {
        &self.config.video_url
    }

    pub fn annotation_color(&self) -> &str {
        &self.config.annotation_color
    }

    pub fn stroke_width(&self) -> f64 {
        self.config.stroke_width
    }

    pub fn opacity(&self) -> f64 {
        self.config.opacity
    }

    pub fn is_locked(&self) -> bool {
        self.config.lock_edit
    }

    pub fn annotations_hidden(&self) -> bool {
        self.config.hide_annotations
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_drawing(&self) -> bool {
        self.draw.is_drawing()
    }

    pub fn is_dragging(&self) -> bool {
        self.selection.is_dragging()
    }

    pub fn is_transforming(&self) -> bool {
        self.selection.is_transforming()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ------------------------------------------------------------------
    // Options and host state
    // ------------------------------------------------------------------

    pub fn set_tool(&mut self, tool: Tool) {
        self.config.selected_shape_tool = Some(tool);
    }

    pub fn set_lock_edit(&mut self, locked: bool) {
        self.config.lock_edit = locked;
        if locked {
            self.abort_interaction();
        }
        self.enforce_selection();
    }

    pub fn set_hide_annotations(&mut self, hidden: bool) {
        self.config.hide_annotations = hidden;
    }

    pub fn set_annotation_color(&mut self, color: impl Into<String>) {
        self.config.annotation_color = color.into();
    }

    pub fn set_stroke_width(&mut self, stroke_width: f64) {
        self.config.stroke_width = stroke_width;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.config.opacity = opacity;
    }

    /// Record the render surface size. Stored geometry is not touched.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        if viewport != self.viewport {
            log::debug!("Viewport resized to {}x{}", viewport.width, viewport.height);
            self.viewport = viewport;
        }
    }

    pub fn set_current_time(&mut self, t: f64) {
        self.current_time = t;
        self.enforce_selection();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.enforce_selection();
    }

    /// Fullscreen makes the overlay read-only.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        if fullscreen && self.draw.cancel().is_some() {
            log::debug!("Draw session dropped on entering fullscreen");
        }
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn can_edit(&self) -> bool {
        !self.config.lock_edit && !self.fullscreen
    }

    /// Pointer pressed on the stage. Starts a draw session when a drawing
    /// tool is active and editing is allowed.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        if !self.can_edit() || self.selection.is_transforming() || self.selection.is_dragging() {
            log::debug!("Pointer-down ignored: editing unavailable");
            return false;
        }
        let ctx = DrawContext {
            time: self.current_time,
            viewport: self.viewport,
            color: self.config.annotation_color.clone(),
            stroke_width: self.config.stroke_width,
            opacity: self.config.opacity,
        };
        self.draw.begin(self.config.tool(), at, &ctx)
    }

    pub fn pointer_move(&mut self, at: Point) -> bool {
        self.pointer_move_at(at, Instant::now())
    }

    /// Pointer moved at `now`. Rate limited while drawing.
    pub fn pointer_move_at(&mut self, at: Point, now: Instant) -> bool {
        if !self.can_edit() {
            return false;
        }
        self.draw.update(at, now)
    }

    /// Pointer released. Completes the draw session and returns the id of
    /// the new shape, which becomes selected.
    pub fn pointer_up(&mut self, at: Point) -> Option<ShapeId> {
        if !self.draw.is_drawing() {
            return None;
        }
        if !self.can_edit() {
            self.draw.cancel();
            return None;
        }
        let candidate = self.draw.finish(Some(at))?;
        let id = candidate.id().clone();
        let kind = candidate.kind();
        self.history.commit(&mut self.shapes, |shapes| shapes.push(candidate));
        log::info!("Added {} {}, total: {}", kind, id, self.shapes.len());
        self.set_selection(Some(id.clone()));
        self.enforce_selection();
        Some(id)
    }

    /// Discard the in-progress shape.
    pub fn cancel_draw(&mut self) -> bool {
        match self.draw.cancel() {
            Some(candidate) => {
                log::debug!("Cancelled drawing {}", candidate.id());
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    fn can_select(&self) -> bool {
        self.can_edit() && !self.config.tool().is_drawing()
    }

    /// Shape clicked. Returns `true` when the click selected the shape and
    /// must not reach the stage handler.
    pub fn click_shape(&mut self, id: &ShapeId) -> bool {
        if !self.can_select() || !visibility::is_visible(&self.shapes, id, self.current_time) {
            return false;
        }
        self.set_selection(Some(id.clone()));
        self.enforce_selection();
        true
    }

    /// Empty stage area clicked: clear the selection.
    pub fn click_stage(&mut self) {
        if self.fullscreen {
            return;
        }
        self.set_selection(None);
    }

    // ------------------------------------------------------------------
    // Drag and transform
    // ------------------------------------------------------------------

    pub fn drag_start(&mut self, id: &ShapeId) -> bool {
        if !self.can_select() || self.selection.is_transforming() || self.selection.is_dragging() {
            return false;
        }
        self.selection.begin_drag(id, &self.shapes, &mut self.history)
    }

    /// Clamp a proposed origin for the dragged shape. Returns the position
    /// the host should show.
    pub fn drag_move(&mut self, proposed: Point) -> Option<Point> {
        self.selection.drag_to(proposed, &self.shapes, self.viewport)
    }

    pub fn drag_end(&mut self) -> bool {
        self.selection.end_drag(&mut self.shapes, self.viewport).is_some()
    }

    pub fn transform_start(&mut self, id: &ShapeId) -> bool {
        if self.config.lock_edit || self.selection.is_transforming() || self.selection.is_dragging() {
            return false;
        }
        if !self.selection.begin_transform(id, &self.shapes, &mut self.history) {
            return false;
        }
        self.notify_resizing(true);
        true
    }

    /// Finish a resize. Returns whether the shape was written; commits are
    /// suppressed in fullscreen.
    pub fn transform_end(&mut self, node: &mut NodeTransform) -> bool {
        if !self.selection.is_transforming() {
            return false;
        }
        self.notify_resizing(false);
        let commit = self.can_edit();
        self.selection
            .end_transform(node, &mut self.shapes, self.viewport, commit)
            .is_some()
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Restore the previous collection. An in-flight drag or resize is
    /// dropped first so it cannot write over the restored state.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.abort_interaction();
        if !self.history.undo(&mut self.shapes) {
            return false;
        }
        log::info!("Undo, total: {}", self.shapes.len());
        self.enforce_selection();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.abort_interaction();
        if !self.history.redo(&mut self.shapes) {
            return false;
        }
        log::info!("Redo, total: {}", self.shapes.len());
        self.enforce_selection();
        true
    }

    /// Delete the selected shape. Undoable.
    pub fn delete_shape(&mut self) -> bool {
        if self.config.lock_edit {
            return false;
        }
        let removed = self.selection.delete_selected(&mut self.shapes, &mut self.history);
        if removed.is_some() {
            self.notify_selection();
        }
        removed.is_some()
    }

    /// Merge `data` into the selected shape's payload.
    pub fn set_selected_annotation_data(&mut self, data: Map<String, Value>) -> Result<(), EngineError> {
        let id = self.selection.selected().cloned().ok_or(EngineError::NoSelection)?;
        self.history.commit(&mut self.shapes, |shapes| {
            if let Some(shape) = shapes.iter_mut().find(|shape| shape.id() == &id) {
                shape.data.extend(data);
            }
        });
        log::info!("Updated data of {}", id);
        Ok(())
    }

    pub fn get_selected_annotation_data(&self) -> Result<&Map<String, Value>, EngineError> {
        self.selected_shape()
            .map(|shape| &shape.data)
            .ok_or(EngineError::NoSelection)
    }

    /// Rename the selected shape. Undoable.
    pub fn set_selected_label(&mut self, label: impl Into<String>) -> Result<(), EngineError> {
        let id = self.selection.selected().cloned().ok_or(EngineError::NoSelection)?;
        let label = label.into();
        self.history.commit(&mut self.shapes, |shapes| {
            if let Some(shape) = shapes.iter_mut().find(|shape| shape.id() == &id) {
                shape.label = label;
            }
        });
        Ok(())
    }

    /// Replace the whole collection, starting a fresh history.
    pub fn replace_shapes(&mut self, shapes: Vec<Shape>) -> Result<(), EngineError> {
        check_unique(&shapes)?;
        self.abort_interaction();
        self.shapes = shapes;
        self.history.clear();
        self.enforce_selection();
        log::info!("Loaded {} shapes", self.shapes.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn set_selection(&mut self, id: Option<ShapeId>) {
        if self.selection.select(id) {
            self.notify_selection();
        }
    }

    fn enforce_selection(&mut self) {
        let transforming = self.selection.is_transforming();
        if self
            .selection
            .enforce(&self.shapes, self.current_time, self.playing, self.config.lock_edit)
        {
            if transforming {
                self.notify_resizing(false);
            }
            self.notify_selection();
        }
    }

    fn abort_interaction(&mut self) {
        self.draw.cancel();
        if self.selection.is_transforming() {
            self.notify_resizing(false);
        }
        self.selection.abort_gestures();
    }

    fn notify_selection(&mut self) {
        if let Some(callback) = self.on_selection_change.as_mut() {
            let selected = self
                .selection
                .selected()
                .and_then(|id| self.shapes.iter().find(|shape| shape.id() == id));
            callback(selected);
        }
    }

    fn notify_resizing(&mut self, resizing: bool) {
        if let Some(callback) = self.on_resizing.as_mut() {
            callback(resizing);
        }
    }
}
