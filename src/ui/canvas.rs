// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay canvas.
//!
//! Paints the backdrop and the engine's render list, and turns egui pointer
//! input into engine gestures. Positions handed to the engine are in canvas
//! pixels with the origin at the top-left corner of the overlay.

use vao::util::geometry::{Bounds, RenderGeometry};
use vao::{AnnotationEngine, HostEvent, NodeTransform, Point, RenderedShape, ShapeId, ViewportSize};

/// Side of the resize handle, in points.
const HANDLE_SIZE: f32 = 9.0;
/// Segments sampled per span of a tensioned polyline.
const SPLINE_STEPS: usize = 12;
/// Smallest scale a resize can reach.
const MIN_SCALE: f64 = 0.05;

/// Result of canvas interaction, applied by the app in order.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    ClickShape(ShapeId),
    ClickStage,
    DragStart(ShapeId),
    DragMove(Point),
    DragEnd,
    TransformStart(ShapeId),
    TransformEnd(NodeTransform),
}

#[derive(Debug, Clone)]
enum PointerMode {
    Drawing,
    Moving { grab: Point },
}

#[derive(Debug, Clone)]
struct TransformPreview {
    id: ShapeId,
    origin: Point,
    bounds: Bounds,
    scale_x: f64,
    scale_y: f64,
}

/// Gesture state that spans frames.
#[derive(Debug, Clone, Default)]
pub struct CanvasState {
    mode: Option<PointerMode>,
    transform: Option<TransformPreview>,
}

/// Parse a CSS-style colour: a handful of names, `#rgb` or `#rrggbb`.
/// Unknown strings fall back to red.
pub fn parse_color(value: &str) -> egui::Color32 {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#').filter(|hex| hex.is_ascii()) {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let rgb = match hex.len() {
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|c| c * 17);
                (expand(0), expand(1), expand(2))
            }
            6 => (channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => (None, None, None),
        };
        if let (Some(r), Some(g), Some(b)) = rgb {
            return egui::Color32::from_rgb(r, g, b);
        }
    }
    match value.to_ascii_lowercase().as_str() {
        "black" => egui::Color32::BLACK,
        "white" => egui::Color32::WHITE,
        "green" => egui::Color32::from_rgb(0, 128, 0),
        "lime" => egui::Color32::from_rgb(0, 255, 0),
        "blue" => egui::Color32::from_rgb(0, 0, 255),
        "yellow" => egui::Color32::from_rgb(255, 255, 0),
        "orange" => egui::Color32::from_rgb(255, 165, 0),
        "cyan" => egui::Color32::from_rgb(0, 255, 255),
        "magenta" => egui::Color32::from_rgb(255, 0, 255),
        "purple" => egui::Color32::from_rgb(128, 0, 128),
        "gray" | "grey" => egui::Color32::GRAY,
        _ => egui::Color32::from_rgb(255, 0, 0),
    }
}

/// Fit a frame of `aspect` inside `available`, centred.
fn fit_rect(available: egui::Rect, aspect: Option<f32>) -> egui::Rect {
    let Some(aspect) = aspect else {
        return available;
    };
    let size = available.size();
    let (width, height) = if aspect > size.x / size.y {
        (size.x, size.x / aspect)
    } else {
        (size.y * aspect, size.y)
    };
    egui::Rect::from_center_size(available.center(), egui::vec2(width, height))
}

fn scaled(geometry: &RenderGeometry, scale_x: f64, scale_y: f64) -> RenderGeometry {
    match geometry.clone() {
        RenderGeometry::Rectangle { x, y, width, height } => RenderGeometry::Rectangle {
            x,
            y,
            width: width * scale_x,
            height: height * scale_y,
        },
        RenderGeometry::Circle { x, y, radius } => RenderGeometry::Circle {
            x,
            y,
            radius: radius * scale_x,
        },
        RenderGeometry::Polyline { x, y, points, tension } => RenderGeometry::Polyline {
            x,
            y,
            points: points
                .iter()
                .enumerate()
                .map(|(i, p)| if i % 2 == 0 { p * scale_x } else { p * scale_y })
                .collect(),
            tension,
        },
    }
}

fn moved(geometry: &RenderGeometry, to: Point) -> RenderGeometry {
    let mut geometry = geometry.clone();
    match &mut geometry {
        RenderGeometry::Rectangle { x, y, .. }
        | RenderGeometry::Circle { x, y, .. }
        | RenderGeometry::Polyline { x, y, .. } => {
            *x = to.x;
            *y = to.y;
        }
    }
    geometry
}

/// Cardinal spline through `points`, sampled into straight segments.
fn spline(points: &[egui::Pos2], tension: f32) -> Vec<egui::Pos2> {
    if points.len() < 3 || tension <= 0.0 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity((points.len() - 1) * SPLINE_STEPS + 1);
    for i in 0..points.len() - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(points.len() - 1)];
        let m1 = (p2 - p0) * tension;
        let m2 = (p3 - p1) * tension;
        for step in 0..SPLINE_STEPS {
            let t = step as f32 / SPLINE_STEPS as f32;
            let (t2, t3) = (t * t, t * t * t);
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            out.push(egui::pos2(
                h00 * p1.x + h10 * m1.x + h01 * p2.x + h11 * m2.x,
                h00 * p1.y + h10 * m1.y + h01 * p2.y + h11 * m2.y,
            ));
        }
    }
    if let Some(last) = points.last() {
        out.push(*last);
    }
    out
}

fn paint_geometry(painter: &egui::Painter, min: egui::Pos2, geometry: &RenderGeometry, stroke: egui::Stroke) {
    let at = |x: f64, y: f64| min + egui::vec2(x as f32, y as f32);
    match geometry {
        RenderGeometry::Rectangle { x, y, width, height } => {
            let rect = egui::Rect::from_two_pos(at(*x, *y), at(x + width, y + height));
            painter.rect_stroke(rect, 0.0, stroke);
        }
        RenderGeometry::Circle { x, y, radius } => {
            painter.circle_stroke(at(*x, *y), *radius as f32, stroke);
        }
        RenderGeometry::Polyline { x, y, points, tension } => {
            let vertices: Vec<egui::Pos2> = points
                .chunks_exact(2)
                .map(|pair| at(x + pair[0], y + pair[1]))
                .collect();
            let path = spline(&vertices, *tension as f32);
            if path.len() >= 2 {
                painter.add(egui::Shape::line(path, stroke));
            }
        }
    }
}

fn to_screen(min: egui::Pos2, bounds: &Bounds) -> egui::Rect {
    egui::Rect::from_min_max(
        min + egui::vec2(bounds.min_x as f32, bounds.min_y as f32),
        min + egui::vec2(bounds.max_x as f32, bounds.max_y as f32),
    )
}

/// Display the overlay. Reports its size to the engine and returns the
/// gestures recognised this frame.
pub fn show(
    ui: &mut egui::Ui,
    engine: &mut AnnotationEngine,
    state: &mut CanvasState,
    backdrop: Option<(&egui::TextureHandle, f32)>,
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    let available = ui.available_rect_before_wrap();
    let rect = fit_rect(available, backdrop.map(|(_, aspect)| aspect));
    let viewport = ViewportSize::new(rect.width() as f64, rect.height() as f64);
    if rect.width() > 0.0 && rect.height() > 0.0 {
        engine.handle_event(HostEvent::Resized(viewport));
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(30));
    if let Some((texture, _)) = backdrop {
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    } else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "File → Open Backdrop Frame...",
            egui::FontId::proportional(14.0),
            egui::Color32::from_gray(90),
        );
    }

    let to_local = |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
    let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
    let list = engine.render_list();

    // Resize handle of the selected shape, allocated last so it wins hits.
    let selected = list.iter().find(|shape| shape.selected);
    let mut handle_busy = false;
    if let Some(shape) = selected.filter(|_| engine.tool() == vao::Tool::Select && !engine.is_locked()) {
        let bounds = shape.geometry.bounds();
        let corner = to_screen(rect.min, &bounds).max;
        let handle_rect = egui::Rect::from_center_size(corner, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));
        let handle = ui.interact(handle_rect, ui.id().with("resize_handle"), egui::Sense::drag());
        let origin = shape.geometry.origin();

        if handle.hovered() || handle.dragged() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeNwSe);
        }
        if handle.drag_started() {
            actions.push(CanvasAction::TransformStart(shape.id.clone()));
            state.transform = Some(TransformPreview {
                id: shape.id.clone(),
                origin,
                bounds,
                scale_x: 1.0,
                scale_y: 1.0,
            });
        }
        if let (Some(preview), Some(pos)) = (state.transform.as_mut(), handle.interact_pointer_pos()) {
            let at = to_local(pos);
            let axis = |reach: f64, span: f64| if span.abs() > f64::EPSILON { (reach / span).max(MIN_SCALE) } else { 1.0 };
            preview.scale_x = axis(at.x - preview.origin.x, preview.bounds.max_x - preview.origin.x);
            preview.scale_y = axis(at.y - preview.origin.y, preview.bounds.max_y - preview.origin.y);
        }
        if handle.drag_stopped() {
            if let Some(preview) = state.transform.take() {
                actions.push(CanvasAction::TransformEnd(NodeTransform::new(
                    preview.origin.x,
                    preview.origin.y,
                    preview.scale_x,
                    preview.scale_y,
                )));
            }
        }
        handle_busy = handle.hovered() || handle.dragged() || handle.drag_stopped();
        painter.rect_stroke(to_screen(rect.min, &bounds), 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));
        painter.rect_filled(handle_rect, 1.0, egui::Color32::WHITE);
    }

    for shape in &list {
        paint_shape(&painter, rect.min, shape, engine, state);
    }

    if !handle_busy {
        collect_pointer(ui, &response, engine, state, &to_local, &mut actions);
    }

    actions
}

fn paint_shape(
    painter: &egui::Painter,
    min: egui::Pos2,
    shape: &RenderedShape,
    engine: &AnnotationEngine,
    state: &CanvasState,
) {
    let mut geometry = shape.geometry.clone();
    if shape.selected && engine.is_dragging() {
        if let Some(to) = engine.last_drag_position() {
            geometry = moved(&geometry, to);
        }
    }
    if let Some(preview) = state.transform.as_ref().filter(|p| p.id == shape.id) {
        geometry = scaled(&geometry, preview.scale_x, preview.scale_y);
    }

    let mut color = parse_color(&shape.color).gamma_multiply(shape.opacity.clamp(0.0, 1.0) as f32);
    if shape.candidate {
        color = color.gamma_multiply(0.7);
    }
    paint_geometry(painter, min, &geometry, egui::Stroke::new(shape.stroke_width as f32, color));

    if !shape.label.is_empty() {
        let bounds = geometry.bounds();
        painter.text(
            min + egui::vec2(bounds.min_x as f32, bounds.min_y as f32 - 2.0),
            egui::Align2::LEFT_BOTTOM,
            &shape.label,
            egui::FontId::proportional(12.0),
            color,
        );
    }
}

fn collect_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    engine: &AnnotationEngine,
    state: &mut CanvasState,
    to_local: &dyn Fn(egui::Pos2) -> Point,
    actions: &mut Vec<CanvasAction>,
) {
    let drawing_tool = engine.tool().is_drawing();

    if response.drag_started() {
        if let Some(press) = ui.input(|i| i.pointer.press_origin()) {
            let at = to_local(press);
            if drawing_tool {
                actions.push(CanvasAction::PointerDown(at));
                state.mode = Some(PointerMode::Drawing);
            } else if let Some(id) = engine.hit_test(at) {
                let origin = engine
                    .shape(&id)
                    .map(|shape| shape.rendered(engine.viewport()).origin())
                    .unwrap_or(at);
                actions.push(CanvasAction::ClickShape(id.clone()));
                actions.push(CanvasAction::DragStart(id));
                state.mode = Some(PointerMode::Moving {
                    grab: Point::new(at.x - origin.x, at.y - origin.y),
                });
            }
        }
    }

    if response.dragged() {
        if let Some(at) = response.interact_pointer_pos().map(to_local) {
            match &state.mode {
                Some(PointerMode::Drawing) => actions.push(CanvasAction::PointerMove(at)),
                Some(PointerMode::Moving { grab }) => {
                    actions.push(CanvasAction::DragMove(Point::new(at.x - grab.x, at.y - grab.y)))
                }
                None => {}
            }
        }
    }

    if response.drag_stopped() {
        let last = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|i| i.pointer.latest_pos()))
            .map(to_local);
        match state.mode.take() {
            Some(PointerMode::Drawing) => {
                if let Some(at) = last {
                    actions.push(CanvasAction::PointerUp(at));
                }
            }
            Some(PointerMode::Moving { .. }) => actions.push(CanvasAction::DragEnd),
            None => {}
        }
    }

    if response.clicked() {
        if let Some(at) = response.interact_pointer_pos().map(to_local) {
            if drawing_tool {
                actions.push(CanvasAction::PointerDown(at));
                actions.push(CanvasAction::PointerUp(at));
            } else if let Some(id) = engine.hit_test(at) {
                actions.push(CanvasAction::ClickShape(id));
            } else {
                actions.push(CanvasAction::ClickStage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#00ff00"), egui::Color32::from_rgb(0, 255, 0));
        assert_eq!(parse_color("#f00"), egui::Color32::from_rgb(255, 0, 0));
        assert_eq!(parse_color("Blue"), egui::Color32::from_rgb(0, 0, 255));
        assert_eq!(parse_color("not-a-colour"), egui::Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn test_fit_rect_letterboxes() {
        let available = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(400.0, 400.0));
        let fitted = fit_rect(available, Some(2.0));
        assert_eq!(fitted.size(), egui::vec2(400.0, 200.0));
        assert_eq!(fitted.center(), available.center());
        assert_eq!(fit_rect(available, None), available);
    }

    #[test]
    fn test_spline_passes_through_vertices() {
        let points = [egui::pos2(0.0, 0.0), egui::pos2(10.0, 10.0), egui::pos2(20.0, 0.0)];
        let path = spline(&points, 0.5);
        assert_eq!(path.first(), Some(&points[0]));
        assert_eq!(path.last(), Some(&points[2]));
        assert!(path.contains(&points[1]));
        assert_eq!(spline(&points, 0.0).len(), 3);
    }
}
