//! Canvas rendering: the grid, entities, selection overlay, and alignment
//! guides.
//!
//! Everything is drawn from document mm through the viewport transform, so
//! the painter code never needs to know about zoom or pan directly.

use super::state::FloorplanApp;
use crate::constants::{HANDLE_SIZE_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::guides::GuideAxis;
use crate::manipulate::ResizeHandle;
use crate::types::{EntityKind, Layer, Shape};
use eframe::egui;

/// Rotates `p` about `center` by `angle` radians (y-down, so positive is
/// clockwise on screen).
pub(super) fn rotate_about(center: egui::Pos2, p: egui::Pos2, angle: f32) -> egui::Pos2 {
    let (sin, cos) = angle.sin_cos();
    let v = p - center;
    center + egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Number of segments used to approximate circles and ellipses.
const ELLIPSE_SEGMENTS: usize = 48;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 150, 255);
const GUIDE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 64, 255);
const FURNITURE_FILL: egui::Color32 = egui::Color32::from_rgb(160, 120, 70);
const DRAWING_STROKE: egui::Color32 = egui::Color32::from_rgb(120, 170, 220);

impl FloorplanApp {
    /// Draws the mm grid over the canvas rect. Lines denser than a few
    /// screen pixels are skipped entirely rather than drawn as mush.
    pub(super) fn draw_grid(&self, painter: &egui::Painter, rect: egui::Rect) {
        let vp = &self.canvas.viewport;
        let spacing_px = vp.mm_len_to_screen(self.canvas.grid_size_mm);
        if spacing_px < 4.0 {
            return;
        }
        let stroke = egui::Stroke::new(0.5, egui::Color32::from_gray(if self.dark_mode { 60 } else { 200 }));

        let min_mm = vp.screen_to_document_mm(rect.min, rect.min);
        let max_mm = vp.screen_to_document_mm(rect.max, rect.min);
        let grid = self.canvas.grid_size_mm;

        let mut x = (min_mm.x / grid).floor() * grid;
        while x <= max_mm.x {
            let sx = vp.document_mm_to_screen(egui::pos2(x, 0.0), rect.min).x;
            painter.line_segment(
                [egui::pos2(sx, rect.min.y), egui::pos2(sx, rect.max.y)],
                stroke,
            );
            x += grid;
        }
        let mut y = (min_mm.y / grid).floor() * grid;
        while y <= max_mm.y {
            let sy = vp.document_mm_to_screen(egui::pos2(0.0, y), rect.min).y;
            painter.line_segment(
                [egui::pos2(rect.min.x, sy), egui::pos2(rect.max.x, sy)],
                stroke,
            );
            y += grid;
        }
    }

    /// Draws all entities in stacking order, honoring layer visibility,
    /// opacity, and color overrides.
    pub(super) fn draw_entities(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let model = self.project.model();
        for entity in model.entities_sorted() {
            let Some(layer) = model.layer(entity.layer_id) else {
                continue;
            };
            if !layer.visible {
                continue;
            }
            self.draw_entity(painter, origin, entity, layer);
        }
    }

    fn draw_entity(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        entity: &crate::types::Entity,
        layer: &Layer,
    ) {
        let vp = &self.canvas.viewport;
        let alpha = (layer.opacity as f32 / 100.0 * 255.0) as u8;
        let base = match layer.color {
            Some([r, g, b]) => egui::Color32::from_rgb(r, g, b),
            None => match entity.kind {
                EntityKind::Furniture => FURNITURE_FILL,
                EntityKind::Drawing => DRAWING_STROKE,
            },
        };
        let color = egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha);
        let stroke = egui::Stroke::new(1.5, color);
        let angle = entity.rotation.to_radians();

        match &entity.shape {
            Shape::Rect { .. } => {
                let bounds = entity.shape.bounds();
                let center = bounds.center();
                let points: Vec<egui::Pos2> = [
                    bounds.min,
                    egui::pos2(bounds.max.x, bounds.min.y),
                    bounds.max,
                    egui::pos2(bounds.min.x, bounds.max.y),
                ]
                .into_iter()
                .map(|p| vp.document_mm_to_screen(rotate_about(center, p, angle), origin))
                .collect();
                if entity.kind == EntityKind::Furniture {
                    let fill =
                        egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha / 2);
                    painter.add(egui::Shape::convex_polygon(points, fill, stroke));
                } else {
                    painter.add(egui::Shape::closed_line(points, stroke));
                }
            }
            Shape::Circle { cx, cy, rx, ry } => {
                let center = egui::pos2(*cx, *cy);
                let points: Vec<egui::Pos2> = (0..ELLIPSE_SEGMENTS)
                    .map(|i| {
                        let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                        let p = egui::pos2(cx + rx * t.cos(), cy + ry * t.sin());
                        vp.document_mm_to_screen(rotate_about(center, p, angle), origin)
                    })
                    .collect();
                if entity.kind == EntityKind::Furniture {
                    let fill =
                        egui::Color32::from_rgba_unmultiplied(base.r(), base.g(), base.b(), alpha / 2);
                    painter.add(egui::Shape::convex_polygon(points, fill, stroke));
                } else {
                    painter.add(egui::Shape::closed_line(points, stroke));
                }
            }
            Shape::Line { start, end } => {
                let a = vp.document_mm_to_screen(egui::pos2(start.0, start.1), origin);
                let b = vp.document_mm_to_screen(egui::pos2(end.0, end.1), origin);
                painter.line_segment([a, b], stroke);
            }
            Shape::Path { points } => {
                if points.len() < 2 {
                    return;
                }
                let center = entity.shape.bounds().center();
                let screen: Vec<egui::Pos2> = points
                    .iter()
                    .map(|&(x, y)| {
                        vp.document_mm_to_screen(
                            rotate_about(center, egui::pos2(x, y), angle),
                            origin,
                        )
                    })
                    .collect();
                painter.add(egui::Shape::line(screen, stroke));
            }
            Shape::Text {
                x,
                y,
                content,
                font_size,
            } => {
                let pos = vp.document_mm_to_screen(egui::pos2(*x, *y), origin);
                let px = vp.mm_len_to_screen(*font_size).max(1.0);
                painter.text(
                    pos,
                    egui::Align2::LEFT_TOP,
                    content,
                    egui::FontId::proportional(px),
                    color,
                );
            }
        }
    }

    /// Draws the selection outline, resize handles, and rotate handle for
    /// the current selection.
    pub(super) fn draw_selection_overlay(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let model = self.project.model();
        let vp = &self.canvas.viewport;
        let stroke = egui::Stroke::new(1.5, SELECTION_COLOR);
        let single = model.selection.single();

        for selected in model.selection.iter() {
            let Some(entity) = model.entity(selected.id) else {
                continue;
            };
            let angle = entity.rotation.to_radians();

            if let Shape::Line { start, end } = &entity.shape {
                let a = vp.document_mm_to_screen(egui::pos2(start.0, start.1), origin);
                let b = vp.document_mm_to_screen(egui::pos2(end.0, end.1), origin);
                painter.line_segment([a, b], stroke);
                if single.map(|s| s.id) == Some(entity.id) {
                    for p in [a, b] {
                        painter.circle_filled(p, HANDLE_SIZE_PX / 2.0, SELECTION_COLOR);
                    }
                }
                continue;
            }

            let bounds = entity.shape.bounds();
            let center = bounds.center();
            let corners: Vec<egui::Pos2> = [
                bounds.min,
                egui::pos2(bounds.max.x, bounds.min.y),
                bounds.max,
                egui::pos2(bounds.min.x, bounds.max.y),
            ]
            .into_iter()
            .map(|p| vp.document_mm_to_screen(rotate_about(center, p, angle), origin))
            .collect();
            painter.add(egui::Shape::closed_line(corners, stroke));

            // Handles only on a single selection of a resizable shape.
            if single.map(|s| s.id) != Some(entity.id) || !entity.shape.is_resizable() {
                continue;
            }
            let half = HANDLE_SIZE_PX / 2.0;
            for handle in ResizeHandle::ALL {
                let anchor = rotate_about(center, handle.anchor_on(bounds), angle);
                let sp = vp.document_mm_to_screen(anchor, origin);
                painter.rect_filled(
                    egui::Rect::from_center_size(sp, egui::vec2(half * 2.0, half * 2.0)),
                    1.0,
                    SELECTION_COLOR,
                );
            }

            // Rotate handle: a circle tethered above the local top edge.
            // Drawing elements only; furniture rotates in fixed steps.
            if entity.kind != EntityKind::Drawing {
                continue;
            }
            let offset_mm = vp.screen_len_to_mm(ROTATE_HANDLE_OFFSET_PX);
            let local = egui::pos2(center.x, bounds.min.y - offset_mm);
            let knob = vp.document_mm_to_screen(rotate_about(center, local, angle), origin);
            let top_mid = vp.document_mm_to_screen(
                rotate_about(center, egui::pos2(center.x, bounds.min.y), angle),
                origin,
            );
            painter.line_segment([top_mid, knob], egui::Stroke::new(1.0, SELECTION_COLOR));
            painter.circle_filled(knob, half, SELECTION_COLOR);
        }
    }

    /// Draws the active alignment guide lines across both snapped objects.
    pub(super) fn draw_guides(&self, painter: &egui::Painter, origin: egui::Pos2) {
        let vp = &self.canvas.viewport;
        let stroke = egui::Stroke::new(1.0, GUIDE_COLOR);
        for guide in &self.interaction.active_guides {
            let (a, b) = match guide.axis {
                GuideAxis::Vertical => (
                    egui::pos2(guide.position, guide.span.0),
                    egui::pos2(guide.position, guide.span.1),
                ),
                GuideAxis::Horizontal => (
                    egui::pos2(guide.span.0, guide.position),
                    egui::pos2(guide.span.1, guide.position),
                ),
            };
            painter.line_segment(
                [
                    vp.document_mm_to_screen(a, origin),
                    vp.document_mm_to_screen(b, origin),
                ],
                stroke,
            );
        }
    }
}
