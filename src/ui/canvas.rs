//! Canvas interaction and navigation functionality.
//!
//! This module wires raw pointer input to the manipulation state machine:
//! panning, zooming, selection, object gestures (drag/resize/rotate), and
//! click-to-place for the drawing tools. All geometry edits go through
//! document mm; the screen is only ever an input/output surface.

use super::rendering::rotate_about;
use super::state::{FloorplanApp, Tool};
use crate::constants::{
    DEFAULT_FURNITURE_SIZE, PICK_THRESHOLD_PX, ROTATE_HANDLE_OFFSET_PX,
};
use crate::manipulate::{ResizeHandle, SnapContext};
use crate::snap;
use crate::types::{Entity, EntityId, EntityKind, Shape};
use eframe::egui;

/// Which interactive handle of the selected entity the pointer hit.
#[derive(Debug, Clone, Copy)]
enum HandleHit {
    /// One of the eight resize handles.
    Resize(ResizeHandle),
    /// The rotate handle floating above the selection.
    Rotate,
    /// A line endpoint (0 = start, 1 = end).
    Endpoint(usize),
}

impl FloorplanApp {
    /// Renders the canvas and processes all pointer interaction on it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let origin = response.rect.min;

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);

        if !self.interaction.is_panning {
            match self.active_tool {
                Tool::Select => self.handle_select_tool(ui, &response, origin),
                _ => self.handle_placement_tool(&response, origin),
            }
        }

        if self.canvas.show_grid {
            self.draw_grid(&painter, response.rect);
        }
        self.draw_entities(&painter, origin);
        self.draw_selection_overlay(&painter, origin);
        self.draw_guides(&painter, origin);
        self.draw_line_preview(&painter, origin, ui);
    }

    /// The snapping configuration for the current frame, with the guide
    /// threshold converted from screen pixels to mm at the active zoom.
    fn snap_context(&self) -> SnapContext {
        SnapContext {
            grid_enabled: self.canvas.snap_enabled,
            grid_size: self.canvas.grid_size_mm,
            guide_threshold_mm: self
                .canvas
                .viewport
                .screen_len_to_mm(crate::constants::GUIDE_SNAP_THRESHOLD_PX),
        }
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning.
    fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        });

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.viewport.pan += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll-wheel zooming anchored on the cursor position.
    /// Only zooms while the cursor is over the canvas.
    fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let mouse_pos = ui
            .input(|i| i.pointer.hover_pos())
            .or_else(|| response.interact_pointer_pos());
        if let Some(mouse_pos) = mouse_pos {
            if !response.rect.contains(mouse_pos) {
                return;
            }
            let zoom_delta = if scroll_delta > 0.0 { 0.1 } else { -0.1 };
            self.canvas
                .viewport
                .zoom_about(mouse_pos, response.rect.min, zoom_delta);
        }
    }

    /// Pointer handling for the select tool: handle grabs, object drags,
    /// selection changes, and gesture commit on release.
    fn handle_select_tool(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        origin: egui::Pos2,
    ) {
        let pointer_pos = response.interact_pointer_pos();

        if ui.input(|i| i.pointer.primary_pressed()) {
            if let Some(screen_pos) = pointer_pos {
                self.begin_gesture_at(ui, screen_pos, origin);
            }
        } else if ui.input(|i| i.pointer.primary_down()) {
            // Pointer moving with the button held: advance the gesture.
            if let (Some(screen_pos), Some(id)) =
                (pointer_pos, self.interaction.gesture.target())
            {
                let pointer_mm = self
                    .canvas
                    .viewport
                    .screen_to_document_mm(screen_pos, origin);
                let snap_ctx = self.snap_context();
                let model = self.project.model_mut();
                let candidates = model.guide_candidates(id);
                if let Some(entity) = model.entity_mut(id) {
                    let guides = self
                        .interaction
                        .gesture
                        .update(entity, pointer_mm, &snap_ctx, &candidates);
                    self.interaction.active_guides = guides;
                }
            }
        } else if self.interaction.gesture.is_active() {
            // Button no longer down: the gesture ends and commits once.
            if self.interaction.gesture.finish().is_some() {
                self.project.model_mut().commit();
                self.file.has_unsaved_changes = true;
            }
            self.interaction.active_guides.clear();
        }
    }

    /// Starts the appropriate gesture for a primary press at `screen_pos`:
    /// a handle grab on the selected entity, a drag on a picked entity, or
    /// a selection clear on empty canvas.
    fn begin_gesture_at(&mut self, ui: &egui::Ui, screen_pos: egui::Pos2, origin: egui::Pos2) {
        let pointer_mm = self
            .canvas
            .viewport
            .screen_to_document_mm(screen_pos, origin);
        let additive = ui.input(|i| i.modifiers.shift);

        // Handles of the single-selected entity take priority over picking.
        if let Some((id, hit)) = self.handle_at(screen_pos, origin) {
            let model = self.project.model_mut();
            if let Some(entity) = model.entity(id).cloned() {
                match hit {
                    HandleHit::Resize(handle) => {
                        self.interaction.gesture.begin_resize(&entity, handle, pointer_mm)
                    }
                    HandleHit::Rotate => {
                        self.interaction.gesture.begin_rotate(&entity, pointer_mm)
                    }
                    HandleHit::Endpoint(i) => {
                        self.interaction.gesture.begin_endpoint_drag(&entity, i)
                    }
                }
            }
            return;
        }

        let pick_mm = self
            .canvas
            .viewport
            .screen_len_to_mm(PICK_THRESHOLD_PX);
        let model = self.project.model_mut();
        match model.entity_at(pointer_mm, pick_mm) {
            Some(id) => {
                let kind = model.entity(id).map(|e| e.kind);
                if let Some(kind) = kind {
                    if additive {
                        model.selection.select(id, kind, true);
                    } else {
                        if !model.selection.contains(id) {
                            model.selection.select(id, kind, false);
                        }
                        // Plain press starts a move; shift-toggle does not.
                        if let Some(entity) = model.entity(id).cloned() {
                            self.interaction.gesture.begin_drag(&entity, pointer_mm);
                        }
                    }
                }
            }
            None => {
                if !additive {
                    model.selection.clear();
                }
            }
        }
    }

    /// Hit-tests the selected entity's handles in screen space.
    fn handle_at(&self, screen_pos: egui::Pos2, origin: egui::Pos2) -> Option<(EntityId, HandleHit)> {
        let model = self.project.model();
        let selected = model.selection.single()?;
        let entity = model.entity(selected.id)?;
        let vp = &self.canvas.viewport;

        if let Shape::Line { start, end } = &entity.shape {
            for (i, p) in [start, end].into_iter().enumerate() {
                let sp = vp.document_mm_to_screen(egui::pos2(p.0, p.1), origin);
                if sp.distance(screen_pos) <= PICK_THRESHOLD_PX {
                    return Some((entity.id, HandleHit::Endpoint(i)));
                }
            }
            return None;
        }

        if !entity.shape.is_resizable() {
            return None;
        }

        let bounds = entity.shape.bounds();
        let center = bounds.center();
        let angle = entity.rotation.to_radians();

        for handle in ResizeHandle::ALL {
            let anchor = rotate_about(center, handle.anchor_on(bounds), angle);
            let sp = vp.document_mm_to_screen(anchor, origin);
            if sp.distance(screen_pos) <= PICK_THRESHOLD_PX {
                return Some((entity.id, HandleHit::Resize(handle)));
            }
        }

        // Rotate handle floats above the local top edge, at a fixed screen
        // distance regardless of zoom. Furniture has no knob; it rotates in
        // fixed steps via the R shortcut.
        if entity.kind != EntityKind::Drawing {
            return None;
        }
        let offset_mm = vp.screen_len_to_mm(ROTATE_HANDLE_OFFSET_PX);
        let local = egui::pos2(center.x, bounds.min.y - offset_mm);
        let sp = vp.document_mm_to_screen(rotate_about(center, local, angle), origin);
        if sp.distance(screen_pos) <= PICK_THRESHOLD_PX {
            return Some((entity.id, HandleHit::Rotate));
        }

        None
    }

    /// Pointer handling for the placement tools: click to place an object
    /// on the active layer, snapped to the grid.
    fn handle_placement_tool(&mut self, response: &egui::Response, origin: egui::Pos2) {
        if !response.clicked() {
            return;
        }
        let Some(screen_pos) = response.interact_pointer_pos() else {
            return;
        };
        let raw_mm = self
            .canvas
            .viewport
            .screen_to_document_mm(screen_pos, origin);
        let (x, y) = snap::snap_point(
            raw_mm.x,
            raw_mm.y,
            self.canvas.grid_size_mm,
            self.canvas.snap_enabled,
        );
        let p = egui::pos2(x, y);

        let active_layer = self.project.model().active_layer;
        if self
            .project
            .model()
            .layer(active_layer)
            .is_some_and(|l| l.locked)
        {
            log::warn!("active layer is locked; cannot place objects on it");
            return;
        }

        let entity = match self.active_tool {
            Tool::Select => return,
            Tool::PlaceFurniture => {
                self.furniture_counter += 1;
                let (w, h) = DEFAULT_FURNITURE_SIZE;
                Entity::new(
                    format!("Furniture {}", self.furniture_counter),
                    EntityKind::Furniture,
                    Shape::Rect {
                        x: p.x - w / 2.0,
                        y: p.y - h / 2.0,
                        width: w,
                        height: h,
                    },
                    active_layer,
                )
            }
            Tool::DrawRect => {
                self.drawing_counter += 1;
                Entity::new(
                    format!("Rectangle {}", self.drawing_counter),
                    EntityKind::Drawing,
                    Shape::Rect {
                        x: p.x,
                        y: p.y,
                        width: 400.0,
                        height: 300.0,
                    },
                    active_layer,
                )
            }
            Tool::DrawCircle => {
                self.drawing_counter += 1;
                Entity::new(
                    format!("Circle {}", self.drawing_counter),
                    EntityKind::Drawing,
                    Shape::Circle {
                        cx: p.x,
                        cy: p.y,
                        rx: 200.0,
                        ry: 200.0,
                    },
                    active_layer,
                )
            }
            Tool::DrawLine => {
                // Two-click placement: first click arms the start point.
                match self.interaction.pending_line_start.take() {
                    None => {
                        self.interaction.pending_line_start = Some(p);
                        return;
                    }
                    Some(start) => {
                        self.drawing_counter += 1;
                        Entity::new(
                            format!("Line {}", self.drawing_counter),
                            EntityKind::Drawing,
                            Shape::Line {
                                start: (start.x, start.y),
                                end: (p.x, p.y),
                            },
                            active_layer,
                        )
                    }
                }
            }
            Tool::DrawText => {
                self.drawing_counter += 1;
                let content = if self.interaction.temp_text_content.trim().is_empty() {
                    format!("Text {}", self.drawing_counter)
                } else {
                    self.interaction.temp_text_content.clone()
                };
                Entity::new(
                    format!("Text {}", self.drawing_counter),
                    EntityKind::Drawing,
                    Shape::Text {
                        x: p.x,
                        y: p.y,
                        content,
                        font_size: 100.0,
                    },
                    active_layer,
                )
            }
        };

        let kind = entity.kind;
        let model = self.project.model_mut();
        let id = model.add_entity(entity);
        model.selection.select(id, kind, false);
        model.commit();
        self.file.has_unsaved_changes = true;
    }

    /// Draws the rubber-band preview while the line tool has an armed start
    /// point.
    fn draw_line_preview(&self, painter: &egui::Painter, origin: egui::Pos2, ui: &egui::Ui) {
        let Some(start) = self.interaction.pending_line_start else {
            return;
        };
        let Some(hover) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        let a = self.canvas.viewport.document_mm_to_screen(start, origin);
        painter.line_segment(
            [a, hover],
            egui::Stroke::new(1.0, egui::Color32::from_rgb(0, 150, 255)),
        );
    }
}
