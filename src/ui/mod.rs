//! User interface components and rendering logic for the floorplan editor.
//!
//! This module contains all the UI-related code including the main
//! application struct, canvas rendering, the layers/properties side panel,
//! and user interaction handling.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main FloorplanApp
//! - `file_ops` - File save/load operations for native and WASM
//! - `canvas` - Canvas navigation, zooming, panning, and object gestures
//! - `rendering` - Drawing entities, the grid, selection handles, and guides

mod canvas;
mod file_ops;
mod rendering;
mod state;


pub use state::FloorplanApp;

use self::state::{PendingConfirmAction, Tool};
use crate::constants::{
    DUPLICATE_OFFSET_MM, FURNITURE_ROTATION_STEP, NUDGE_STEP_MM,
};
use crate::types::EntityKind;
use eframe::egui;

impl eframe::App for FloorplanApp {
    /// Persist entire app state between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string("app_state", json);
            }
            Err(err) => {
                log::error!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Handles the overall layout: toolbar, side panel, and canvas, plus
    /// global keyboard shortcuts and pending file operations.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        // Apply theme visuals
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // Handle pending file operations
        self.handle_pending_operations(ctx);

        // Global keyboard shortcuts
        self.handle_undo_redo_keys(ctx);
        self.handle_delete_key(ctx);
        self.handle_escape_key(ctx);
        self.handle_edit_shortcuts(ctx);
        self.handle_file_shortcuts(ctx, frame);

        // Intercept native window close requests (titlebar X)
        #[cfg(not(target_arch = "wasm32"))]
        {
            if ctx.input(|i| i.viewport().close_requested()) {
                if self.file.has_unsaved_changes && !self.file.allow_close_on_next_request {
                    // Abort close and show confirmation dialog
                    ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                    if !self.file.show_unsaved_dialog {
                        self.file.show_unsaved_dialog = true;
                        self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
                    }
                } else {
                    self.file.allow_close_on_next_request = false;
                }
            }
        }

        // Top toolbar occupies full width and is independent of the side panel
        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        // Side panel should only take space from the canvas area below the toolbar
        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let clamped_width = self
            .side_panel_width
            .clamp(180.0, (viewport_width * 0.9).max(180.0));

        egui::SidePanel::right("side_panel")
            .resizable(true)
            .default_width(clamped_width)
            .show(ctx, |ui| {
                let current_width = ui.available_width();
                let max_allowed = (viewport_width * 0.9).max(180.0);
                self.side_panel_width = current_width.clamp(180.0, max_allowed);
                self.draw_side_panel(ui);
            });

        // Central canvas area (below the toolbar)
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        // Unsaved changes confirmation dialog
        if self.file.show_unsaved_dialog {
            self.draw_unsaved_dialog(ctx);
        }
    }
}

impl FloorplanApp {
    /// Marks the project as modified for the save/close flow.
    fn mark_changed(&mut self) {
        self.file.has_unsaved_changes = true;
    }

    /// Handles undo/redo keyboard shortcuts (Ctrl+Z, Ctrl+Shift+Z, Ctrl+Y).
    fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        // Don't steal keys from an active text edit
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift)
        {
            self.perform_undo();
        } else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    /// Steps the active page's history back one snapshot.
    pub fn perform_undo(&mut self) {
        // An in-flight gesture is abandoned; its target may no longer exist
        // after the restore.
        self.interaction.gesture = crate::manipulate::Manipulation::Idle;
        self.interaction.active_guides.clear();
        if self.project.model_mut().undo() {
            self.mark_changed();
        }
    }

    /// Steps the active page's history forward one snapshot.
    pub fn perform_redo(&mut self) {
        self.interaction.gesture = crate::manipulate::Manipulation::Idle;
        self.interaction.active_guides.clear();
        if self.project.model_mut().redo() {
            self.mark_changed();
        }
    }

    /// Handles the Delete/Backspace keys for removing selected objects.
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if pressed {
            let model = self.project.model_mut();
            if model.delete_selection() > 0 {
                model.commit();
                self.interaction.editing_entity_name = None;
                self.mark_changed();
            }
        }
    }

    /// Handles Escape: cancels the active gesture, restoring the entity's
    /// pre-gesture geometry, or disarms the current tool.
    fn handle_escape_key(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return;
        }
        if let Some(original) = self.interaction.gesture.cancel() {
            let model = self.project.model_mut();
            if let Some(entity) = model.entity_mut(original.id) {
                *entity = original;
            }
            self.interaction.active_guides.clear();
            return;
        }
        if self.interaction.pending_line_start.take().is_some() {
            return;
        }
        if self.active_tool != Tool::Select {
            self.active_tool = Tool::Select;
        }
    }

    /// Handles object-editing shortcuts: arrow-key nudge, R to rotate
    /// furniture, Ctrl+D to duplicate.
    fn handle_edit_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        // Arrow nudge: one grid cell normally, 1 mm with Shift for fine moves.
        let (mut dx, mut dy) = (0.0f32, 0.0f32);
        let fine = ctx.input(|i| i.modifiers.shift);
        let grid = self.canvas.grid_size_mm;
        let step = if fine {
            1.0
        } else if grid > 0.0 {
            grid
        } else {
            NUDGE_STEP_MM
        };
        ctx.input(|i| {
            if i.key_pressed(egui::Key::ArrowLeft) {
                dx -= step;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                dx += step;
            }
            if i.key_pressed(egui::Key::ArrowUp) {
                dy -= step;
            }
            if i.key_pressed(egui::Key::ArrowDown) {
                dy += step;
            }
        });
        if (dx != 0.0 || dy != 0.0) && !self.project.model().selection.is_empty() {
            let model = self.project.model_mut();
            model.nudge_selection(dx, dy);
            model.commit();
            self.mark_changed();
        }

        // R rotates the most recently selected furniture item by a fixed step.
        if ctx.input(|i| i.key_pressed(egui::Key::R) && !i.modifiers.command) {
            self.rotate_selected_furniture();
        }

        // Ctrl+D duplicates the selection.
        if ctx.input(|i| i.key_pressed(egui::Key::D) && i.modifiers.command) {
            let model = self.project.model_mut();
            let created = model.duplicate_selection(DUPLICATE_OFFSET_MM);
            if !created.is_empty() {
                model.commit();
                self.mark_changed();
            }
        }
    }

    /// Rotates the most recently selected furniture item by the fixed step.
    pub fn rotate_selected_furniture(&mut self) {
        let model = self.project.model_mut();
        let Some(id) = model.selection.last_selected(EntityKind::Furniture) else {
            return;
        };
        if let Some(entity) = model.entity_mut(id) {
            crate::manipulate::rotate_step(entity, FURNITURE_ROTATION_STEP);
            model.commit();
            self.mark_changed();
        }
    }

    /// Handles file-related keyboard shortcuts: New, Open, Save, Save As,
    /// and Quit. Uses the platform-standard Command or Control modifier.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.wants_keyboard_input() {
            return;
        }
        #[cfg(target_arch = "wasm32")]
        let request_quit = false;
        #[cfg(not(target_arch = "wasm32"))]
        let mut request_quit = false;
        ctx.input(|i| {
            let cmd = i.modifiers.command;
            let shift = i.modifiers.shift;
            // Save As: Cmd/Ctrl+Shift+S
            if i.key_pressed(egui::Key::S) && cmd && shift {
                self.save_project_as();
            }
            // Save: Cmd/Ctrl+S
            else if i.key_pressed(egui::Key::S) && cmd {
                self.save_project();
            }
            // Open: Cmd/Ctrl+O
            if i.key_pressed(egui::Key::O) && cmd {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Open);
                } else {
                    self.load_project();
                }
            }
            // New: Cmd/Ctrl+N
            if i.key_pressed(egui::Key::N) && cmd {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::New);
                } else {
                    self.new_project();
                }
            }
            // Quit: Cmd/Ctrl+Q (native only)
            #[cfg(not(target_arch = "wasm32"))]
            if i.key_pressed(egui::Key::Q) && cmd {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
                } else {
                    request_quit = true;
                }
            }
        });
        if request_quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    /// Renders the unsaved-changes confirmation dialog.
    fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        let title = match self.file.pending_confirm_action {
            Some(PendingConfirmAction::Quit) => "Unsaved changes - Quit?",
            Some(PendingConfirmAction::New) => "Unsaved changes - Create New?",
            Some(PendingConfirmAction::Open) => "Unsaved changes - Open File?",
            None => "Unsaved changes",
        };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    let confirm_label = match self.file.pending_confirm_action {
                        Some(PendingConfirmAction::Quit) => "Discard and Quit",
                        Some(PendingConfirmAction::New) => "Discard and Create New",
                        Some(PendingConfirmAction::Open) => "Discard and Open",
                        None => "Discard",
                    };
                    if ui.button(confirm_label).clicked() {
                        match self.file.pending_confirm_action {
                            Some(PendingConfirmAction::New) => {
                                self.new_project();
                            }
                            Some(PendingConfirmAction::Open) => {
                                self.load_project();
                            }
                            Some(PendingConfirmAction::Quit) => {
                                // Allow one close request to pass without interception
                                self.file.allow_close_on_next_request = true;
                                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                            }
                            None => {}
                        }
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.file.show_unsaved_dialog = false;
                        self.file.pending_confirm_action = None;
                    }
                });
            });
    }

    /// Renders the toolbar with file operations, tools, and view options.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            // File operations
            if ui.button("New").clicked() {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::New);
                } else {
                    self.new_project();
                }
            }
            if ui.button("Open").clicked() {
                if self.file.has_unsaved_changes {
                    self.file.show_unsaved_dialog = true;
                    self.file.pending_confirm_action = Some(PendingConfirmAction::Open);
                } else {
                    self.load_project();
                }
            }
            if ui.button("Save").clicked() {
                self.save_project();
            }
            if ui.button("Save As").clicked() {
                self.save_project_as();
            }

            ui.separator();

            // Undo/Redo operations
            ui.add_enabled_ui(self.project.model().can_undo(), |ui| {
                if ui.button("⟲ Undo").clicked() {
                    self.perform_undo();
                }
            });
            ui.add_enabled_ui(self.project.model().can_redo(), |ui| {
                if ui.button("⟳ Redo").clicked() {
                    self.perform_redo();
                }
            });

            ui.separator();

            // Tools
            for (tool, label) in [
                (Tool::Select, "Select"),
                (Tool::PlaceFurniture, "Furniture"),
                (Tool::DrawRect, "Rect"),
                (Tool::DrawCircle, "Circle"),
                (Tool::DrawLine, "Line"),
                (Tool::DrawText, "Text"),
            ] {
                if ui
                    .selectable_label(self.active_tool == tool, label)
                    .clicked()
                {
                    self.active_tool = tool;
                    self.interaction.pending_line_start = None;
                }
            }

            ui.separator();

            // View options
            ui.checkbox(&mut self.canvas.show_grid, "Grid");
            ui.checkbox(&mut self.canvas.snap_enabled, "Snap");
            ui.add(
                egui::DragValue::new(&mut self.canvas.grid_size_mm)
                    .range(1.0..=1000.0)
                    .suffix(" mm"),
            );
            ui.separator();
            ui.checkbox(&mut self.dark_mode, "Dark Mode");

            // Current file and unsaved-changes indicator
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(file_path) = &self.file.current_path {
                    let status = if self.file.has_unsaved_changes { "*" } else { "" };
                    ui.label(format!("{}{}", file_path, status));
                } else {
                    let status = if self.file.has_unsaved_changes {
                        "Untitled*"
                    } else {
                        "Untitled"
                    };
                    ui.label(status);
                }
                ui.label(format!("Zoom: {:.0}%", self.canvas.viewport.zoom * 100.0));
            });
        });
    }

    /// Renders the side panel: pages, layers, selection properties, and
    /// measurement calibration.
    fn draw_side_panel(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                self.draw_pages_section(ui);
                ui.separator();
                self.draw_layers_section(ui);
                ui.separator();
                self.draw_properties_section(ui);
                ui.separator();
                self.draw_calibration_section(ui);
            });
    }

    /// Renders the page selector and add/remove buttons.
    fn draw_pages_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Pages");
        ui.horizontal(|ui| {
            let active = self.project.active_page;
            let active_name = self.project.pages[active].name.clone();
            egui::ComboBox::from_id_salt("page_selector")
                .selected_text(active_name)
                .show_ui(ui, |ui| {
                    for i in 0..self.project.pages.len() {
                        let name = self.project.pages[i].name.clone();
                        if ui.selectable_label(i == active, name).clicked() {
                            self.project.set_active_page(i);
                            self.interaction.gesture = crate::manipulate::Manipulation::Idle;
                            self.interaction.editing_entity_name = None;
                        }
                    }
                });
            if ui.button("+").on_hover_text("Add page").clicked() {
                self.project.add_page();
                self.mark_changed();
            }
            let removable = self.project.pages.len() > 1;
            ui.add_enabled_ui(removable, |ui| {
                if ui.button("−").on_hover_text("Remove page").clicked() {
                    let active = self.project.active_page;
                    if self.project.remove_page(active) {
                        self.mark_changed();
                    }
                }
            });
        });
        ui.horizontal(|ui| {
            ui.label("Name:");
            let active = self.project.active_page;
            let response = ui.text_edit_singleline(&mut self.project.pages[active].name);
            if response.changed() {
                self.mark_changed();
            }
        });
    }

    /// Renders the layer list with visibility, lock, order, and opacity
    /// controls.
    fn draw_layers_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        if ui.button("Add Layer").clicked() {
            let model = self.project.model_mut();
            let id = model.add_layer(format!("Layer {}", model.layers.len() + 1));
            model.active_layer = id;
            model.commit();
            self.mark_changed();
        }

        // Top of the stack first, matching render order back-to-front.
        let layer_ids: Vec<_> = {
            let model = self.project.model();
            model.layers_sorted().iter().rev().map(|l| l.id).collect()
        };
        let active_layer = self.project.model().active_layer;
        let deletable = layer_ids.len() > 1;

        for id in layer_ids {
            let (name, mut visible, mut locked, mut opacity) = {
                let Some(layer) = self.project.model().layer(id) else {
                    continue;
                };
                (layer.name.clone(), layer.visible, layer.locked, layer.opacity)
            };

            ui.horizontal(|ui| {
                if ui
                    .selectable_label(id == active_layer, &name)
                    .on_hover_text("Set active layer")
                    .clicked()
                {
                    self.project.model_mut().active_layer = id;
                }
                if ui.checkbox(&mut visible, "👁").changed() {
                    if let Some(l) = self.project.model_mut().layer_mut(id) {
                        l.visible = visible;
                    }
                    self.commit_and_mark();
                }
                if ui.checkbox(&mut locked, "🔒").changed() {
                    if let Some(l) = self.project.model_mut().layer_mut(id) {
                        l.locked = locked;
                    }
                    self.commit_and_mark();
                }
                if ui
                    .add(egui::Slider::new(&mut opacity, 0..=100).show_value(false))
                    .changed()
                {
                    if let Some(l) = self.project.model_mut().layer_mut(id) {
                        l.opacity = opacity;
                    }
                    self.mark_changed();
                }
                if ui.button("▲").on_hover_text("Move layer up").clicked() {
                    if self.project.model_mut().move_layer_up(id).is_ok() {
                        self.commit_and_mark();
                    }
                }
                if ui.button("▼").on_hover_text("Move layer down").clicked() {
                    if self.project.model_mut().move_layer_down(id).is_ok() {
                        self.commit_and_mark();
                    }
                }
                ui.add_enabled_ui(deletable, |ui| {
                    if ui.button("🗑").on_hover_text("Delete layer").clicked() {
                        match self.project.model_mut().remove_layer(id) {
                            Ok(()) => self.commit_and_mark(),
                            Err(err) => log::warn!("cannot delete layer: {err}"),
                        }
                    }
                });
            });
        }
    }

    /// Commits the current document state to history and marks the file dirty.
    fn commit_and_mark(&mut self) {
        self.project.model_mut().commit();
        self.mark_changed();
    }

    /// Renders properties for the selected entity.
    fn draw_properties_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");

        let Some(selected) = self.project.model().selection.single() else {
            let n = self.project.model().selection.len();
            if n > 1 {
                ui.label(format!("{n} objects selected"));
            } else {
                ui.label("Nothing selected");
                ui.colored_label(
                    egui::Color32::GRAY,
                    "Click an object to select it.\nShift-click toggles.",
                );
            }
            return;
        };

        let Some(entity) = self.project.model().entity(selected.id).cloned() else {
            return;
        };

        ui.label(match entity.kind {
            EntityKind::Furniture => "Type: Furniture",
            EntityKind::Drawing => "Type: Drawing",
        });

        // Name editing
        ui.label("Name:");
        if self.interaction.editing_entity_name == Some(entity.id) {
            let response = ui.text_edit_singleline(&mut self.interaction.temp_entity_name);
            let commit = ui.input(|i| i.key_pressed(egui::Key::Enter)) || response.lost_focus();
            if commit {
                let new_name = self.interaction.temp_entity_name.trim().to_string();
                if !new_name.is_empty() && new_name != entity.name {
                    if let Some(e) = self.project.model_mut().entity_mut(entity.id) {
                        e.name = new_name;
                    }
                    self.commit_and_mark();
                }
                self.interaction.editing_entity_name = None;
            }
        } else if ui.button(&entity.name).clicked() {
            self.interaction.editing_entity_name = Some(entity.id);
            self.interaction.temp_entity_name = entity.name.clone();
        }

        ui.separator();

        // Geometry readout in mm; positions are document coordinates.
        let pos = entity.shape.position();
        let size = entity.shape.size();
        ui.label(format!("Position: {:.0}, {:.0} mm", pos.x, pos.y));
        if entity.shape.is_resizable() {
            ui.label(format!("Size: {:.0} × {:.0} mm", size.x, size.y));
        }
        ui.label(format!("Rotation: {:.0}°", entity.rotation));
        if entity.kind == EntityKind::Furniture && ui.button("Rotate 90°").clicked() {
            self.rotate_selected_furniture();
        }

        ui.separator();

        // Z-order within the layer
        ui.label("Order:");
        ui.horizontal(|ui| {
            if ui.button("Front").clicked() {
                self.project.model_mut().entity_move_to_top(entity.id);
                self.commit_and_mark();
            }
            if ui.button("Up").clicked() {
                self.project.model_mut().entity_move_up(entity.id);
                self.commit_and_mark();
            }
            if ui.button("Down").clicked() {
                self.project.model_mut().entity_move_down(entity.id);
                self.commit_and_mark();
            }
            if ui.button("Back").clicked() {
                self.project.model_mut().entity_move_to_bottom(entity.id);
                self.commit_and_mark();
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Duplicate").clicked() {
                let model = self.project.model_mut();
                if !model.duplicate_selection(DUPLICATE_OFFSET_MM).is_empty() {
                    model.commit();
                    self.mark_changed();
                }
            }
            if ui.button("Delete").clicked() {
                let model = self.project.model_mut();
                if model.delete_selection() > 0 {
                    model.commit();
                    self.mark_changed();
                }
            }
        });
    }

    /// Renders the measurement calibration controls.
    fn draw_calibration_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Calibration");
        if let Some(ppm) = self.project.calibration.pixels_per_mm {
            ui.label(format!("Scale: {:.4} px/mm", ppm));
        } else {
            ui.label("Not calibrated");
        }
        ui.horizontal(|ui| {
            ui.label("Measured px:");
            ui.text_edit_singleline(&mut self.interaction.temp_calibration_px);
        });
        ui.horizontal(|ui| {
            ui.label("Real mm:");
            ui.text_edit_singleline(&mut self.interaction.temp_calibration_mm);
        });
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                let px = self.interaction.temp_calibration_px.trim().parse::<f32>();
                let mm = self.interaction.temp_calibration_mm.trim().parse::<f32>();
                if let (Ok(px), Ok(mm)) = (px, mm) {
                    if self.project.calibration.calibrate(px, mm) {
                        self.mark_changed();
                    }
                } else {
                    log::warn!("calibration inputs must be numeric");
                }
            }
            // Resetting also clears placed furniture: positions are
            // meaningless once the scale reference is gone.
            if ui.button("Reset").clicked() {
                self.project.reset_calibration();
                self.mark_changed();
            }
        });
    }
}
