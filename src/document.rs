//! The document model: entities, layers, selection, and history under one
//! owner.
//!
//! All cross-collection coordination (deleting a layer reassigns its
//! entities, undo clears the selection, removing an entity drops it from the
//! selection) happens inside [`DocumentModel`] methods, so no store ever
//! needs a back-reference to another.

use crate::history::{History, Snapshot};
use crate::selection::Selection;
use crate::types::{Entity, EntityId, EntityKind, Layer, LayerId, Shape};
use crate::units::Calibration;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Rejected layer operations. These are expected user actions (pressing
/// delete on the last layer), signaled as a distinct outcome rather than a
/// panic or a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOpError {
    /// The document must always contain at least one layer.
    CannotDeleteLastLayer,
    /// The referenced layer does not exist.
    UnknownLayer,
}

impl std::fmt::Display for LayerOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerOpError::CannotDeleteLastLayer => write!(f, "cannot delete the last layer"),
            LayerOpError::UnknownLayer => write!(f, "layer does not exist"),
        }
    }
}

/// One page of a project: entities + layers + selection + history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentModel {
    /// All entities, keyed by id.
    pub entities: HashMap<EntityId, Entity>,
    /// All layers. Never empty.
    pub layers: Vec<Layer>,
    /// The layer new entities are placed on.
    pub active_layer: LayerId,
    /// Current selection. Transient, not persisted.
    #[serde(skip)]
    pub selection: Selection,
    /// Undo/redo history. Transient, rebuilt on load.
    #[serde(skip)]
    history: History,
}

impl Default for DocumentModel {
    fn default() -> Self {
        let base = Layer::new("Layer 1".to_string(), 0.0);
        let active_layer = base.id;
        let mut model = Self {
            entities: HashMap::new(),
            layers: vec![base],
            active_layer,
            selection: Selection::new(),
            history: History::default(),
        };
        model.history = History::new(model.snapshot());
        model
    }
}

impl DocumentModel {
    /// Creates an empty document with one default layer.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- entity store ----

    /// Adds an entity, placing it on top of its layer's z-order.
    /// Returns the new entity's id.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        entity.order = self.top_order_in_layer(entity.layer_id) + 1.0;
        let id = entity.id;
        self.entities.insert(id, entity);
        id
    }

    /// Removes an entity, dropping it from the selection as well.
    /// Returns `true` if it existed.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let removed = self.entities.remove(&id).is_some();
        if removed {
            self.selection.remove(id);
        }
        removed
    }

    /// Looks up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up an entity mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All entities sorted for rendering: by layer stacking order, then by
    /// per-layer z-rank. Hidden layers are included; the renderer filters.
    pub fn entities_sorted(&self) -> Vec<&Entity> {
        let layer_order: HashMap<LayerId, f32> =
            self.layers.iter().map(|l| (l.id, l.order)).collect();
        let mut out: Vec<&Entity> = self.entities.values().collect();
        out.sort_by(|a, b| {
            let la = layer_order.get(&a.layer_id).copied().unwrap_or(0.0);
            let lb = layer_order.get(&b.layer_id).copied().unwrap_or(0.0);
            la.total_cmp(&lb).then(a.order.total_cmp(&b.order))
        });
        out
    }

    /// Bounding boxes of all visible, non-locked entities except `exclude`,
    /// for the alignment-guide scan.
    pub fn guide_candidates(&self, exclude: EntityId) -> Vec<egui::Rect> {
        self.entities
            .values()
            .filter(|e| e.id != exclude)
            .filter(|e| {
                self.layer(e.layer_id)
                    .map(|l| l.visible && !l.locked)
                    .unwrap_or(false)
            })
            .map(|e| e.shape.bounds())
            .collect()
    }

    /// Topmost entity at a document-mm position, if any.
    ///
    /// Scans in reverse render order so entities drawn on top win. Entities
    /// on hidden or locked layers are not pickable. `pick_mm` is the pick
    /// radius (already converted from screen pixels) used for thin shapes.
    pub fn entity_at(&self, pos: egui::Pos2, pick_mm: f32) -> Option<EntityId> {
        for entity in self.entities_sorted().into_iter().rev() {
            let pickable = self
                .layer(entity.layer_id)
                .map(|l| l.visible && !l.locked)
                .unwrap_or(false);
            if pickable && hit_test(entity, pos, pick_mm) {
                return Some(entity.id);
            }
        }
        None
    }

    /// Removes every furniture entity. Called when measurement calibration
    /// is reset: positions are meaningless without a scale reference.
    pub fn clear_furniture(&mut self) {
        let ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.kind == EntityKind::Furniture)
            .map(|e| e.id)
            .collect();
        for id in ids {
            self.remove_entity(id);
        }
    }

    // ---- selection-driven edits ----

    /// Duplicates the current selection, offsetting the copies by a small
    /// delta so they are visible. The new copies become the selection.
    pub fn duplicate_selection(&mut self, offset_mm: f32) -> Vec<EntityId> {
        let originals: Vec<Entity> = self
            .selection
            .iter()
            .filter_map(|s| self.entities.get(&s.id).cloned())
            .collect();

        let mut new_ids = Vec::with_capacity(originals.len());
        self.selection.clear();
        for mut copy in originals {
            copy.id = Uuid::new_v4();
            copy.shape.translate(offset_mm, offset_mm);
            let kind = copy.kind;
            let id = self.add_entity(copy);
            self.selection.select(id, kind, true);
            new_ids.push(id);
        }
        new_ids
    }

    /// Translates every selected entity by a mm delta.
    pub fn nudge_selection(&mut self, dx: f32, dy: f32) {
        let ids: Vec<EntityId> = self.selection.iter().map(|s| s.id).collect();
        for id in ids {
            if let Some(e) = self.entities.get_mut(&id) {
                e.shape.translate(dx, dy);
            }
        }
    }

    /// Deletes every selected entity. Returns how many were removed.
    pub fn delete_selection(&mut self) -> usize {
        let ids: Vec<EntityId> = self.selection.iter().map(|s| s.id).collect();
        let mut removed = 0;
        for id in ids {
            if self.remove_entity(id) {
                removed += 1;
            }
        }
        removed
    }

    // ---- layers ----

    /// Looks up a layer.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Looks up a layer mutably.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Adds a new layer on top of the stack and makes it active.
    pub fn add_layer(&mut self, name: String) -> LayerId {
        let top = self
            .layers
            .iter()
            .map(|l| l.order)
            .fold(f32::NEG_INFINITY, f32::max);
        let layer = Layer::new(name, top + 1.0);
        let id = layer.id;
        self.layers.push(layer);
        self.active_layer = id;
        id
    }

    /// Removes a layer.
    ///
    /// Rejected when it is the only layer. Member entities are reassigned to
    /// the layer below (or the first remaining one); if the removed layer was
    /// active, the fallback becomes active.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), LayerOpError> {
        if self.layers.len() <= 1 {
            return Err(LayerOpError::CannotDeleteLastLayer);
        }
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(LayerOpError::UnknownLayer)?;

        // Fallback: the nearest layer below in stacking order, else any other.
        let fallback = self
            .layers_sorted()
            .iter()
            .rev()
            .skip_while(|l| l.id != id)
            .nth(1)
            .map(|l| l.id)
            .or_else(|| self.layers.iter().find(|l| l.id != id).map(|l| l.id))
            .ok_or(LayerOpError::UnknownLayer)?;

        self.layers.remove(index);
        for entity in self.entities.values_mut() {
            if entity.layer_id == id {
                entity.layer_id = fallback;
            }
        }
        if self.active_layer == id {
            self.active_layer = fallback;
        }
        Ok(())
    }

    /// Layers sorted bottom-to-top by stacking order.
    pub fn layers_sorted(&self) -> Vec<&Layer> {
        let mut out: Vec<&Layer> = self.layers.iter().collect();
        out.sort_by(|a, b| a.order.total_cmp(&b.order));
        out
    }

    /// Swaps the layer's order with the one directly above it.
    /// No-op (`Ok`) when it is already on top.
    pub fn move_layer_up(&mut self, id: LayerId) -> Result<(), LayerOpError> {
        self.swap_layer_order(id, true)
    }

    /// Swaps the layer's order with the one directly below it.
    pub fn move_layer_down(&mut self, id: LayerId) -> Result<(), LayerOpError> {
        self.swap_layer_order(id, false)
    }

    fn swap_layer_order(&mut self, id: LayerId, up: bool) -> Result<(), LayerOpError> {
        let sorted: Vec<LayerId> = self.layers_sorted().iter().map(|l| l.id).collect();
        let pos = sorted
            .iter()
            .position(|l| *l == id)
            .ok_or(LayerOpError::UnknownLayer)?;
        let neighbor = if up {
            if pos + 1 >= sorted.len() {
                return Ok(()); // already on top
            }
            sorted[pos + 1]
        } else {
            if pos == 0 {
                return Ok(()); // already at the bottom
            }
            sorted[pos - 1]
        };

        let a = self.layer(id).map(|l| l.order).unwrap_or(0.0);
        let b = self.layer(neighbor).map(|l| l.order).unwrap_or(0.0);
        if let Some(l) = self.layer_mut(id) {
            l.order = b;
        }
        if let Some(l) = self.layer_mut(neighbor) {
            l.order = a;
        }
        Ok(())
    }

    /// Moves the layer above everything else (`max(order) + 1`).
    pub fn move_layer_to_top(&mut self, id: LayerId) -> Result<(), LayerOpError> {
        let top = self
            .layers
            .iter()
            .map(|l| l.order)
            .fold(f32::NEG_INFINITY, f32::max);
        self.layer_mut(id)
            .map(|l| l.order = top + 1.0)
            .ok_or(LayerOpError::UnknownLayer)
    }

    /// Moves the layer below everything else (`min(order) - 1`).
    pub fn move_layer_to_bottom(&mut self, id: LayerId) -> Result<(), LayerOpError> {
        let bottom = self
            .layers
            .iter()
            .map(|l| l.order)
            .fold(f32::INFINITY, f32::min);
        self.layer_mut(id)
            .map(|l| l.order = bottom - 1.0)
            .ok_or(LayerOpError::UnknownLayer)
    }

    /// Merges layer `from` down into layer `into`: every entity referencing
    /// `from` is reassigned to `into`, then `from` is deleted.
    pub fn merge_layer_into(&mut self, from: LayerId, into: LayerId) -> Result<(), LayerOpError> {
        if from == into || self.layer(into).is_none() {
            return Err(LayerOpError::UnknownLayer);
        }
        let index = self
            .layers
            .iter()
            .position(|l| l.id == from)
            .ok_or(LayerOpError::UnknownLayer)?;

        for entity in self.entities.values_mut() {
            if entity.layer_id == from {
                entity.layer_id = into;
            }
        }
        self.layers.remove(index);
        if self.active_layer == from {
            self.active_layer = into;
        }
        Ok(())
    }

    // ---- entity z-order within a layer ----

    fn top_order_in_layer(&self, layer_id: LayerId) -> f32 {
        self.entities
            .values()
            .filter(|e| e.layer_id == layer_id)
            .map(|e| e.order)
            .fold(0.0, f32::max)
    }

    /// Entities of one layer sorted by z-rank.
    fn layer_entities_sorted(&self, layer_id: LayerId) -> Vec<EntityId> {
        let mut items: Vec<(EntityId, f32)> = self
            .entities
            .values()
            .filter(|e| e.layer_id == layer_id)
            .map(|e| (e.id, e.order))
            .collect();
        items.sort_by(|a, b| a.1.total_cmp(&b.1));
        items.into_iter().map(|(id, _)| id).collect()
    }

    /// Raises the entity one step within its layer (swaps z-rank with the
    /// next entity above). No-op at the top.
    pub fn entity_move_up(&mut self, id: EntityId) {
        self.swap_entity_order(id, true);
    }

    /// Lowers the entity one step within its layer. No-op at the bottom.
    pub fn entity_move_down(&mut self, id: EntityId) {
        self.swap_entity_order(id, false);
    }

    fn swap_entity_order(&mut self, id: EntityId, up: bool) {
        let Some(layer_id) = self.entities.get(&id).map(|e| e.layer_id) else {
            return;
        };
        let sorted = self.layer_entities_sorted(layer_id);
        let Some(pos) = sorted.iter().position(|e| *e == id) else {
            return;
        };
        let neighbor = if up {
            if pos + 1 >= sorted.len() {
                return;
            }
            sorted[pos + 1]
        } else {
            if pos == 0 {
                return;
            }
            sorted[pos - 1]
        };
        let a = self.entities[&id].order;
        let b = self.entities[&neighbor].order;
        if let Some(e) = self.entities.get_mut(&id) {
            e.order = b;
        }
        if let Some(e) = self.entities.get_mut(&neighbor) {
            e.order = a;
        }
    }

    /// Raises the entity above everything in its layer.
    pub fn entity_move_to_top(&mut self, id: EntityId) {
        let Some(layer_id) = self.entities.get(&id).map(|e| e.layer_id) else {
            return;
        };
        let top = self.top_order_in_layer(layer_id);
        if let Some(e) = self.entities.get_mut(&id) {
            e.order = top + 1.0;
        }
    }

    /// Lowers the entity below everything in its layer.
    pub fn entity_move_to_bottom(&mut self, id: EntityId) {
        let Some(layer_id) = self.entities.get(&id).map(|e| e.layer_id) else {
            return;
        };
        let bottom = self
            .entities
            .values()
            .filter(|e| e.layer_id == layer_id)
            .map(|e| e.order)
            .fold(0.0, f32::min);
        if let Some(e) = self.entities.get_mut(&id) {
            e.order = bottom - 1.0;
        }
    }

    // ---- history ----

    /// Captures the current mutable state as a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entities: self.entities.clone(),
            layers: self.layers.clone(),
        }
    }

    /// Records the current state in the history. Called once per committed
    /// edit (pointer-up after a drag, a delete, a layer change), never per
    /// pointer-move.
    pub fn commit(&mut self) {
        self.history.save(self.snapshot());
    }

    /// Restores the previous snapshot, if any. Selection is cleared since
    /// the selected ids may not exist in the restored state.
    pub fn undo(&mut self) -> bool {
        if let Some(snap) = self.history.undo() {
            let snap = snap.clone();
            self.restore(snap);
            true
        } else {
            false
        }
    }

    /// Restores the next snapshot, if any.
    pub fn redo(&mut self) -> bool {
        if let Some(snap) = self.history.redo() {
            let snap = snap.clone();
            self.restore(snap);
            true
        } else {
            false
        }
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snap: Snapshot) {
        self.entities = snap.entities;
        self.layers = snap.layers;
        self.selection.clear();
        if self.layer(self.active_layer).is_none() {
            if let Some(first) = self.layers.first() {
                self.active_layer = first.id;
            }
        }
    }

    /// Reseeds the history from the current state. Called after loading a
    /// document, so undo cannot walk back into the previous document.
    pub fn reset_history(&mut self) {
        self.history.reset(self.snapshot());
    }
}

/// Rotation-aware hit test for a single entity, in document mm.
fn hit_test(entity: &Entity, pos: egui::Pos2, pick_mm: f32) -> bool {
    // Undo the entity's rotation so the test happens in its local
    // axis-aligned frame.
    let center = entity.shape.center();
    let local = center + entity.world_to_local_vec(pos - center);

    match &entity.shape {
        Shape::Rect { .. } | Shape::Text { .. } => entity.shape.bounds().contains(local),
        Shape::Circle { cx, cy, rx, ry } => {
            if *rx <= 0.0 || *ry <= 0.0 {
                return false;
            }
            let nx = (local.x - cx) / rx;
            let ny = (local.y - cy) / ry;
            nx * nx + ny * ny <= 1.0
        }
        Shape::Line { start, end } => {
            point_to_segment_distance(
                local,
                egui::pos2(start.0, start.1),
                egui::pos2(end.0, end.1),
            ) <= pick_mm
        }
        Shape::Path { points } => points.windows(2).any(|w| {
            point_to_segment_distance(
                local,
                egui::pos2(w[0].0, w[0].1),
                egui::pos2(w[1].0, w[1].1),
            ) <= pick_mm
        }),
    }
}

/// Distance from a point to a line segment, via clamped projection.
fn point_to_segment_distance(point: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let seg = b - a;
    let to_point = point - a;
    let len_sq = seg.length_sq();
    if len_sq < 1e-6 {
        return to_point.length();
    }
    let t = (to_point.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).length()
}

/// One page of a multi-page project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Unique identifier.
    pub id: Uuid,
    /// User-displayable name.
    pub name: String,
    /// The page's document.
    pub model: DocumentModel,
}

impl Page {
    /// Creates a page with a fresh empty document.
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            model: DocumentModel::new(),
        }
    }
}

/// A whole project: pages plus measurement calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// At least one page always exists.
    pub pages: Vec<Page>,
    /// Index of the page being edited.
    pub active_page: usize,
    /// Measurement calibration for the uploaded floor-plan image.
    pub calibration: Calibration,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            pages: vec![Page::new("Page 1".to_string())],
            active_page: 0,
            calibration: Calibration::default(),
        }
    }
}

impl Project {
    /// The active page's document.
    pub fn model(&self) -> &DocumentModel {
        &self.pages[self.active_page].model
    }

    /// The active page's document, mutably.
    pub fn model_mut(&mut self) -> &mut DocumentModel {
        &mut self.pages[self.active_page].model
    }

    /// Appends a new page and switches to it. Returns its index.
    pub fn add_page(&mut self) -> usize {
        let n = self.pages.len() + 1;
        self.pages.push(Page::new(format!("Page {n}")));
        self.active_page = self.pages.len() - 1;
        self.active_page
    }

    /// Removes a page by index. The last remaining page cannot be removed.
    pub fn remove_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return false;
        }
        self.pages.remove(index);
        if self.active_page >= self.pages.len() {
            self.active_page = self.pages.len() - 1;
        }
        true
    }

    /// Switches the active page, ignoring out-of-range indices.
    pub fn set_active_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.active_page = index;
        }
    }

    /// Serializes the project to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a project from JSON, reseeding every page's history.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut project: Self = serde_json::from_str(json)?;
        if project.pages.is_empty() {
            project.pages.push(Page::new("Page 1".to_string()));
        }
        project.active_page = project.active_page.min(project.pages.len() - 1);
        for page in &mut project.pages {
            page.model.reset_history();
        }
        Ok(project)
    }

    /// Resets calibration and clears furniture on every page, since
    /// furniture positions are meaningless without a scale reference.
    pub fn reset_calibration(&mut self) {
        self.calibration.reset();
        for page in &mut self.pages {
            page.model.clear_furniture();
            page.model.commit();
        }
    }
}
