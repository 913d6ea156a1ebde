//! The object manipulation state machine.
//!
//! One gesture (drag, resize, rotate, endpoint drag) is active at a time,
//! driven by pointer events already converted to document mm. Geometry
//! commits on every pointer move for live feedback; the caller records one
//! history snapshot at gesture end. Escape reverts to the pre-gesture
//! geometry, which is captured verbatim when the gesture starts.
//!
//! Resize deltas are computed in the object's local axis-aligned frame, not
//! screen space: the world-space pointer delta is rotated by `-rotation`
//! before being applied to width/height, and the resulting center shift is
//! rotated back. This is what keeps a rotated rectangle's opposite edge
//! fixed while its near edge follows the pointer.

use crate::guides::{self, GuideAxis, GuideLine};
use crate::snap;
use crate::types::{Entity, EntityId, EntityKind, Shape};
use eframe::egui;

/// The eight resize handles, named by compass direction in the object's
/// local (unrotated) frame. Y grows downward, so `N` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Top edge.
    N,
    /// Bottom edge.
    S,
    /// Right edge.
    E,
    /// Left edge.
    W,
    /// Top-right corner.
    Ne,
    /// Top-left corner.
    Nw,
    /// Bottom-right corner.
    Se,
    /// Bottom-left corner.
    Sw,
}

impl ResizeHandle {
    /// All handles, in rendering order.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Nw,
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
    ];

    /// Per-axis signs: which local direction grows the size.
    /// `(+1, 0)` for E means dragging local +x widens; 0 means the axis is
    /// untouched by this handle.
    pub fn signs(self) -> (f32, f32) {
        match self {
            ResizeHandle::N => (0.0, -1.0),
            ResizeHandle::S => (0.0, 1.0),
            ResizeHandle::E => (1.0, 0.0),
            ResizeHandle::W => (-1.0, 0.0),
            ResizeHandle::Ne => (1.0, -1.0),
            ResizeHandle::Nw => (-1.0, -1.0),
            ResizeHandle::Se => (1.0, 1.0),
            ResizeHandle::Sw => (-1.0, 1.0),
        }
    }

    /// The handle's position on an unrotated bounding rect (edge midpoints
    /// for edge handles, corners for corner handles). Used for both drawing
    /// and hit testing; callers rotate the result about the rect center.
    pub fn anchor_on(self, rect: egui::Rect) -> egui::Pos2 {
        let c = rect.center();
        match self {
            ResizeHandle::N => egui::pos2(c.x, rect.min.y),
            ResizeHandle::S => egui::pos2(c.x, rect.max.y),
            ResizeHandle::E => egui::pos2(rect.max.x, c.y),
            ResizeHandle::W => egui::pos2(rect.min.x, c.y),
            ResizeHandle::Ne => egui::pos2(rect.max.x, rect.min.y),
            ResizeHandle::Nw => rect.min,
            ResizeHandle::Se => rect.max,
            ResizeHandle::Sw => egui::pos2(rect.min.x, rect.max.y),
        }
    }
}

/// Snapping configuration for the currently active gesture.
#[derive(Debug, Clone, Copy)]
pub struct SnapContext {
    /// Whether grid snapping is on.
    pub grid_enabled: bool,
    /// Grid cell size in mm.
    pub grid_size: f32,
    /// Alignment-guide threshold in mm (pixel threshold over current zoom).
    pub guide_threshold_mm: f32,
}

/// The interaction state machine. `Idle` between gestures; every non-idle
/// variant carries a verbatim copy of the entity at gesture start so Escape
/// can revert and the end-of-gesture commit can detect no-op edits.
#[derive(Debug, Clone, Default)]
pub enum Manipulation {
    /// No gesture active.
    #[default]
    Idle,
    /// Moving a whole entity.
    Dragging {
        /// Target entity.
        id: EntityId,
        /// `entity_position - pointer_mm` at gesture start, so the object
        /// does not jump to the pointer.
        grab_offset: egui::Vec2,
        /// Pre-gesture state for cancel.
        start: Box<Entity>,
    },
    /// Moving one endpoint of a line.
    DraggingEndpoint {
        /// Target entity.
        id: EntityId,
        /// 0 = start point, 1 = end point.
        endpoint: usize,
        /// Pre-gesture state for cancel.
        start: Box<Entity>,
    },
    /// Resizing via one of the eight handles.
    Resizing {
        /// Target entity.
        id: EntityId,
        /// Which handle was grabbed.
        handle: ResizeHandle,
        /// Pointer position at gesture start, in mm.
        start_pointer: egui::Pos2,
        /// Pre-gesture state for cancel and delta math.
        start: Box<Entity>,
    },
    /// Rotating by continuous pointer-angle tracking.
    Rotating {
        /// Target entity.
        id: EntityId,
        /// Pointer angle about the center at gesture start, in degrees.
        start_angle: f32,
        /// Pre-gesture state for cancel.
        start: Box<Entity>,
    },
}

impl Manipulation {
    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, Manipulation::Idle)
    }

    /// The entity being manipulated, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Manipulation::Idle => None,
            Manipulation::Dragging { id, .. }
            | Manipulation::DraggingEndpoint { id, .. }
            | Manipulation::Resizing { id, .. }
            | Manipulation::Rotating { id, .. } => Some(*id),
        }
    }

    /// Starts a drag. A gesture that is somehow still active (a missed
    /// pointer-up) is implicitly ended first; the new pointer-down wins.
    pub fn begin_drag(&mut self, entity: &Entity, pointer_mm: egui::Pos2) {
        *self = Manipulation::Dragging {
            id: entity.id,
            grab_offset: entity.shape.position() - pointer_mm,
            start: Box::new(entity.clone()),
        };
    }

    /// Starts dragging a line endpoint (0 = start, 1 = end).
    pub fn begin_endpoint_drag(&mut self, entity: &Entity, endpoint: usize) {
        *self = Manipulation::DraggingEndpoint {
            id: entity.id,
            endpoint: endpoint.min(1),
            start: Box::new(entity.clone()),
        };
    }

    /// Starts a resize from the given handle.
    pub fn begin_resize(&mut self, entity: &Entity, handle: ResizeHandle, pointer_mm: egui::Pos2) {
        *self = Manipulation::Resizing {
            id: entity.id,
            handle,
            start_pointer: pointer_mm,
            start: Box::new(entity.clone()),
        };
    }

    /// Starts a continuous rotation gesture.
    pub fn begin_rotate(&mut self, entity: &Entity, pointer_mm: egui::Pos2) {
        *self = Manipulation::Rotating {
            id: entity.id,
            start_angle: pointer_angle(entity.shape.center(), pointer_mm),
            start: Box::new(entity.clone()),
        };
    }

    /// Applies a pointer move to the entity, returning alignment guides to
    /// draw (only drags and resizes of drawing elements produce any).
    ///
    /// `guide_candidates` are the bounds of all other visible, non-locked
    /// entities. The entity passed must be the gesture's target; moves for
    /// anything else are ignored.
    pub fn update(
        &self,
        entity: &mut Entity,
        pointer_mm: egui::Pos2,
        snap_ctx: &SnapContext,
        guide_candidates: &[egui::Rect],
    ) -> Vec<GuideLine> {
        if self.target() != Some(entity.id)
            || !pointer_mm.x.is_finite()
            || !pointer_mm.y.is_finite()
        {
            return Vec::new();
        }

        match self {
            Manipulation::Idle => Vec::new(),
            Manipulation::Dragging { grab_offset, .. } => {
                drag_to(entity, pointer_mm + *grab_offset, snap_ctx, guide_candidates)
            }
            Manipulation::DraggingEndpoint { endpoint, .. } => {
                let p = snap::snap_point(
                    pointer_mm.x,
                    pointer_mm.y,
                    snap_ctx.grid_size,
                    snap_ctx.grid_enabled,
                );
                if let Shape::Line { start, end } = &mut entity.shape {
                    if *endpoint == 0 {
                        *start = p;
                    } else {
                        *end = p;
                    }
                }
                Vec::new()
            }
            Manipulation::Resizing {
                handle,
                start_pointer,
                start,
                ..
            } => resize_to(
                entity,
                start,
                *handle,
                pointer_mm - *start_pointer,
                snap_ctx,
                guide_candidates,
            ),
            Manipulation::Rotating {
                start_angle, start, ..
            } => {
                let angle = pointer_angle(start.shape.center(), pointer_mm);
                entity.set_rotation(start.rotation + (angle - start_angle));
                Vec::new()
            }
        }
    }

    /// Ends the gesture normally (pointer-up, pointer-cancel, window blur).
    /// Returns the id whose edit the caller should commit to history.
    pub fn finish(&mut self) -> Option<EntityId> {
        let id = self.target();
        *self = Manipulation::Idle;
        id
    }

    /// Cancels the gesture (Escape), returning the pre-gesture entity the
    /// caller must restore verbatim.
    pub fn cancel(&mut self) -> Option<Entity> {
        let start = match std::mem::take(self) {
            Manipulation::Idle => None,
            Manipulation::Dragging { start, .. }
            | Manipulation::DraggingEndpoint { start, .. }
            | Manipulation::Resizing { start, .. }
            | Manipulation::Rotating { start, .. } => Some(*start),
        };
        start
    }
}

/// Moves the entity's anchor to `target`, applying grid snap (furniture) or
/// grid-then-alignment-guide snap (drawing elements).
fn drag_to(
    entity: &mut Entity,
    target: egui::Pos2,
    snap_ctx: &SnapContext,
    guide_candidates: &[egui::Rect],
) -> Vec<GuideLine> {
    let (gx, gy) = snap::snap_point(
        target.x,
        target.y,
        snap_ctx.grid_size,
        snap_ctx.grid_enabled,
    );
    let mut pos = egui::pos2(gx, gy);

    if entity.kind == EntityKind::Furniture {
        entity.shape.set_position(pos);
        return Vec::new();
    }

    // Drawing elements: alignment guides may override the grid per axis.
    let mut probe = entity.shape.clone();
    probe.set_position(pos);
    let snap = guides::compute_snap(probe.bounds(), guide_candidates, snap_ctx.guide_threshold_mm);
    if let Some(dx) = snap.dx {
        pos.x += dx;
    }
    if let Some(dy) = snap.dy {
        pos.y += dy;
    }
    entity.shape.set_position(pos);
    snap.guides
}

/// Applies a resize: the world-space pointer delta is rotated into the
/// object's local frame, applied to the size with the minimum floor, and the
/// induced center shift is rotated back into world space so the edge or
/// corner opposite the handle stays fixed.
///
/// For unrotated drawing elements the dragged edge(s) also consult the
/// alignment guides, mirroring [`drag_to`]; the matched guide lines are
/// returned for the UI to draw.
fn resize_to(
    entity: &mut Entity,
    start: &Entity,
    handle: ResizeHandle,
    world_delta: egui::Vec2,
    snap_ctx: &SnapContext,
    guide_candidates: &[egui::Rect],
) -> Vec<GuideLine> {
    if !start.shape.is_resizable() {
        return Vec::new();
    }

    let local_delta = start.world_to_local_vec(world_delta);
    let (sx, sy) = handle.signs();
    let start_size = start.shape.size();
    let min = start.shape.min_size();

    let mut new_w = start_size.x + sx * local_delta.x;
    let mut new_h = start_size.y + sy * local_delta.y;
    if snap_ctx.grid_enabled && entity.kind == EntityKind::Furniture {
        if sx != 0.0 {
            new_w = snap::snap_to_grid(new_w, snap_ctx.grid_size, true);
        }
        if sy != 0.0 {
            new_h = snap::snap_to_grid(new_h, snap_ctx.grid_size, true);
        }
    }
    if !new_w.is_finite() || !new_h.is_finite() {
        return Vec::new();
    }
    new_w = new_w.max(min.x);
    new_h = new_h.max(min.y);

    // Only the dragged edge participates in guide snapping; the anchor
    // edge stays put, so a snap just adjusts the size. Rotated objects are
    // skipped since their edges no longer align with the guide axes.
    let mut guide_lines = Vec::new();
    if entity.kind == EntityKind::Drawing && start.rotation == 0.0 {
        let b = start.shape.bounds();
        if sx != 0.0 {
            let edge = if sx > 0.0 { b.min.x + new_w } else { b.max.x - new_w };
            if let Some((delta, guide)) = guides::snap_edge(
                GuideAxis::Vertical,
                edge,
                (b.min.y, b.max.y),
                guide_candidates,
                snap_ctx.guide_threshold_mm,
            ) {
                let adjusted = new_w + sx * delta;
                if adjusted >= min.x {
                    new_w = adjusted;
                    guide_lines.push(guide);
                }
            }
        }
        if sy != 0.0 {
            let edge = if sy > 0.0 { b.min.y + new_h } else { b.max.y - new_h };
            if let Some((delta, guide)) = guides::snap_edge(
                GuideAxis::Horizontal,
                edge,
                (b.min.x, b.max.x),
                guide_candidates,
                snap_ctx.guide_threshold_mm,
            ) {
                let adjusted = new_h + sy * delta;
                if adjusted >= min.y {
                    new_h = adjusted;
                    guide_lines.push(guide);
                }
            }
        }
    }

    // Effective size change after clamping; the grabbed edge moves by the
    // full change, so the center moves by half of it, toward the handle.
    let dw = new_w - start_size.x;
    let dh = new_h - start_size.y;
    let local_shift = egui::vec2(sx * dw * 0.5, sy * dh * 0.5);
    let world_shift = start.local_to_world_vec(local_shift);

    entity.shape = start.shape.clone();
    entity.shape.set_size(egui::vec2(new_w, new_h));
    entity.shape.set_center(start.shape.center() + world_shift);
    guide_lines
}

/// Angle of the pointer about a center, in degrees.
fn pointer_angle(center: egui::Pos2, pointer: egui::Pos2) -> f32 {
    let v = pointer - center;
    v.y.atan2(v.x).to_degrees()
}

/// Rotates furniture by the fixed UI step, normalized to [0, 360).
pub fn rotate_step(entity: &mut Entity, step_degrees: f32) {
    entity.set_rotation(entity.rotation + step_degrees);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MIN_SIZE_MM;
    use crate::types::Layer;

    fn no_snap() -> SnapContext {
        SnapContext {
            grid_enabled: false,
            grid_size: 50.0,
            guide_threshold_mm: 0.0,
        }
    }

    fn grid_snap(size: f32) -> SnapContext {
        SnapContext {
            grid_enabled: true,
            grid_size: size,
            guide_threshold_mm: 0.0,
        }
    }

    fn rect_entity(kind: EntityKind, x: f32, y: f32, w: f32, h: f32) -> Entity {
        let layer = Layer::new("Base".into(), 0.0);
        Entity::new(
            "Box".into(),
            kind,
            Shape::Rect {
                x,
                y,
                width: w,
                height: h,
            },
            layer.id,
        )
    }

    fn rect_parts(e: &Entity) -> (f32, f32, f32, f32) {
        match e.shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => (x, y, width, height),
            _ => panic!("expected rect"),
        }
    }

    #[test]
    fn test_drag_applies_grab_offset() {
        let mut e = rect_entity(EntityKind::Furniture, 1000.0, 1000.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        // Grab at the middle of the object, not its corner.
        gesture.begin_drag(&e, egui::pos2(1100.0, 1050.0));
        gesture.update(&mut e, egui::pos2(1100.0, 1050.0), &no_snap(), &[]);
        // No movement yet: the object must not jump to the pointer.
        assert_eq!(e.shape.position(), egui::pos2(1000.0, 1000.0));

        gesture.update(&mut e, egui::pos2(1250.0, 1000.0), &no_snap(), &[]);
        assert_eq!(e.shape.position(), egui::pos2(1150.0, 950.0));
    }

    #[test]
    fn test_furniture_drag_snaps_to_grid() {
        let mut e = rect_entity(EntityKind::Furniture, 1000.0, 1000.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        gesture.begin_drag(&e, egui::pos2(1000.0, 1000.0));
        gesture.update(&mut e, egui::pos2(1151.0, 948.0), &grid_snap(50.0), &[]);
        assert_eq!(e.shape.position(), egui::pos2(1150.0, 950.0));
    }

    #[test]
    fn test_drawing_drag_snaps_to_guides() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 500.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();
        let others = [egui::Rect::from_min_size(
            egui::pos2(300.0, 0.0),
            egui::vec2(100.0, 100.0),
        )];
        let ctx = SnapContext {
            grid_enabled: false,
            grid_size: 50.0,
            guide_threshold_mm: 5.0,
        };

        gesture.begin_drag(&e, egui::pos2(0.0, 500.0));
        // Candidate left edge lands at 297, 3mm from the static edge at 300.
        let guides = gesture.update(&mut e, egui::pos2(297.0, 500.0), &ctx, &others);
        assert_eq!(e.shape.position().x, 300.0);
        assert_eq!(guides.len(), 1);
    }

    #[test]
    fn test_east_resize_at_zero_rotation_changes_width_only() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        gesture.begin_resize(&e, ResizeHandle::E, egui::pos2(200.0, 50.0));
        gesture.update(&mut e, egui::pos2(250.0, 50.0), &no_snap(), &[]);

        let (x, y, w, h) = rect_parts(&e);
        assert_eq!((w, h), (250.0, 100.0));
        // West edge fixed at x = 0.
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn test_same_screen_drag_on_rotated_rect_changes_height() {
        // The same screen-right drag on the 90-degree-rotated
        // rectangle must change the local height, not the width, with the
        // opposite (screen-west) edge held fixed.
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 100.0);
        e.set_rotation(90.0);
        let mut gesture = Manipulation::default();

        // At 90 degrees, the handle facing screen-east is the local N handle.
        gesture.begin_resize(&e, ResizeHandle::N, egui::pos2(150.0, 50.0));
        gesture.update(&mut e, egui::pos2(200.0, 50.0), &no_snap(), &[]);

        let (_, _, w, h) = rect_parts(&e);
        assert_eq!(w, 200.0);
        assert_eq!(h, 150.0);

        // Opposite edge fixed: pre-gesture the rotated rect spans x in
        // [50, 150] about center (100, 50); growing 50mm eastward moves the
        // center east by 25 and leaves the west edge at x = 50.
        let center = e.shape.center();
        assert!((center.x - 125.0).abs() < 1e-3, "center.x = {}", center.x);
        assert!((center.y - 50.0).abs() < 1e-3);
        // World-space west edge of the rotated rect = center.x - h/2.
        assert!((center.x - h / 2.0 - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_west_resize_keeps_east_edge_fixed() {
        let mut e = rect_entity(EntityKind::Drawing, 100.0, 0.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        gesture.begin_resize(&e, ResizeHandle::W, egui::pos2(100.0, 50.0));
        gesture.update(&mut e, egui::pos2(50.0, 50.0), &no_snap(), &[]);

        let (x, _, w, _) = rect_parts(&e);
        assert_eq!(w, 250.0);
        assert_eq!(x, 50.0);
        // East edge unchanged at 300.
        assert_eq!(x + w, 300.0);
    }

    #[test]
    fn test_corner_resize_changes_both_axes() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        gesture.begin_resize(&e, ResizeHandle::Se, egui::pos2(200.0, 100.0));
        gesture.update(&mut e, egui::pos2(240.0, 130.0), &no_snap(), &[]);

        let (x, y, w, h) = rect_parts(&e);
        assert_eq!((w, h), (240.0, 130.0));
        assert_eq!((x, y), (0.0, 0.0)); // NW corner anchored
    }

    #[test]
    fn test_resize_clamps_to_minimum_floor() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 150.0);
        let mut gesture = Manipulation::default();

        // Drag the SE corner far past the NW corner.
        gesture.begin_resize(&e, ResizeHandle::Se, egui::pos2(200.0, 150.0));
        gesture.update(&mut e, egui::pos2(-500.0, -500.0), &no_snap(), &[]);

        let (_, _, w, h) = rect_parts(&e);
        assert_eq!((w, h), (MIN_SIZE_MM, MIN_SIZE_MM));

        // And every later frame keeps honoring the floor.
        gesture.update(&mut e, egui::pos2(-900.0, 140.0), &no_snap(), &[]);
        let (_, _, w, h) = rect_parts(&e);
        assert_eq!(w, MIN_SIZE_MM);
        assert!(h >= MIN_SIZE_MM);
    }

    #[test]
    fn test_circle_resize_keeps_radii_at_floor() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "Rug".into(),
            EntityKind::Drawing,
            Shape::Circle {
                cx: 500.0,
                cy: 500.0,
                rx: 200.0,
                ry: 200.0,
            },
            layer.id,
        );
        let mut gesture = Manipulation::default();

        // Drag the SE handle far past the center: the radii themselves
        // must stop at the floor, not the half-floor.
        gesture.begin_resize(&e, ResizeHandle::Se, egui::pos2(700.0, 700.0));
        gesture.update(&mut e, egui::pos2(-900.0, -900.0), &no_snap(), &[]);

        if let Shape::Circle { rx, ry, .. } = e.shape {
            assert_eq!((rx, ry), (MIN_SIZE_MM, MIN_SIZE_MM));
        } else {
            panic!("expected circle");
        }
    }

    #[test]
    fn test_resize_snaps_dragged_edge_to_guide() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 100.0);
        let other = egui::Rect::from_min_size(egui::pos2(297.0, 500.0), egui::vec2(100.0, 50.0));
        let ctx = SnapContext {
            grid_enabled: false,
            grid_size: 50.0,
            guide_threshold_mm: 5.0,
        };
        let mut gesture = Manipulation::default();

        // Drag the east edge from 200 to 294, 3 shy of the other rect's
        // left edge at 297: the dragged edge snaps onto it while the west
        // edge stays anchored.
        gesture.begin_resize(&e, ResizeHandle::E, egui::pos2(200.0, 50.0));
        let guides = gesture.update(&mut e, egui::pos2(294.0, 50.0), &ctx, &[other]);

        let (x, _, w, _) = rect_parts(&e);
        assert_eq!(x, 0.0);
        assert_eq!(w, 297.0);
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].axis, GuideAxis::Vertical);
        assert_eq!(guides[0].position, 297.0);
    }

    #[test]
    fn test_circle_resize_via_east_handle() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "Table".into(),
            EntityKind::Furniture,
            Shape::Circle {
                cx: 500.0,
                cy: 500.0,
                rx: 100.0,
                ry: 100.0,
            },
            layer.id,
        );
        let mut gesture = Manipulation::default();

        gesture.begin_resize(&e, ResizeHandle::E, egui::pos2(600.0, 500.0));
        gesture.update(&mut e, egui::pos2(650.0, 500.0), &no_snap(), &[]);

        if let Shape::Circle { cx, cy, rx, ry } = e.shape {
            assert_eq!(rx, 125.0);
            assert_eq!(ry, 100.0);
            // West extreme stays at 400: center shifted east by 25.
            assert_eq!(cx - rx, 400.0);
            assert_eq!(cy, 500.0);
        } else {
            panic!("expected circle");
        }
    }

    #[test]
    fn test_line_endpoint_drag() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "Wall".into(),
            EntityKind::Drawing,
            Shape::Line {
                start: (0.0, 0.0),
                end: (1000.0, 0.0),
            },
            layer.id,
        );
        let mut gesture = Manipulation::default();

        gesture.begin_endpoint_drag(&e, 1);
        gesture.update(&mut e, egui::pos2(1203.0, 398.0), &grid_snap(50.0), &[]);

        if let Shape::Line { start, end } = e.shape {
            assert_eq!(start, (0.0, 0.0));
            assert_eq!(end, (1200.0, 400.0));
        } else {
            panic!("expected line");
        }
    }

    #[test]
    fn test_continuous_rotation_tracks_pointer() {
        let mut e = rect_entity(EntityKind::Drawing, 0.0, 0.0, 200.0, 100.0);
        let center = e.shape.center(); // (100, 50)
        let mut gesture = Manipulation::default();

        // Start east of the center, move to south of it: +90 degrees (y down).
        gesture.begin_rotate(&e, center + egui::vec2(100.0, 0.0));
        gesture.update(&mut e, center + egui::vec2(0.0, 100.0), &no_snap(), &[]);
        assert!((e.rotation - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotate_step_wraps() {
        let mut e = rect_entity(EntityKind::Furniture, 0.0, 0.0, 200.0, 100.0);
        e.set_rotation(270.0);
        rotate_step(&mut e, 90.0);
        assert_eq!(e.rotation, 0.0);
    }

    #[test]
    fn test_escape_cancel_restores_start_geometry() {
        let mut e = rect_entity(EntityKind::Furniture, 1000.0, 1000.0, 200.0, 100.0);
        let original = e.clone();
        let mut gesture = Manipulation::default();

        gesture.begin_drag(&e, egui::pos2(1000.0, 1000.0));
        gesture.update(&mut e, egui::pos2(1500.0, 1500.0), &no_snap(), &[]);
        assert_ne!(e.shape.position(), original.shape.position());

        let restored = gesture.cancel().expect("gesture was active");
        assert_eq!(restored, original);
        assert!(!gesture.is_active());
    }

    #[test]
    fn test_finish_returns_target_and_goes_idle() {
        let mut e = rect_entity(EntityKind::Furniture, 0.0, 0.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();
        gesture.begin_drag(&e, egui::pos2(0.0, 0.0));
        assert!(gesture.is_active());

        assert_eq!(gesture.finish(), Some(e.id));
        assert!(!gesture.is_active());
        assert_eq!(gesture.finish(), None);

        // A stale update after finish must not move anything.
        let before = e.shape.position();
        gesture.update(&mut e, egui::pos2(999.0, 999.0), &no_snap(), &[]);
        assert_eq!(e.shape.position(), before);
    }

    #[test]
    fn test_new_pointer_down_replaces_stuck_gesture() {
        let e1 = rect_entity(EntityKind::Furniture, 0.0, 0.0, 200.0, 100.0);
        let e2 = rect_entity(EntityKind::Furniture, 500.0, 0.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();

        gesture.begin_drag(&e1, egui::pos2(0.0, 0.0));
        // Pointer-up was missed; a new press on another entity takes over.
        gesture.begin_drag(&e2, egui::pos2(500.0, 0.0));
        assert_eq!(gesture.target(), Some(e2.id));
    }

    #[test]
    fn test_nan_pointer_is_ignored() {
        let mut e = rect_entity(EntityKind::Furniture, 1000.0, 1000.0, 200.0, 100.0);
        let mut gesture = Manipulation::default();
        gesture.begin_drag(&e, egui::pos2(1000.0, 1000.0));
        gesture.update(&mut e, egui::pos2(f32::NAN, 0.0), &no_snap(), &[]);
        assert_eq!(e.shape.position(), egui::pos2(1000.0, 1000.0));
    }
}
