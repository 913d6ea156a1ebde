//! Core data types for the floorplan editor.
//!
//! This module defines the entity model: every placed object (a furniture
//! item or a drawing primitive) is an [`Entity`] wrapping a [`Shape`]
//! variant, plus rotation, layer membership, and a z-rank within its layer.
//! All geometry is in document millimeters.

use crate::constants::MIN_SIZE_MM;
use eframe::egui;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for entities.
pub type EntityId = Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// Which collection an entity belongs to.
///
/// Furniture items and drawing primitives live in the same store but keep
/// distinct interaction rules (furniture rotates in fixed steps and snaps to
/// the grid; drawing elements rotate freely and use alignment guides).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A furniture item placed over the floor plan.
    Furniture,
    /// A freehand drawing primitive (line, rectangle, circle, text, path).
    Drawing,
}

/// Geometry of a placed object, in document mm.
///
/// A tagged sum type so that translation, bounds, and center queries are
/// implemented once per variant instead of being re-branched at every call
/// site that manipulates geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle before rotation; `x,y` is the top-left corner.
    Rect {
        /// Top-left corner x in mm.
        x: f32,
        /// Top-left corner y in mm.
        y: f32,
        /// Width in mm, always >= [`MIN_SIZE_MM`] after any resize.
        width: f32,
        /// Height in mm.
        height: f32,
    },
    /// Ellipse anchored at its center.
    Circle {
        /// Center x in mm.
        cx: f32,
        /// Center y in mm.
        cy: f32,
        /// Horizontal radius in mm, always >= [`MIN_SIZE_MM`] after any resize.
        rx: f32,
        /// Vertical radius in mm.
        ry: f32,
    },
    /// Straight segment between two points.
    Line {
        /// Start point in mm.
        start: (f32, f32),
        /// End point in mm.
        end: (f32, f32),
    },
    /// Freehand polyline.
    Path {
        /// Ordered points in mm.
        points: Vec<(f32, f32)>,
    },
    /// Text anchored at a point.
    Text {
        /// Anchor x in mm.
        x: f32,
        /// Anchor y in mm.
        y: f32,
        /// Text content.
        content: String,
        /// Font size in mm.
        font_size: f32,
    },
}

impl Shape {
    /// Translates the shape by a delta in mm. Implemented once here so drag,
    /// nudge, and duplicate never branch on the variant themselves.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        match self {
            Shape::Rect { x, y, .. } | Shape::Text { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Shape::Circle { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Shape::Line { start, end } => {
                start.0 += dx;
                start.1 += dy;
                end.0 += dx;
                end.1 += dy;
            }
            Shape::Path { points } => {
                for p in points {
                    p.0 += dx;
                    p.1 += dy;
                }
            }
        }
    }

    /// Axis-aligned bounding box in mm, ignoring rotation.
    pub fn bounds(&self) -> egui::Rect {
        match self {
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => egui::Rect::from_min_size(egui::pos2(*x, *y), egui::vec2(*width, *height)),
            Shape::Circle { cx, cy, rx, ry } => {
                egui::Rect::from_center_size(egui::pos2(*cx, *cy), egui::vec2(rx * 2.0, ry * 2.0))
            }
            Shape::Line { start, end } => egui::Rect::from_two_pos(
                egui::pos2(start.0, start.1),
                egui::pos2(end.0, end.1),
            ),
            Shape::Path { points } => {
                let mut rect = egui::Rect::NOTHING;
                for p in points {
                    rect.extend_with(egui::pos2(p.0, p.1));
                }
                rect
            }
            Shape::Text {
                x, y, font_size, ..
            } => {
                // Nominal box; actual glyph metrics are a rendering concern.
                egui::Rect::from_min_size(egui::pos2(*x, *y), egui::vec2(font_size * 4.0, *font_size))
            }
        }
    }

    /// Center of the shape in mm.
    pub fn center(&self) -> egui::Pos2 {
        self.bounds().center()
    }

    /// Moves the shape so its center lands on `center`, preserving size.
    pub fn set_center(&mut self, center: egui::Pos2) {
        let delta = center - self.center();
        self.translate(delta.x, delta.y);
    }

    /// The anchor position used for drag math: top-left for rects and text,
    /// center for circles, bounding-box min for lines and paths.
    pub fn position(&self) -> egui::Pos2 {
        match self {
            Shape::Rect { x, y, .. } | Shape::Text { x, y, .. } => egui::pos2(*x, *y),
            Shape::Circle { cx, cy, .. } => egui::pos2(*cx, *cy),
            Shape::Line { .. } | Shape::Path { .. } => self.bounds().min,
        }
    }

    /// Moves the shape's anchor (see [`Self::position`]) to `pos`.
    pub fn set_position(&mut self, pos: egui::Pos2) {
        let delta = pos - self.position();
        self.translate(delta.x, delta.y);
    }

    /// Width/height of the shape in mm (bounding box for lines and paths).
    pub fn size(&self) -> egui::Vec2 {
        self.bounds().size()
    }

    /// Sets the size in the shape's local frame, clamping to the minimum
    /// floor for resizable variants. Circle radii themselves honor the
    /// floor, so a circle's minimum diameter is twice the rect minimum.
    /// Lines, paths, and text keep their geometry (they are resized by
    /// endpoint/anchor editing instead).
    pub fn set_size(&mut self, size: egui::Vec2) {
        match self {
            Shape::Rect { width, height, .. } => {
                *width = size.x.max(MIN_SIZE_MM);
                *height = size.y.max(MIN_SIZE_MM);
            }
            Shape::Circle { rx, ry, .. } => {
                *rx = (size.x / 2.0).max(MIN_SIZE_MM);
                *ry = (size.y / 2.0).max(MIN_SIZE_MM);
            }
            Shape::Line { .. } | Shape::Path { .. } | Shape::Text { .. } => {}
        }
    }

    /// Smallest size (width, height) `set_size` will accept for this shape.
    pub fn min_size(&self) -> egui::Vec2 {
        match self {
            Shape::Circle { .. } => egui::vec2(2.0 * MIN_SIZE_MM, 2.0 * MIN_SIZE_MM),
            _ => egui::vec2(MIN_SIZE_MM, MIN_SIZE_MM),
        }
    }

    /// Whether the shape supports handle-based resizing.
    pub fn is_resizable(&self) -> bool {
        matches!(self, Shape::Rect { .. } | Shape::Circle { .. })
    }
}

/// A placed, manipulable object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// User-displayable name ("Sofa", "Wall note", ...).
    pub name: String,
    /// Which collection this entity belongs to.
    pub kind: EntityKind,
    /// Geometry in document mm.
    pub shape: Shape,
    /// Rotation in degrees, normalized to [0, 360).
    pub rotation: f32,
    /// The layer this entity belongs to (by reference).
    pub layer_id: LayerId,
    /// Z-rank within the layer; higher draws on top.
    pub order: f32,
}

impl Entity {
    /// Creates a new entity with a fresh id and zero rotation.
    pub fn new(name: String, kind: EntityKind, shape: Shape, layer_id: LayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind,
            shape,
            rotation: 0.0,
            layer_id,
            order: 0.0,
        }
    }

    /// Sets the rotation, normalized into [0, 360). NaN is ignored so a bad
    /// pointer-angle computation can never poison stored state.
    pub fn set_rotation(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.rotation = degrees.rem_euclid(360.0);
        }
    }

    /// Rotates the entity's local-frame vector `v` into world space.
    pub fn local_to_world_vec(&self, v: egui::Vec2) -> egui::Vec2 {
        let a = self.rotation.to_radians();
        let (sin, cos) = a.sin_cos();
        egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }

    /// Rotates a world-space vector into the entity's local frame.
    pub fn world_to_local_vec(&self, v: egui::Vec2) -> egui::Vec2 {
        let a = (-self.rotation).to_radians();
        let (sin, cos) = a.sin_cos();
        egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }
}

/// A named, orderable grouping controlling draw order and bulk visibility.
///
/// Layers contain entities only by reference: entities carry a `layer_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    /// Unique identifier.
    pub id: LayerId,
    /// User-displayable name.
    pub name: String,
    /// Whether member entities are drawn.
    pub visible: bool,
    /// Locked layers are excluded from hit testing and guide matching.
    pub locked: bool,
    /// Stacking rank; higher draws on top. Treated as a float ranking, not
    /// contiguous integers — reorder ops swap or extend, never renumber.
    pub order: f32,
    /// Opacity in percent, 0..=100.
    pub opacity: u8,
    /// Optional color tag shown in the layer list.
    pub color: Option<[u8; 3]>,
}

impl Layer {
    /// Creates a visible, unlocked layer at the given stacking rank.
    pub fn new(name: String, order: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            visible: true,
            locked: false,
            order,
            opacity: 100,
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Shape {
        Shape::Rect {
            x,
            y,
            width: w,
            height: h,
        }
    }

    #[test]
    fn test_entity_creation() {
        let layer = Layer::new("Base".into(), 0.0);
        let e = Entity::new(
            "Sofa".into(),
            EntityKind::Furniture,
            rect(1000.0, 1000.0, 200.0, 100.0),
            layer.id,
        );
        assert_eq!(e.name, "Sofa");
        assert_eq!(e.rotation, 0.0);
        assert_eq!(e.layer_id, layer.id);
        assert!(!e.id.is_nil());
    }

    #[test]
    fn test_translate_rect_and_circle() {
        let mut r = rect(10.0, 20.0, 200.0, 100.0);
        r.translate(5.0, -5.0);
        assert_eq!(r.position(), egui::pos2(15.0, 15.0));

        let mut c = Shape::Circle {
            cx: 0.0,
            cy: 0.0,
            rx: 100.0,
            ry: 50.0,
        };
        c.translate(10.0, 10.0);
        assert_eq!(c.center(), egui::pos2(10.0, 10.0));
    }

    #[test]
    fn test_translate_path_moves_every_point() {
        let mut p = Shape::Path {
            points: vec![(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)],
        };
        p.translate(100.0, 200.0);
        if let Shape::Path { points } = &p {
            assert_eq!(points[0], (100.0, 200.0));
            assert_eq!(points[2], (120.0, 200.0));
        } else {
            panic!("expected path");
        }
    }

    #[test]
    fn test_translate_ignores_nan_delta() {
        let mut r = rect(10.0, 20.0, 200.0, 100.0);
        r.translate(f32::NAN, 5.0);
        assert_eq!(r.position(), egui::pos2(10.0, 20.0));
    }

    #[test]
    fn test_line_bounds() {
        let l = Shape::Line {
            start: (100.0, 300.0),
            end: (-50.0, 20.0),
        };
        let b = l.bounds();
        assert_eq!(b.min, egui::pos2(-50.0, 20.0));
        assert_eq!(b.max, egui::pos2(100.0, 300.0));
    }

    #[test]
    fn test_set_size_enforces_minimum_floor() {
        let mut r = rect(0.0, 0.0, 200.0, 100.0);
        r.set_size(egui::vec2(10.0, -50.0));
        assert_eq!(r.size(), egui::vec2(MIN_SIZE_MM, MIN_SIZE_MM));

        let mut c = Shape::Circle {
            cx: 0.0,
            cy: 0.0,
            rx: 100.0,
            ry: 100.0,
        };
        // Circle radii, not diameters, stop at the floor.
        c.set_size(egui::vec2(0.0, 0.0));
        if let Shape::Circle { rx, ry, .. } = &c {
            assert_eq!((*rx, *ry), (MIN_SIZE_MM, MIN_SIZE_MM));
        } else {
            panic!("expected circle");
        }
        assert_eq!(c.size(), egui::vec2(2.0 * MIN_SIZE_MM, 2.0 * MIN_SIZE_MM));
        assert_eq!(c.min_size(), c.size());
    }

    #[test]
    fn test_rotation_normalizes_to_0_360() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "A".into(),
            EntityKind::Furniture,
            rect(0.0, 0.0, 200.0, 100.0),
            layer.id,
        );
        e.set_rotation(450.0);
        assert_eq!(e.rotation, 90.0);
        e.set_rotation(-90.0);
        assert_eq!(e.rotation, 270.0);
        e.set_rotation(f32::NAN);
        assert_eq!(e.rotation, 270.0);
    }

    #[test]
    fn test_local_world_vec_round_trip() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "A".into(),
            EntityKind::Drawing,
            rect(0.0, 0.0, 200.0, 100.0),
            layer.id,
        );
        e.set_rotation(37.0);
        let v = egui::vec2(123.0, -45.0);
        let back = e.world_to_local_vec(e.local_to_world_vec(v));
        assert!((back.x - v.x).abs() < 1e-3);
        assert!((back.y - v.y).abs() < 1e-3);
    }

    #[test]
    fn test_rotating_90_maps_local_x_to_world_y() {
        let layer = Layer::new("Base".into(), 0.0);
        let mut e = Entity::new(
            "A".into(),
            EntityKind::Furniture,
            rect(0.0, 0.0, 200.0, 100.0),
            layer.id,
        );
        e.set_rotation(90.0);
        let w = e.local_to_world_vec(egui::vec2(1.0, 0.0));
        assert!(w.x.abs() < 1e-6);
        assert!((w.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_serialization_round_trip() {
        let layer = Layer::new("Base".into(), 0.0);
        let e = Entity::new(
            "Desk".into(),
            EntityKind::Furniture,
            rect(1000.0, 1000.0, 200.0, 100.0),
            layer.id,
        );
        let json = serde_json::to_string(&e).unwrap();
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
