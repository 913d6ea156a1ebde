//! Shared application-wide constants.
//! Centralizes tweakable values used across the geometry core and the UI.

// Geometry
/// Minimum width/height (or diameter) of any resizable object, in mm.
/// Every resize clamps to this floor so objects can never degenerate.
pub const MIN_SIZE_MM: f32 = 100.0;
/// Default footprint for newly placed furniture, in mm.
pub const DEFAULT_FURNITURE_SIZE: (f32, f32) = (600.0, 600.0);
/// Rotation step applied to furniture by the rotate action, in degrees.
pub const FURNITURE_ROTATION_STEP: f32 = 90.0;

// Grid
/// Default grid cell size in document mm.
pub const DEFAULT_GRID_SIZE_MM: f32 = 50.0;

// Alignment guides
/// Snap threshold for smart alignment guides, in screen pixels.
/// Converted to mm at the current zoom before comparison.
pub const GUIDE_SNAP_THRESHOLD_PX: f32 = 6.0;

// Viewport
/// Default pixels-per-mm display scale at zoom 1.0.
pub const BASE_SCALE_PX_PER_MM: f32 = 0.5;
/// Zoom clamp range for the viewport.
pub const MIN_ZOOM: f32 = 0.1;
/// See [`MIN_ZOOM`].
pub const MAX_ZOOM: f32 = 5.0;

// Interactions
/// Nudge distance for arrow keys without modifiers, in mm.
/// (Shift-nudge moves by 1 mm for fine adjustment.)
pub const NUDGE_STEP_MM: f32 = 50.0;
/// Offset applied to duplicated entities so the copy is visible, in mm.
pub const DUPLICATE_OFFSET_MM: f32 = 200.0;
/// Pick radius for line/path/handle hit testing, in screen pixels.
pub const PICK_THRESHOLD_PX: f32 = 8.0;
/// Size of the square resize handles drawn on a selection, in screen pixels.
pub const HANDLE_SIZE_PX: f32 = 8.0;
/// Distance of the rotate handle above the selection's top edge, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f32 = 24.0;

// Undo/redo
/// Maximum number of history snapshots to retain.
pub const MAX_HISTORY_SNAPSHOTS: usize = 50;
