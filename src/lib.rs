//! # Floorplan Tool
//!
//! A 2D floor-plan layout editor: place, move, resize, and rotate furniture
//! items and drawing primitives (lines, rectangles, circles, text, paths)
//! over a blank canvas, with grid snapping, smart alignment guides,
//! calibrated real-world measurement, multi-page documents, and layering.
//!
//! ## Features
//! - All geometry stored in document millimeters, independent of zoom/pan
//! - Rotation-aware resize handles (deltas applied in the object frame)
//! - Grid snapping plus smart alignment guides against nearby objects
//! - Bounded snapshot undo/redo with branch discard
//! - Layers with visibility, locking, opacity, and float z-ordering
//! - Multi-page projects serialized as plain JSON

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod constants;
mod document;
mod guides;
mod history;
mod manipulate;
mod selection;
mod snap;
mod transform;
mod types;
mod ui;
mod units;

// Re-export the core model and geometry types for library users.
pub use document::{DocumentModel, LayerOpError, Page, Project};
pub use guides::{GuideAxis, GuideLine, GuideSnap};
pub use history::{History, Snapshot};
pub use manipulate::{Manipulation, ResizeHandle, SnapContext};
pub use selection::{SelectedRef, Selection};
pub use transform::Viewport;
pub use types::{Entity, EntityId, EntityKind, Layer, LayerId, Shape};
pub use units::{mm_to_pixels, pixels_to_mm, Calibration};

use ui::FloorplanApp;

/// Runs the floorplan editor with default settings.
///
/// Initializes the egui application window and starts the main event loop.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an
/// `eframe::Error` if initialization fails.
///
/// # Example
///
/// ```no_run
/// use floorplan_tool::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Floorplan Tool",
        options,
        Box::new(|_cc| Ok(Box::new(FloorplanApp::default()))),
    )
}
