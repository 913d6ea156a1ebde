//! Coordinate transforms between document mm and viewport pixels.
//!
//! Three frames exist:
//! - **document mm** — canonical, persisted, zoom/pan-independent;
//! - **document px** — `mm * base_scale`;
//! - **viewport px** — `document_px * zoom + pan`, relative to the canvas
//!   origin on screen.
//!
//! Every pointer-driven operation converts through here before touching
//! entity state, so geometry is always stored independent of how the canvas
//! happens to be zoomed or panned. Individual components must never
//! recompute `(screen - origin) / zoom / scale` by hand.

use crate::constants::{BASE_SCALE_PX_PER_MM, MAX_ZOOM, MIN_ZOOM};
use crate::units::{mm_to_pixels, pixels_to_mm};
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Canvas view state: zoom, pan, and the base display scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    /// Current zoom level (1.0 = 100%). Clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub zoom: f32,
    /// Pan offset in viewport pixels, applied after zoom.
    pub pan: egui::Vec2,
    /// Pixels per document mm at zoom 1.0.
    pub base_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
            base_scale: BASE_SCALE_PX_PER_MM,
        }
    }
}

impl Viewport {
    /// Effective pixels-per-mm in viewport space (base scale times zoom).
    pub fn pixels_per_mm(&self) -> f32 {
        self.base_scale * self.zoom
    }

    /// Converts a screen position to document mm.
    ///
    /// `origin` is the top-left of the canvas widget in screen space; egui
    /// gives pointer positions in window coordinates, so the canvas offset
    /// must be subtracted before undoing pan/zoom/scale.
    pub fn screen_to_document_mm(&self, screen_pos: egui::Pos2, origin: egui::Pos2) -> egui::Pos2 {
        let canvas = screen_pos - origin.to_vec2();
        let doc_px = (canvas - self.pan) / self.zoom;
        egui::pos2(
            pixels_to_mm(doc_px.x, self.base_scale),
            pixels_to_mm(doc_px.y, self.base_scale),
        )
    }

    /// Converts a document-mm position to screen space. Inverse of
    /// [`Self::screen_to_document_mm`].
    pub fn document_mm_to_screen(&self, mm_pos: egui::Pos2, origin: egui::Pos2) -> egui::Pos2 {
        let doc_px = egui::pos2(
            mm_to_pixels(mm_pos.x, self.base_scale),
            mm_to_pixels(mm_pos.y, self.base_scale),
        );
        (doc_px * self.zoom + self.pan) + origin.to_vec2()
    }

    /// Converts a screen-pixel length to mm at the current zoom.
    /// Used for pick thresholds and guide-snap distances, which are
    /// specified in screen pixels but compared in mm.
    pub fn screen_len_to_mm(&self, px: f32) -> f32 {
        pixels_to_mm(px, self.pixels_per_mm())
    }

    /// Converts a document-mm length to screen pixels at the current zoom.
    pub fn mm_len_to_screen(&self, mm: f32) -> f32 {
        mm_to_pixels(mm, self.pixels_per_mm())
    }

    /// Applies a zoom delta while keeping the document point under `cursor`
    /// fixed on screen.
    pub fn zoom_about(&mut self, cursor: egui::Pos2, origin: egui::Pos2, zoom_delta: f32) {
        let old_zoom = self.zoom;
        let new_zoom = (self.zoom + zoom_delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - old_zoom).abs() <= f32::EPSILON {
            return;
        }

        let anchor_mm = self.screen_to_document_mm(cursor, origin);
        self.zoom = new_zoom;
        let anchor_after = self.document_mm_to_screen(anchor_mm, origin);
        self.pan += cursor - anchor_after;
    }

    /// Sets the zoom directly (clamped), without anchoring. Used by the
    /// toolbar zoom controls where the view center is an acceptable anchor.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }
}
