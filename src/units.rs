//! Unit conversion between document millimeters and pixels.
//!
//! All entity geometry is stored in document mm; pixels only exist at the
//! display edge. `scale` is always pixels-per-mm — callers must be explicit
//! about whether they are converting into document-pixel space (base scale
//! only) or viewport-pixel space (base scale times zoom).

use serde::{Deserialize, Serialize};

/// Converts a length in millimeters to pixels at the given pixels-per-mm scale.
pub fn mm_to_pixels(mm: f32, scale: f32) -> f32 {
    debug_assert!(scale > 0.0, "mm_to_pixels called with non-positive scale");
    mm * scale
}

/// Converts a length in pixels to millimeters at the given pixels-per-mm scale.
pub fn pixels_to_mm(px: f32, scale: f32) -> f32 {
    debug_assert!(scale > 0.0, "pixels_to_mm called with non-positive scale");
    px / scale
}

/// Measurement calibration derived from a user-drawn reference segment.
///
/// When a floor-plan image is uploaded, the user draws a line over a feature
/// of known length and enters its real-world size; the ratio becomes the
/// pixels-per-mm scale for all displayed measurements. `None` means the
/// document is uncalibrated and measurements show raw units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Calibration {
    /// Image pixels per real-world millimeter, if calibrated.
    pub pixels_per_mm: Option<f32>,
}

impl Calibration {
    /// Derives the scale from a measured segment length against a real length.
    ///
    /// Returns `false` (leaving the calibration unchanged) when either length
    /// is non-positive or non-finite, since a zero-length reference segment
    /// would make every measurement NaN or infinite.
    pub fn calibrate(&mut self, measured_px: f32, real_mm: f32) -> bool {
        if !(measured_px > 0.0 && real_mm > 0.0)
            || !measured_px.is_finite()
            || !real_mm.is_finite()
        {
            log::warn!("rejected calibration: {measured_px}px over {real_mm}mm");
            return false;
        }
        self.pixels_per_mm = Some(measured_px / real_mm);
        true
    }

    /// Clears the calibration. Called when a new image is uploaded or the
    /// user resets measurement; the caller is responsible for also clearing
    /// placed furniture, whose positions are meaningless without a scale.
    pub fn reset(&mut self) {
        self.pixels_per_mm = None;
    }

    /// Converts an on-image pixel distance to mm, or returns the raw value
    /// when uncalibrated.
    pub fn display_length(&self, px: f32) -> f32 {
        match self.pixels_per_mm {
            Some(scale) => pixels_to_mm(px, scale),
            None => px,
        }
    }

    /// Whether a real-world scale has been established.
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_mm.is_some()
    }
}
