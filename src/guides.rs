//! Smart alignment guides.
//!
//! While a drawing element is being dragged or resized, its edges and center
//! are compared against those of every other visible, non-locked entity.
//! When a candidate value comes within the snap threshold of a static one,
//! the moving object is pulled onto it and a guide line is reported for the
//! UI to draw. The scan is O(n) over static rects per pointer move, which is
//! fine at typical furniture counts; thousands of objects would want an
//! interval structure instead.
//!
//! Tie-break policy: the smallest absolute distance wins; at equal distance
//! a center match is preferred over an edge match.

use eframe::egui;

/// Axis of an alignment match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical guide: some x values aligned.
    Vertical,
    /// A horizontal guide: some y values aligned.
    Horizontal,
}

/// A guide line to render, in document mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    /// Which axis the alignment happened on.
    pub axis: GuideAxis,
    /// The aligned coordinate (x for vertical guides, y for horizontal).
    pub position: f32,
    /// Extent of the line along the other axis, covering both objects.
    pub span: (f32, f32),
}

/// Result of a guide-snap query: per-axis correction deltas to apply to the
/// moving object, plus the guide lines to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideSnap {
    /// Correction to add to the moving object's x, if an x match was found.
    pub dx: Option<f32>,
    /// Correction to add to the moving object's y, if a y match was found.
    pub dy: Option<f32>,
    /// Guide lines for visual feedback (0..=2 entries).
    pub guides: Vec<GuideLine>,
}

impl GuideSnap {
    /// Whether any axis snapped.
    pub fn snapped(&self) -> bool {
        self.dx.is_some() || self.dy.is_some()
    }
}

/// Candidate reference values of a rect along one axis: low edge, center,
/// high edge. Index 1 is the center, used for the tie-break.
fn axis_refs(lo: f32, hi: f32) -> [f32; 3] {
    [lo, (lo + hi) * 0.5, hi]
}

struct AxisMatch {
    delta: f32,
    position: f32,
    distance: f32,
    is_center: bool,
    other_span: (f32, f32),
}

fn best_axis_match(
    moving_lo: f32,
    moving_hi: f32,
    others: impl Iterator<Item = (f32, f32, (f32, f32))>,
    threshold: f32,
) -> Option<AxisMatch> {
    let moving = axis_refs(moving_lo, moving_hi);
    let mut best: Option<AxisMatch> = None;

    for (other_lo, other_hi, other_span) in others {
        let statics = axis_refs(other_lo, other_hi);
        for (mi, m) in moving.iter().enumerate() {
            for (si, s) in statics.iter().enumerate() {
                let distance = (s - m).abs();
                if distance > threshold || !distance.is_finite() {
                    continue;
                }
                let is_center = mi == 1 && si == 1;
                let better = match &best {
                    None => true,
                    Some(b) => {
                        distance < b.distance
                            || (distance == b.distance && is_center && !b.is_center)
                    }
                };
                if better {
                    best = Some(AxisMatch {
                        delta: s - m,
                        position: *s,
                        distance,
                        is_center,
                        other_span,
                    });
                }
            }
        }
    }
    best
}

/// Computes the guide snap for a moving bounding box against static ones.
///
/// `moving` is the candidate (already drag-offset) bounds of the object
/// being manipulated; `others` are the bounds of all visible, non-locked
/// entities excluding the moving one. `threshold_mm` is the pixel threshold
/// converted to mm at the current zoom (see
/// [`crate::constants::GUIDE_SNAP_THRESHOLD_PX`]).
pub fn compute_snap(moving: egui::Rect, others: &[egui::Rect], threshold_mm: f32) -> GuideSnap {
    let mut result = GuideSnap::default();
    if threshold_mm <= 0.0 || others.is_empty() {
        return result;
    }

    let x_match = best_axis_match(
        moving.min.x,
        moving.max.x,
        others.iter().map(|r| (r.min.x, r.max.x, (r.min.y, r.max.y))),
        threshold_mm,
    );
    let y_match = best_axis_match(
        moving.min.y,
        moving.max.y,
        others.iter().map(|r| (r.min.y, r.max.y, (r.min.x, r.max.x))),
        threshold_mm,
    );

    if let Some(m) = x_match {
        result.guides.push(GuideLine {
            axis: GuideAxis::Vertical,
            position: m.position,
            span: (
                moving.min.y.min(m.other_span.0),
                moving.max.y.max(m.other_span.1),
            ),
        });
        result.dx = Some(m.delta);
    }
    if let Some(m) = y_match {
        result.guides.push(GuideLine {
            axis: GuideAxis::Horizontal,
            position: m.position,
            span: (
                moving.min.x.min(m.other_span.0),
                moving.max.x.max(m.other_span.1),
            ),
        });
        result.dy = Some(m.delta);
    }
    result
}

/// Snaps a single moving edge coordinate against static bounds along `axis`.
///
/// Used while resizing: only the dragged edge participates, while the
/// opposite edge stays anchored. The edge may match any static reference
/// (edge or center), with the usual distance/tie-break policy.
/// `moving_span` is the moving object's extent along the other axis, used
/// for the guide line's span. Returns the correction delta together with
/// the guide to draw.
pub fn snap_edge(
    axis: GuideAxis,
    value: f32,
    moving_span: (f32, f32),
    others: &[egui::Rect],
    threshold_mm: f32,
) -> Option<(f32, GuideLine)> {
    if threshold_mm <= 0.0 || others.is_empty() {
        return None;
    }
    let m = match axis {
        GuideAxis::Vertical => best_axis_match(
            value,
            value,
            others.iter().map(|r| (r.min.x, r.max.x, (r.min.y, r.max.y))),
            threshold_mm,
        ),
        GuideAxis::Horizontal => best_axis_match(
            value,
            value,
            others.iter().map(|r| (r.min.y, r.max.y, (r.min.x, r.max.x))),
            threshold_mm,
        ),
    }?;
    let guide = GuideLine {
        axis,
        position: m.position,
        span: (
            moving_span.0.min(m.other_span.0),
            moving_span.1.max(m.other_span.1),
        ),
    };
    Some((m.delta, guide))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(w, h))
    }

    #[test]
    fn test_no_others_no_snap() {
        let snap = compute_snap(rect(0.0, 0.0, 100.0, 100.0), &[], 5.0);
        assert!(!snap.snapped());
        assert!(snap.guides.is_empty());
    }

    #[test]
    fn test_left_edges_snap_within_threshold() {
        // Moving left edge at 103, static left edge at 100 -> dx = -3.
        // Different widths so no other reference pair is equally close.
        let snap = compute_snap(
            rect(103.0, 500.0, 80.0, 100.0),
            &[rect(100.0, 0.0, 100.0, 100.0)],
            5.0,
        );
        assert_eq!(snap.dx, Some(-3.0));
        assert_eq!(snap.guides.len(), 1);
        let g = &snap.guides[0];
        assert_eq!(g.axis, GuideAxis::Vertical);
        assert_eq!(g.position, 100.0);
        // Span covers both rects vertically
        assert_eq!(g.span, (0.0, 600.0));
    }

    #[test]
    fn test_equal_widths_tie_resolves_to_center() {
        // Same-width rects offset by 3: edge-edge, center-center, and
        // edge-edge all tie at distance 3, so the center guide wins.
        let snap = compute_snap(
            rect(103.0, 500.0, 100.0, 100.0),
            &[rect(100.0, 0.0, 100.0, 100.0)],
            5.0,
        );
        assert_eq!(snap.dx, Some(-3.0));
        assert_eq!(snap.guides[0].position, 150.0);
    }

    #[test]
    fn test_out_of_threshold_does_not_snap() {
        let snap = compute_snap(
            rect(110.0, 500.0, 100.0, 100.0),
            &[rect(100.0, 0.0, 100.0, 100.0)],
            5.0,
        );
        assert!(snap.dx.is_none());
    }

    #[test]
    fn test_axes_snap_independently() {
        // x aligns with the first rect, y with the second
        let snap = compute_snap(
            rect(102.0, 203.0, 100.0, 100.0),
            &[rect(100.0, 1000.0, 50.0, 50.0), rect(1000.0, 200.0, 50.0, 50.0)],
            5.0,
        );
        assert_eq!(snap.dx, Some(-2.0));
        assert_eq!(snap.dy, Some(-3.0));
        assert_eq!(snap.guides.len(), 2);
    }

    #[test]
    fn test_smallest_distance_wins() {
        let snap = compute_snap(
            rect(104.0, 500.0, 100.0, 100.0),
            &[
                rect(100.0, 0.0, 100.0, 100.0), // distance 4
                rect(105.0, 0.0, 100.0, 100.0), // distance 1
            ],
            5.0,
        );
        assert_eq!(snap.dx, Some(1.0));
    }

    #[test]
    fn test_tie_prefers_center_over_edge() {
        // Static rect at x 100..200 (center 150). Moving rect at 148..168
        // has its left edge 2 from the static center? Construct a genuine
        // tie: moving 120..180 (center 150 exact? no). Use a moving rect
        // whose center and left edge are equidistant from two static refs.
        //
        // Moving: 98..158 -> left=98, center=128.
        // Static A edge at 100 (distance 2 from left edge).
        // Static B center at 130 (distance 2 from moving center).
        let snap = compute_snap(
            rect(98.0, 500.0, 60.0, 10.0),
            &[
                rect(100.0, 0.0, 300.0, 10.0),  // left edge 100
                rect(100.0, 100.0, 60.0, 10.0), // center 130
            ],
            5.0,
        );
        // Both matches are distance 2; the center-to-center one must win.
        assert_eq!(snap.dx, Some(2.0));
        assert_eq!(snap.guides[0].position, 130.0);
    }

    #[test]
    fn test_snap_edge_matches_nearest_reference() {
        let others = [rect(200.0, 0.0, 80.0, 100.0)];
        let (delta, guide) = snap_edge(GuideAxis::Vertical, 203.0, (500.0, 600.0), &others, 5.0)
            .expect("edge within threshold");
        assert_eq!(delta, -3.0);
        assert_eq!(guide.axis, GuideAxis::Vertical);
        assert_eq!(guide.position, 200.0);
        assert_eq!(guide.span, (0.0, 600.0));

        // Out of threshold: no match.
        assert!(snap_edge(GuideAxis::Vertical, 300.0, (0.0, 100.0), &others, 5.0).is_none());
    }

    #[test]
    fn test_degenerate_threshold_disables_snapping() {
        let snap = compute_snap(
            rect(100.0, 100.0, 100.0, 100.0),
            &[rect(100.0, 0.0, 100.0, 100.0)],
            0.0,
        );
        assert!(!snap.snapped());
    }
}
