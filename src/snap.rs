//! Grid snapping.
//!
//! Pure functions that round coordinates to the nearest grid multiple.
//! Every move/create/resize operation funnels candidate coordinates through
//! here when the grid is enabled.

/// Snaps a single coordinate to the nearest multiple of `grid_size`.
///
/// Returns the value unchanged when snapping is disabled or the grid size is
/// not positive. Halves round away from zero (`f32::round`), so -25 with a
/// 50 grid lands on -50, mirroring +25 landing on 50.
pub fn snap_to_grid(value: f32, grid_size: f32, enabled: bool) -> f32 {
    if !enabled || grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Snaps a point to the grid, each axis independently.
pub fn snap_point(x: f32, y: f32, grid_size: f32, enabled: bool) -> (f32, f32) {
    (
        snap_to_grid(x, grid_size, enabled),
        snap_to_grid(y, grid_size, enabled),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_rounds_to_nearest_multiple() {
        assert_eq!(snap_to_grid(1234.0, 50.0, true), 1250.0);
        assert_eq!(snap_to_grid(1224.0, 50.0, true), 1200.0);
        assert_eq!(snap_to_grid(-30.0, 50.0, true), -50.0);
        assert_eq!(snap_to_grid(-20.0, 50.0, true), -0.0);
    }

    #[test]
    fn test_snap_half_rounds_away_from_zero() {
        assert_eq!(snap_to_grid(25.0, 50.0, true), 50.0);
        assert_eq!(snap_to_grid(75.0, 50.0, true), 100.0);
        assert_eq!(snap_to_grid(-25.0, 50.0, true), -50.0);
        assert_eq!(snap_to_grid(-75.0, 50.0, true), -100.0);
    }

    #[test]
    fn test_disabled_or_degenerate_grid_is_identity() {
        assert_eq!(snap_to_grid(1234.5, 50.0, false), 1234.5);
        assert_eq!(snap_to_grid(1234.5, 0.0, true), 1234.5);
        assert_eq!(snap_to_grid(1234.5, -10.0, true), 1234.5);
    }

    #[test]
    fn test_snap_is_idempotent() {
        for v in [-987.3, -50.0, 0.0, 12.0, 25.0, 1234.5, 99999.9] {
            for g in [1.0, 10.0, 50.0, 137.0] {
                let once = snap_to_grid(v, g, true);
                assert_eq!(snap_to_grid(once, g, true), once, "v={v} g={g}");
            }
        }
    }

    #[test]
    fn test_snap_point_snaps_each_axis_independently() {
        assert_eq!(snap_point(1149.0, 951.0, 50.0, true), (1150.0, 950.0));
    }
}
