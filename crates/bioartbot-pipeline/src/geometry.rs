//! Pixel-grid to plate coordinate transform.
//!
//! Converts `[row, col]` art pixels into center-origin plate coordinates
//! normalized by the plate's well radius (the shorter plate radius).
//!
//! The transform is:
//!
//! ```text
//! x = ( spacing × col - x_max) / well_radius
//! y = (-spacing × row + y_max) / well_radius
//! ```
//!
//! The Y-axis is **flipped**: pixel rows grow downward while plate `y`
//! grows upward.
//!
//! On a round plate the grid's corners sit on the plate ellipse, so the
//! whole grid is inscribed in the dish. On a rectangular plate the grid
//! fills whichever axis runs out first and keeps square cells.

use crate::types::{
    CanvasSize, GeometryError, PhysicalPoint, PixelCoordinate, PlateGeometry, PlateShape,
};

/// Grid layout of one artwork on one plate, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateSpacing {
    /// Normalization unit: `min(x_radius_mm, y_radius_mm)`.
    pub well_radius: f64,
    /// Distance between adjacent grid cells (same on both axes).
    pub spacing: f64,
    /// Offset of the left/right-most column from the plate center.
    pub x_max: f64,
    /// Offset of the top/bottom-most row from the plate center.
    pub y_max: f64,
}

impl PlateSpacing {
    /// Normalized units per millimetre.
    #[must_use]
    pub fn units_per_mm(&self) -> f64 {
        1.0 / self.well_radius
    }

    /// Convert a millimetre gap into normalized plate units.
    #[must_use]
    pub fn min_gap(&self, gap_mm: f64) -> f64 {
        gap_mm * self.units_per_mm()
    }
}

/// Lay out a `grid_size` art grid on `plate`.
///
/// # Errors
///
/// Returns [`GeometryError::GridTooSmall`] if either grid dimension is
/// below 2, and [`GeometryError::NonPositiveRadius`] if either plate
/// radius is not a positive finite number.
pub fn compute_plate_spacing(
    plate: &PlateGeometry,
    grid_size: CanvasSize,
) -> Result<PlateSpacing, GeometryError> {
    if grid_size.width < 2 || grid_size.height < 2 {
        return Err(GeometryError::GridTooSmall {
            width: grid_size.width,
            height: grid_size.height,
        });
    }
    let radius_ok = |r: f64| r.is_finite() && r > 0.0;
    if !radius_ok(plate.x_radius_mm) || !radius_ok(plate.y_radius_mm) {
        return Err(GeometryError::NonPositiveRadius {
            x_radius_mm: plate.x_radius_mm,
            y_radius_mm: plate.y_radius_mm,
        });
    }

    let max_col = f64::from(grid_size.width - 1);
    let max_row = f64::from(grid_size.height - 1);

    let (spacing, x_max, y_max) = match plate.shape {
        PlateShape::Round => {
            // Corner of the grid lands on the ellipse at the grid's
            // diagonal angle.
            let angle = (max_col / max_row).atan();
            let x_max = angle.sin() * plate.x_radius_mm;
            let y_max = angle.cos() * plate.y_radius_mm;
            (x_max * 2.0 / max_col, x_max, y_max)
        }
        PlateShape::Rectangular => {
            let x_spacing = plate.x_radius_mm * 2.0 / f64::from(grid_size.width);
            let y_spacing = plate.y_radius_mm * 2.0 / f64::from(grid_size.height);
            let spacing = x_spacing.min(y_spacing);
            (spacing, spacing * max_col / 2.0, spacing * max_row / 2.0)
        }
    };

    Ok(PlateSpacing {
        well_radius: plate.x_radius_mm.min(plate.y_radius_mm),
        spacing,
        x_max,
        y_max,
    })
}

/// Map one `[row, col]` pixel to its normalized plate position.
///
/// `coord.row` drives `y` and `coord.col` drives `x`; swapping them
/// transposes the art.
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn map_pixel_to_point(
    coord: PixelCoordinate,
    plate: &PlateGeometry,
    layout: &PlateSpacing,
) -> PhysicalPoint {
    // Unfused: tour tie-breaks depend on this exact rounding.
    let x = (layout.spacing * f64::from(coord.col) - layout.x_max) / layout.well_radius;
    let y = (layout.spacing * -f64::from(coord.row) + layout.y_max) / layout.well_radius;
    PhysicalPoint::new(x, y, plate.z_touch_position_frac)
}

/// Reject pixels that fall outside the canvas.
///
/// # Errors
///
/// Returns [`GeometryError::PixelOutOfBounds`] if `coord` is not inside
/// `canvas`.
pub const fn check_pixel_bounds(
    coord: PixelCoordinate,
    canvas: CanvasSize,
) -> Result<(), GeometryError> {
    if canvas.contains(coord) {
        Ok(())
    } else {
        Err(GeometryError::PixelOutOfBounds {
            row: coord.row,
            col: coord.col,
            width: canvas.width,
            height: canvas.height,
        })
    }
}

/// Bounds-check and map every pixel of one color.
///
/// Output order matches input order.
///
/// # Errors
///
/// Returns the first [`GeometryError::PixelOutOfBounds`] encountered.
pub fn map_pixels(
    pixels: &[PixelCoordinate],
    canvas: CanvasSize,
    plate: &PlateGeometry,
    layout: &PlateSpacing,
) -> Result<Vec<PhysicalPoint>, GeometryError> {
    pixels
        .iter()
        .map(|&coord| {
            check_pixel_bounds(coord, canvas)?;
            Ok(map_pixel_to_point(coord, plate, layout))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn plate(shape: PlateShape, x_radius_mm: f64, y_radius_mm: f64) -> PlateGeometry {
        PlateGeometry {
            shape,
            x_radius_mm,
            y_radius_mm,
            z_touch_position_frac: 0.1,
        }
    }

    fn corners(size: CanvasSize) -> [PixelCoordinate; 4] {
        let last_row = size.height - 1;
        let last_col = size.width - 1;
        [
            PixelCoordinate::new(0, 0),
            PixelCoordinate::new(0, last_col),
            PixelCoordinate::new(last_row, 0),
            PixelCoordinate::new(last_row, last_col),
        ]
    }

    // --- compute_plate_spacing ---

    #[test]
    fn round_three_by_three_matches_worked_example() {
        let p = plate(PlateShape::Round, 45.0, 45.0);
        let layout = compute_plate_spacing(&p, CanvasSize::new(3, 3)).unwrap();

        let expected_max = 45.0 * std::f64::consts::FRAC_PI_4.sin();
        assert!((layout.well_radius - 45.0).abs() < TOL);
        assert!((layout.x_max - expected_max).abs() < TOL);
        assert!((layout.y_max - expected_max).abs() < TOL);
        assert!((layout.spacing - expected_max).abs() < TOL);
        assert!((layout.spacing - 31.819_805).abs() < 1e-5);
    }

    #[test]
    fn rectangular_uses_smaller_spacing() {
        // 80mm / 4 columns = 20mm, 80mm / 2 rows = 40mm -> 20mm cells.
        let p = plate(PlateShape::Rectangular, 40.0, 40.0);
        let layout = compute_plate_spacing(&p, CanvasSize::new(4, 2)).unwrap();
        assert!((layout.spacing - 20.0).abs() < TOL);
        assert!((layout.x_max - 30.0).abs() < TOL);
        assert!((layout.y_max - 10.0).abs() < TOL);
    }

    #[test]
    fn well_radius_is_shorter_radius() {
        let p = plate(PlateShape::Rectangular, 63.0, 42.0);
        let layout = compute_plate_spacing(&p, CanvasSize::new(10, 10)).unwrap();
        assert!((layout.well_radius - 42.0).abs() < TOL);
        assert!((layout.units_per_mm() - 1.0 / 42.0).abs() < TOL);
        assert!((layout.min_gap(2.0) - 2.0 / 42.0).abs() < TOL);
    }

    #[test]
    fn single_row_grid_is_rejected() {
        let p = plate(PlateShape::Round, 45.0, 45.0);
        let err = compute_plate_spacing(&p, CanvasSize::new(5, 1)).unwrap_err();
        assert_eq!(
            err,
            GeometryError::GridTooSmall {
                width: 5,
                height: 1
            }
        );
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        for (x, y) in [(0.0, 40.0), (40.0, -1.0), (f64::NAN, 40.0)] {
            let p = plate(PlateShape::Rectangular, x, y);
            let result = compute_plate_spacing(&p, CanvasSize::new(3, 3));
            assert!(
                matches!(result, Err(GeometryError::NonPositiveRadius { .. })),
                "radii ({x}, {y}) should be rejected, got {result:?}"
            );
        }
    }

    // --- map_pixel_to_point ---

    #[test]
    fn round_example_corners_and_center() {
        let p = plate(PlateShape::Round, 45.0, 45.0);
        let layout = compute_plate_spacing(&p, CanvasSize::new(3, 3)).unwrap();
        let half = std::f64::consts::FRAC_1_SQRT_2;

        let top_left = map_pixel_to_point(PixelCoordinate::new(0, 0), &p, &layout);
        assert!((top_left.x + half).abs() < TOL);
        assert!((top_left.y - half).abs() < TOL);
        assert!((top_left.z - 0.1).abs() < TOL);

        let center = map_pixel_to_point(PixelCoordinate::new(1, 1), &p, &layout);
        assert!(center.x.abs() < TOL);
        assert!(center.y.abs() < TOL);
    }

    #[test]
    fn row_drives_y_and_col_drives_x() {
        let p = plate(PlateShape::Rectangular, 40.0, 40.0);
        let layout = compute_plate_spacing(&p, CanvasSize::new(4, 2)).unwrap();
        // Bottom-right pixel of a wide grid.
        let point = map_pixel_to_point(PixelCoordinate::new(1, 3), &p, &layout);
        assert!((point.x - 0.75).abs() < TOL, "x = {}", point.x);
        assert!((point.y + 0.25).abs() < TOL, "y = {}", point.y);
    }

    #[test]
    fn rectangular_square_grid_corners_are_symmetric() {
        for n in [2, 3, 5, 8, 27] {
            let size = CanvasSize::new(n, n);
            let p = plate(PlateShape::Rectangular, 40.0, 40.0);
            let layout = compute_plate_spacing(&p, size).unwrap();
            let [tl, tr, bl, br] = corners(size).map(|c| map_pixel_to_point(c, &p, &layout));

            assert!((tl.x + tr.x).abs() < TOL, "n={n}");
            assert!((tl.y - tr.y).abs() < TOL, "n={n}");
            assert!((tl.x + br.x).abs() < TOL, "n={n}");
            assert!((tl.y + br.y).abs() < TOL, "n={n}");
            assert!((tr.x + bl.x).abs() < TOL, "n={n}");
            assert!((tr.y + bl.y).abs() < TOL, "n={n}");
        }
    }

    #[test]
    fn round_plate_grid_is_inscribed() {
        for (w, h) in [(3, 3), (26, 39), (40, 10), (2, 50)] {
            let size = CanvasSize::new(w, h);
            let p = plate(PlateShape::Round, 45.0, 45.0);
            let layout = compute_plate_spacing(&p, size).unwrap();
            let max_radius = corners(size)
                .iter()
                .map(|&c| {
                    let point = map_pixel_to_point(c, &p, &layout);
                    point.x.hypot(point.y)
                })
                .fold(0.0_f64, f64::max);
            // Corners sit on the rim; allow for float noise only.
            assert!(max_radius <= 1.0 + 1e-12, "{w}x{h}: {max_radius}");
            assert!(max_radius > 0.99, "{w}x{h}: {max_radius}");
        }
    }

    // --- bounds ---

    #[test]
    fn map_pixels_rejects_out_of_bounds() {
        let p = plate(PlateShape::Round, 45.0, 45.0);
        let size = CanvasSize::new(3, 3);
        let layout = compute_plate_spacing(&p, size).unwrap();
        let err = map_pixels(
            &[PixelCoordinate::new(0, 0), PixelCoordinate::new(3, 1)],
            size,
            &p,
            &layout,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::PixelOutOfBounds { row: 3, col: 1, .. }
        ));
    }

    #[test]
    fn map_pixels_preserves_order_and_length() {
        let p = plate(PlateShape::Round, 45.0, 45.0);
        let size = CanvasSize::new(3, 3);
        let layout = compute_plate_spacing(&p, size).unwrap();
        let pixels = [
            PixelCoordinate::new(2, 2),
            PixelCoordinate::new(0, 0),
            PixelCoordinate::new(1, 1),
        ];
        let points = map_pixels(&pixels, size, &p, &layout).unwrap();
        assert_eq!(points.len(), 3);
        assert!(points[0].x > 0.0 && points[0].y < 0.0);
        assert!(points[1].x < 0.0 && points[1].y > 0.0);
    }
}
