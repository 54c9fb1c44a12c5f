//! Integration tests for cropping, cell areas and nearest-cell lookup.

use field_objects::{BoundingBox, FieldObjectsError, GeodesicGrid, Grid2D, EARTH_RADIUS_KM};
use test_utils::{assert_approx_eq, regular_latlon_grid, sheared_latlon_grid, with_fill_cells};

const FILL: f64 = GeodesicGrid::DEFAULT_FILL_VALUE;

// ============================================================================
// Cropping
// ============================================================================

#[test]
fn test_crop_shape_matches_window() {
    let (lats, lons) = regular_latlon_grid(40, 60, 20.0, -30.0, 0.5);
    let bbox = BoundingBox::new(10.0, 15.0, -20.0, -10.0);
    let grid = GeodesicGrid::new(&lats, &lons, bbox, FILL).unwrap();

    let window = grid.window();
    // lat 15.0 is row 10, lat 10.0 is row 20; lon -20 is col 20, lon -10 is col 40.
    assert_eq!((window.y0, window.y1, window.x0, window.x1), (10, 20, 20, 40));

    let field = Grid2D::from_fn(40, 60, |r, c| (r * 60 + c) as f32);
    let cropped = grid.crop(&field).unwrap();
    assert_eq!(cropped.shape(), (window.y1 - window.y0 + 1, window.x1 - window.x0 + 1));
    assert_eq!(cropped.at(0, 0), (10 * 60 + 20) as f32);
    assert_eq!(grid.original_shape(), (40, 60));
}

#[test]
fn test_box_outside_domain_fails() {
    let (lats, lons) = regular_latlon_grid(10, 10, 10.0, 0.0, 1.0);
    let bbox = BoundingBox::new(-50.0, -40.0, 100.0, 110.0);
    let err = GeodesicGrid::new(&lats, &lons, bbox, FILL).unwrap_err();
    assert!(matches!(err, FieldObjectsError::CropOutOfDomain { .. }));
    assert!(err.is_skippable());
}

#[test]
fn test_box_over_fill_cells_only_fails() {
    let (lats, lons) = regular_latlon_grid(4, 4, 3.0, 0.0, 1.0);
    let lats = with_fill_cells(&lats, &[(0, 0)], FILL);
    // Only the (0, 0) cell would have matched.
    let bbox = BoundingBox::new(2.9, 3.1, -0.1, 0.1);
    let err = GeodesicGrid::new(&lats, &lons, bbox, FILL).unwrap_err();
    assert!(matches!(err, FieldObjectsError::CropOutOfDomain { .. }));
}

#[test]
fn test_field_of_wrong_shape_is_rejected() {
    let (lats, lons) = regular_latlon_grid(10, 10, 10.0, 0.0, 1.0);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(0.0, 10.0, 0.0, 10.0), FILL).unwrap();
    let field = Grid2D::filled(10, 11, 0.0f32);
    assert!(matches!(
        grid.crop(&field).unwrap_err(),
        FieldObjectsError::ShapeMismatch { .. }
    ));
}

#[test]
fn test_sheared_grid_keeps_corner_cells() {
    let (lats, lons) = sheared_latlon_grid(10, 10, 9.0, 0.0, 1.0, 0.5);
    let bbox = BoundingBox::new(0.0, 9.0, 2.0, 6.0);
    let grid = GeodesicGrid::new(&lats, &lons, bbox, FILL).unwrap();

    let outside = grid
        .lats()
        .as_slice()
        .iter()
        .zip(grid.lons().as_slice())
        .filter(|(&lat, &lon)| !grid.contains(lat, lon))
        .count();
    assert!(outside > 0, "row/column crop should include out-of-box corners");
}

// ============================================================================
// Cell area
// ============================================================================

#[test]
fn test_equatorial_cell_area() {
    let (lats, lons) = regular_latlon_grid(5, 5, 0.2, 0.0, 0.1);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(-1.0, 1.0, -1.0, 1.0), FILL).unwrap();

    let step = 0.1f64.to_radians();
    let expected = EARTH_RADIUS_KM * EARTH_RADIUS_KM * step * step;
    // Centre row sits on the equator.
    assert_approx_eq!(grid.area().at(2, 2), expected, expected * 1e-9);
    assert!(grid.area().as_slice().iter().all(|&a| a > 0.0));
}

#[test]
fn test_area_invariant_to_longitude_shift() {
    let (lats, lons_a) = regular_latlon_grid(8, 8, 45.0, -100.0, 0.25);
    let (_, lons_b) = regular_latlon_grid(8, 8, 45.0, 37.0, 0.25);
    let everything = BoundingBox::new(-90.0, 90.0, -180.0, 180.0);

    let a = GeodesicGrid::new(&lats, &lons_a, everything, FILL).unwrap();
    let b = GeodesicGrid::new(&lats, &lons_b, everything, FILL).unwrap();
    for (x, y) in a.area().as_slice().iter().zip(b.area().as_slice()) {
        assert_approx_eq!(*x, *y, x * 1e-9);
    }
}

#[test]
fn test_area_decreases_toward_pole() {
    let (lats, lons) = regular_latlon_grid(60, 3, 80.0, 0.0, 1.0);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(-90.0, 90.0, -1.0, 5.0), FILL).unwrap();

    // Row 0 is the most poleward.
    for row in 1..60 {
        assert!(grid.area().at(row - 1, 1) < grid.area().at(row, 1));
    }
}

#[test]
fn test_single_row_crop_has_zero_area() {
    let (lats, lons) = regular_latlon_grid(10, 10, 9.0, 0.0, 1.0);
    // Only row 4 (lat 5.0) lies in the box.
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(5.0, 5.0, 2.0, 6.0), FILL).unwrap();

    assert_eq!(grid.shape(), (1, 5));
    assert!(grid.area().as_slice().iter().all(|&a| a == 0.0));
    assert_eq!(grid.total_area_km2(), 0.0);
}

#[test]
fn test_grid_keeps_box_and_fill_value() {
    let (lats, lons) = regular_latlon_grid(10, 10, 9.0, 0.0, 1.0);
    let bbox = BoundingBox::new(2.0, 6.0, 2.0, 6.0);
    let grid = GeodesicGrid::new(&lats, &lons, bbox, -1.0).unwrap();

    assert_eq!(grid.bbox(), bbox);
    assert_eq!(grid.fill_value(), -1.0);
}

#[test]
fn test_fill_cells_have_zero_area() {
    let (lats, lons) = regular_latlon_grid(6, 6, 5.0, 0.0, 1.0);
    let lats = with_fill_cells(&lats, &[(2, 3)], FILL);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(0.0, 5.0, 0.0, 5.0), FILL).unwrap();

    assert_eq!(grid.area().at(2, 3), 0.0);
    assert!(grid.lats().at(2, 3).is_nan());
    assert!(grid.total_area_km2() > 0.0);
}

// ============================================================================
// Nearest-cell lookup
// ============================================================================

#[test]
fn test_query_returns_crop_indices() {
    let (lats, lons) = regular_latlon_grid(30, 30, 30.0, 0.0, 1.0);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(10.0, 20.0, 5.0, 15.0), FILL).unwrap();

    // Crop starts at lat 20 (row 0) and lon 5 (col 0).
    assert_eq!(grid.query(20.0, 5.0), (0, 0));
    assert_eq!(grid.query(14.2, 11.9), (6, 7));
    // Far outside still maps to the nearest edge cell.
    assert_eq!(grid.query(-80.0, 5.0), (10, 0));
}

#[test]
fn test_query_skips_fill_cells() {
    let (lats, lons) = regular_latlon_grid(5, 5, 4.0, 0.0, 1.0);
    let lons = with_fill_cells(&lons, &[(2, 2)], FILL);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(0.0, 4.0, 0.0, 4.0), FILL).unwrap();

    let hit = grid.query(2.0, 2.0);
    assert_ne!(hit, (2, 2));
    let (r, c) = hit;
    assert_eq!((r as i64 - 2).abs() + (c as i64 - 2).abs(), 1);
}

#[test]
fn test_non_finite_query_returns_valid_cell() {
    let (lats, lons) = regular_latlon_grid(5, 5, 4.0, 0.0, 1.0);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(0.0, 4.0, 0.0, 4.0), FILL).unwrap();

    for (lat, lon) in [(f64::NAN, 0.0), (1e200, 0.0), (f64::INFINITY, f64::NAN)] {
        let (r, c) = grid.query(lat, lon);
        assert!(r < 5 && c < 5, "({lat}, {lon}) gave ({r}, {c})");
    }

    let hits = grid.query_many(&[2.0, f64::INFINITY], &[2.0, 0.0]).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], (2, 2));
    assert!(hits[1].0 < 5 && hits[1].1 < 5);
}

#[test]
fn test_query_many_length_mismatch() {
    let (lats, lons) = regular_latlon_grid(5, 5, 4.0, 0.0, 1.0);
    let grid = GeodesicGrid::new(&lats, &lons, BoundingBox::new(0.0, 4.0, 0.0, 4.0), FILL).unwrap();

    let hits = grid.query_many(&[4.0, 0.0], &[0.0, 4.0]).unwrap();
    assert_eq!(hits, vec![(0, 0), (4, 4)]);
    assert!(grid.query_many(&[1.0], &[]).is_err());
}
