//! Integration tests for object extraction and shape statistics.

use field_objects::{
    extract_objects, BoundingBox, Connectivity, GeodesicGrid, Grid2D, LabelMap,
    ObjectExtractionConfig,
};
use test_utils::{
    assert_approx_eq, disc_field, line_field, overlay, rectangle_field, regular_latlon_grid,
};

fn grid(height: usize, width: usize, lat_top: f64, step: f64) -> GeodesicGrid {
    let (lats, lons) = regular_latlon_grid(height, width, lat_top, 0.0, step);
    let everything = BoundingBox::new(-90.0, 90.0, -180.0, 180.0);
    GeodesicGrid::new(&lats, &lons, everything, GeodesicGrid::DEFAULT_FILL_VALUE).unwrap()
}

#[test]
fn test_five_by_five_block() {
    let grid = grid(5, 5, 0.2, 0.1);
    let field = rectangle_field(5, 5, (1, 1), (2, 2), 10.0);
    let config = ObjectExtractionConfig::new(5.0, "core")
        .with_min_pixels(1)
        .with_connectivity(8);

    let table = extract_objects(&field, &grid, &config).unwrap();
    assert_eq!(table.len(), 1);
    let record = &table.records()[0];
    assert_eq!(record.n_pix, 4);
    assert_eq!(record.max_value, 10.0);
    assert_eq!(record.mean_value, 10.0);
    assert_approx_eq!(record.size, grid.area().at(1, 1) * 4.0, record.size * 1e-3);
}

#[test]
fn test_connected_region_pixel_count() {
    let grid = grid(12, 12, 5.0, 0.1);
    let field = disc_field(12, 12, (6.0, 6.0), 3.0, 2.0);
    let expected = field.as_slice().iter().filter(|&&v| v > 0.0).count();

    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(1.0, "core")).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].n_pix, expected);
}

#[test]
fn test_gap_separates_regions() {
    // Binary-exact spacing keeps the two areas bit-identical.
    let grid = grid(6, 9, 5.0, 0.25);
    let left = rectangle_field(6, 9, (1, 0), (4, 3), 4.0);
    let right = rectangle_field(6, 9, (1, 4), (4, 3), 4.0);
    let field = overlay(&left, &right);

    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(1.0, "roa")).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.iter().all(|r| r.n_pix == 12));
    // Equal sizes keep raster order.
    assert_eq!(table.records()[0].label, 1);
    assert_eq!(table.records()[1].label, 2);
}

#[test]
fn test_diagonal_contact_depends_on_connectivity() {
    let grid = grid(4, 4, 5.0, 0.1);
    let field = Grid2D::from_fn(4, 4, |r, c| if r == c { 1.0f32 } else { 0.0 });

    let eight = ObjectExtractionConfig::new(0.5, "core").with_connectivity(8);
    let four = ObjectExtractionConfig::new(0.5, "core").with_connectivity(4);
    assert_eq!(extract_objects(&field, &grid, &eight).unwrap().len(), 1);
    assert_eq!(extract_objects(&field, &grid, &four).unwrap().len(), 4);
}

#[test]
fn test_bounds_and_centroid_in_degrees() {
    let grid = grid(10, 10, 9.0, 1.0);
    let field = rectangle_field(10, 10, (2, 3), (3, 5), 1.0);
    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(1.0, "core")).unwrap();
    let record = &table.records()[0];

    // Rows 2..5 are latitudes 7, 6, 5; columns 3..8 are longitudes 3..7.
    assert_eq!((record.lat_min, record.lat_max), (5.0, 7.0));
    assert_eq!((record.lon_min, record.lon_max), (3.0, 7.0));
    assert_approx_eq!(record.lon_centroid, 5.0, 1e-9);
    // Lower latitudes carry slightly more area.
    assert!(record.lat_centroid < 6.0 && record.lat_centroid > 5.9);
}

#[test]
fn test_min_size_filters() {
    let grid = grid(10, 10, 5.0, 0.1);
    let small = rectangle_field(10, 10, (0, 0), (1, 2), 3.0);
    let large = rectangle_field(10, 10, (5, 5), (4, 4), 3.0);
    let field = overlay(&small, &large);

    let by_pixels = ObjectExtractionConfig::new(1.0, "core").with_min_pixels(3);
    let table = extract_objects(&field, &grid, &by_pixels).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0].n_pix, 16);

    let large_area = extract_objects(&large, &grid, &ObjectExtractionConfig::new(1.0, "core"))
        .unwrap()
        .total_area_km2();
    let by_area = ObjectExtractionConfig::new(1.0, "core").with_min_area_km2(large_area * 1.5);
    assert!(extract_objects(&field, &grid, &by_area).unwrap().is_empty());
}

#[test]
fn test_nan_cells_are_never_objects() {
    let grid = grid(5, 5, 0.2, 0.1);
    let field = Grid2D::from_fn(5, 5, |r, c| {
        if r == 2 && c == 2 {
            f32::NAN
        } else if r == 2 {
            5.0
        } else {
            0.0
        }
    });
    let config = ObjectExtractionConfig::new(1.0, "core").with_connectivity(4);
    let table = extract_objects(&field, &grid, &config).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.iter().all(|r| r.n_pix == 2 && r.mean_value == 5.0));
}

// ============================================================================
// Shape descriptors
// ============================================================================

#[test]
fn test_isotropic_disc_shape() {
    // Centre row sits on the equator so area weights are symmetric.
    let grid = grid(21, 21, 1.0, 0.1);
    let field = disc_field(21, 21, (10.0, 10.0), 6.0, 1.0);
    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(0.5, "core")).unwrap();
    let record = &table.records()[0];

    assert_approx_eq!(record.elongation, 1.0, 1e-2);
    assert!(record.eccentricity < 0.1, "eccentricity {}", record.eccentricity);
    assert_approx_eq!(record.lat_centroid, 0.0, 1e-9);
    assert_approx_eq!(record.lon_centroid, 1.0, 1e-9);
}

#[test]
fn test_line_shape() {
    let grid = grid(5, 20, 0.2, 0.1);
    let field = line_field(5, 20, 2, 2..18, 1.0);
    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(0.5, "core")).unwrap();
    let record = &table.records()[0];

    assert!(record.elongation > 1e3, "elongation {}", record.elongation);
    assert_approx_eq!(record.eccentricity, 1.0, 1e-6);
}

#[test]
fn test_labels_match_label_map_numbering() {
    let grid = grid(8, 8, 5.0, 0.1);
    let field = Grid2D::from_fn(8, 8, |r, c| if (r + 2 * c) % 5 == 0 { 1.0f32 } else { 0.0 });
    let mask = field.map(|v| v >= 1.0);
    let labels = LabelMap::from_mask(&mask, Connectivity::Eight);

    let table = extract_objects(&field, &grid, &ObjectExtractionConfig::new(1.0, "core")).unwrap();
    assert_eq!(table.len(), labels.num_labels());
    let components = labels.components();
    for record in &table {
        assert_eq!(components[record.label as usize - 1].len(), record.n_pix);
    }
}

#[test]
fn test_single_row_crop_gives_nan_centroid() {
    let (lats, lons) = regular_latlon_grid(10, 10, 9.0, 0.0, 1.0);
    // The box holds row 4 only, so every cell has zero area.
    let single_row = BoundingBox::new(5.0, 5.0, 0.0, 9.0);
    let grid = GeodesicGrid::new(&lats, &lons, single_row, GeodesicGrid::DEFAULT_FILL_VALUE).unwrap();
    let field = line_field(1, 10, 0, 2..6, 3.0);
    let config = ObjectExtractionConfig::new(1.0, "core").with_min_pixels(1);

    let records = extract_objects(&field, &grid, &config).unwrap().into_records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.n_pix, 4);
    assert_eq!(record.size, 0.0);
    assert!(record.lat_centroid.is_nan());
    assert!(record.lon_centroid.is_nan());
    assert_eq!((record.lon_min, record.lon_max), (2.0, 5.0));
    assert_eq!(record.max_value, 3.0);

    // Any positive area floor drops it.
    let by_area = config.with_min_area_km2(0.1);
    assert!(extract_objects(&field, &grid, &by_area).unwrap().is_empty());
}
