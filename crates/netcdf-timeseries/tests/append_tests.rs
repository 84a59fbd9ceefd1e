//! Integration tests for creating and appending to NetCDF stores.
//!
//! Every test writes a small store into its own scratch directory.

use netcdf::AttributeValue;
use netcdf_timeseries::cftime::parse_datetime;
use netcdf_timeseries::{
    append, append_record_to, create_store, read_slice, read_timestamps, read_times,
    NetcdfReader, Raster, SliceSource, StoreError, StoreLayout,
};
use test_utils::store::{CALENDAR, HEIGHT, SECOND_VARIABLE, TIME_UNITS, VARIABLE, WIDTH};
use test_utils::time::{SERIES_START, SERIES_START_DAYS};
use test_utils::{create_chlorophyll_grid, create_step_grid, grids_equal, scratch_dir};

fn small_layout() -> StoreLayout {
    StoreLayout::default()
        .with_size(WIDTH, HEIGHT)
        .with_time_encoding(TIME_UNITS, CALENDAR)
}

fn step_raster(step: usize) -> Raster {
    Raster::new(WIDTH, HEIGHT, create_step_grid(WIDTH, HEIGHT, step)).unwrap()
}

fn text_attr(file: &netcdf::File, variable: &str, name: &str) -> String {
    match file
        .variable(variable)
        .unwrap()
        .attribute_value(name)
        .unwrap()
        .unwrap()
    {
        AttributeValue::Str(s) => s,
        other => panic!("{variable}:{name} is not text: {other:?}"),
    }
}

// ============================================================================
// Store creation
// ============================================================================

#[test]
fn test_created_store_is_empty() {
    let dir = scratch_dir();
    let path = dir.path().join("empty.nc");
    create_store(&path, &small_layout()).unwrap();

    let reader = NetcdfReader::open(&path).unwrap();
    assert_eq!(reader.time_len().unwrap(), 0);
    assert_eq!(reader.spatial_shape(VARIABLE).unwrap(), (HEIGHT, WIDTH));
    assert_eq!(reader.data_variables().unwrap(), vec![VARIABLE.to_string()]);
    assert!(read_times(&path).unwrap().is_empty());
}

#[test]
fn test_created_store_attributes() {
    let dir = scratch_dir();
    let path = dir.path().join("attrs.nc");
    let layout = small_layout();
    create_store(&path, &layout).unwrap();

    let file = netcdf::open(&path).unwrap();
    assert!(file.dimension("time").unwrap().is_unlimited());
    assert_eq!(file.dimension("x").unwrap().len(), WIDTH);
    assert_eq!(file.dimension("y").unwrap().len(), HEIGHT);

    assert_eq!(text_attr(&file, "time", "units"), TIME_UNITS);
    assert_eq!(text_attr(&file, "time", "calendar"), CALENDAR);
    assert_eq!(text_attr(&file, "time", "axis"), "T");
    assert_eq!(text_attr(&file, VARIABLE, "grid_mapping"), "laea");

    assert_eq!(text_attr(&file, "laea", "long_name"), "CRS definition");
    assert_eq!(
        text_attr(&file, "laea", "GeoTransform"),
        "0.0 1000.0 0.0 0.0 0.0 -1000.0"
    );
    assert_eq!(text_attr(&file, "laea", "spatial_ref"), layout.crs.to_wkt());
    assert_eq!(
        text_attr(&file, "laea", "grid_mapping_name"),
        "lambert_azimuthal_equal_area"
    );
}

#[test]
fn test_create_rejects_invalid_layout() {
    let dir = scratch_dir();
    let path = dir.path().join("invalid.nc");
    let layout = small_layout().with_variables(Vec::<String>::new());

    assert!(matches!(
        create_store(&path, &layout),
        Err(StoreError::InvalidLayout(_))
    ));
    assert!(!path.exists());
}

// ============================================================================
// Append
// ============================================================================

#[test]
fn test_appends_grow_axis_and_round_trip() {
    let dir = scratch_dir();
    let path = dir.path().join("series.nc");
    create_store(&path, &small_layout()).unwrap();

    let start = parse_datetime(SERIES_START).unwrap();
    for step in 0..5 {
        let ts = start + chrono::Duration::days(step as i64);
        let index = append(&path, VARIABLE, &step_raster(step), ts).unwrap();
        assert_eq!(index, step);
    }

    let times = read_times(&path).unwrap();
    assert_eq!(times.len(), 5);
    assert_eq!(times[0], SERIES_START_DAYS);

    for step in 0..5 {
        let raster = read_slice(&path, VARIABLE, step).unwrap();
        assert_eq!(raster.shape(), (HEIGHT, WIDTH));
        assert!(grids_equal(
            raster.values(),
            &create_step_grid(WIDTH, HEIGHT, step)
        ));
    }
}

#[test]
fn test_increasing_timestamps_give_increasing_offsets() {
    let dir = scratch_dir();
    let path = dir.path().join("ordered.nc");
    create_store(&path, &small_layout()).unwrap();

    let stamps = [
        "1987-11-21T00:00:00",
        "1987-11-21T06:00:00",
        "1987-11-22T00:00:00",
        "1988-02-29T12:00:00",
        "2001-01-01T00:00:00",
    ];
    for (step, stamp) in stamps.iter().enumerate() {
        append(&path, VARIABLE, &step_raster(step), parse_datetime(stamp).unwrap()).unwrap();
    }

    let times = read_times(&path).unwrap();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(times[1] - times[0], 0.25);

    let decoded = read_timestamps(&path).unwrap();
    let expected: Vec<_> = stamps.iter().map(|s| parse_datetime(s).unwrap()).collect();
    assert_eq!(decoded, expected);
}

#[test]
fn test_shape_mismatch_leaves_axis_unchanged() {
    let dir = scratch_dir();
    let path = dir.path().join("shape.nc");
    create_store(&path, &small_layout()).unwrap();

    let ts = parse_datetime(SERIES_START).unwrap();
    append(&path, VARIABLE, &step_raster(0), ts).unwrap();

    // Transposed grid
    let wrong = Raster::filled(HEIGHT, WIDTH, 1.0);
    let err = append(&path, VARIABLE, &wrong, ts).unwrap_err();
    match err {
        StoreError::ShapeMismatch {
            variable,
            expected,
            found,
        } => {
            assert_eq!(variable, VARIABLE);
            assert_eq!(expected, (HEIGHT, WIDTH));
            assert_eq!(found, (WIDTH, HEIGHT));
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }

    assert_eq!(read_times(&path).unwrap().len(), 1);
}

#[test]
fn test_append_to_missing_variable() {
    let dir = scratch_dir();
    let path = dir.path().join("missing.nc");
    create_store(&path, &small_layout()).unwrap();

    let err = append(
        &path,
        "kd_490",
        &step_raster(0),
        parse_datetime(SERIES_START).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::MissingVariable(_)));
    assert!(read_times(&path).unwrap().is_empty());
}

#[test]
fn test_append_to_missing_file() {
    let dir = scratch_dir();
    let path = dir.path().join("nope.nc");
    let err = append(
        &path,
        VARIABLE,
        &step_raster(0),
        parse_datetime(SERIES_START).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Netcdf { .. }));
}

#[test]
fn test_date_outside_calendar_is_rejected() {
    let dir = scratch_dir();
    let path = dir.path().join("noleap.nc");
    let layout = small_layout().with_time_encoding(TIME_UNITS, "noleap");
    create_store(&path, &layout).unwrap();

    let err = append(
        &path,
        VARIABLE,
        &step_raster(0),
        parse_datetime("1988-02-29").unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Time(_)));
    assert!(read_times(&path).unwrap().is_empty());
}

#[test]
fn test_independent_variables_can_drift() {
    let dir = scratch_dir();
    let path = dir.path().join("drift.nc");
    let layout = small_layout().with_variables([VARIABLE, SECOND_VARIABLE]);
    create_store(&path, &layout).unwrap();

    let ts = parse_datetime(SERIES_START).unwrap();
    append(&path, VARIABLE, &step_raster(0), ts).unwrap();
    append(&path, VARIABLE, &step_raster(1), ts + chrono::Duration::days(1)).unwrap();

    // The second variable was never written; its slices read as fill.
    let sst = read_slice(&path, SECOND_VARIABLE, 1).unwrap();
    assert_eq!(sst.valid_count(), 0);
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_writes_all_variables_at_one_index() {
    let dir = scratch_dir();
    let path = dir.path().join("record.nc");
    let layout = small_layout().with_variables([VARIABLE, SECOND_VARIABLE]);
    create_store(&path, &layout).unwrap();

    let start = parse_datetime(SERIES_START).unwrap();
    for step in 0..3 {
        let chl = step_raster(step);
        let sst = step_raster(step + 100);
        let index = append_record_to(
            &path,
            &[(VARIABLE, &chl), (SECOND_VARIABLE, &sst)],
            start + chrono::Duration::days(step as i64),
        )
        .unwrap();
        assert_eq!(index, step);
    }

    assert_eq!(read_times(&path).unwrap().len(), 3);
    let sst = read_slice(&path, SECOND_VARIABLE, 2).unwrap();
    assert!(grids_equal(
        sst.values(),
        &create_step_grid(WIDTH, HEIGHT, 102)
    ));
}

#[test]
fn test_missing_values_survive_round_trip() {
    let dir = scratch_dir();
    let path = dir.path().join("clouds.nc");
    create_store(&path, &small_layout()).unwrap();

    let values = create_chlorophyll_grid(WIDTH, HEIGHT, 7);
    let raster = Raster::new(WIDTH, HEIGHT, values.clone()).unwrap();
    append(&path, VARIABLE, &raster, parse_datetime(SERIES_START).unwrap()).unwrap();

    let back = read_slice(&path, VARIABLE, 0).unwrap();
    assert!(grids_equal(back.values(), &values));
    assert!(back.same_values(&raster));
}
