//! Integration tests for the observation CSV reader and the GeoPackage
//! gage crosswalk.

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use tempfile::tempdir;
use teval_io::{
    CFS_TO_CMS, CrosswalkConfig, IoError, ObservationConfig, read_gage_crosswalk,
    read_observations,
};

fn write_csv(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("usgs_obs.csv");
    std::fs::write(&path, body).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

#[test]
fn reads_wide_csv_in_utc() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "datetime,01013500,01011000\n\
         2023-06-01 00:00:00-05:00,10.0,\n\
         2023-06-01 01:00:00-05:00,12.5,3.0\n\
         2023-06-01 02:00:00-05:00,NaN,4.0\n",
    );

    let obs = read_observations(&path, &ObservationConfig::default()).unwrap();
    assert_eq!(obs.n_sites(), 2);
    assert_eq!(obs.site_ids().collect::<Vec<_>>(), vec!["01011000", "01013500"]);

    let site = obs.site("01013500").unwrap();
    assert_eq!(site.index()[0], Utc.with_ymd_and_hms(2023, 6, 1, 5, 0, 0).unwrap());
    assert_eq!(site.values()[1], 12.5);
    assert!(site.values()[2].is_nan());

    let other = obs.site("01011000").unwrap();
    assert!(other.values()[0].is_nan());
}

#[test]
fn converts_cfs_to_cms() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "time,02000000\n2023-01-01,100\n2023-01-02,200\n");

    let obs = read_observations(&path, &ObservationConfig::default().with_cfs_to_cms(true)).unwrap();
    let site = obs.site("02000000").unwrap();
    assert_relative_eq!(site.values()[0], 100.0 * CFS_TO_CMS, epsilon = 1e-12);
    assert_eq!(site.index()[1], Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap());
}

#[test]
fn rejects_duplicate_site_columns() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "time,01,01\n2023-01-01,1,2\n");
    let err = read_observations(&path, &ObservationConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::Validation { .. }), "got {err:?}");
}

#[test]
fn rejects_unparsable_value() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "time,01\n2023-01-01,ice\n");
    let err = read_observations(&path, &ObservationConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::Csv { .. }), "got {err:?}");
}

#[test]
fn rejects_duplicate_timestamps() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "time,01\n2023-01-01,1\n2023-01-01 00:00:00,2\n");
    let err = read_observations(&path, &ObservationConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::Metrics(_)), "got {err:?}");
}

#[test]
fn missing_observation_file() {
    let dir = tempdir().unwrap();
    let err =
        read_observations(&dir.path().join("none.csv"), &ObservationConfig::default()).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}

// ---------------------------------------------------------------------------
// Crosswalk
// ---------------------------------------------------------------------------

fn write_gpkg(dir: &Path) -> PathBuf {
    let path = dir.join("hydrofabric.gpkg");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE \"flowpath-attributes\" (fid INTEGER PRIMARY KEY, id TEXT, gage TEXT);
         INSERT INTO \"flowpath-attributes\" (id, gage) VALUES
             ('wb-101', '01013500'),
             ('wb-202', NULL),
             ('wb-303', '01011000'),
             ('wb-404', ''),
             ('tnx', '09999999');",
    )
    .unwrap();
    path
}

#[test]
fn crosswalk_maps_numeric_ids_to_gages() {
    let dir = tempdir().unwrap();
    let path = write_gpkg(dir.path());

    let mapping = read_gage_crosswalk(&path, &CrosswalkConfig::default()).unwrap();
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.get(&101).map(String::as_str), Some("01013500"));
    assert_eq!(mapping.get(&303).map(String::as_str), Some("01011000"));
    assert!(!mapping.contains_key(&202));
}

#[test]
fn crosswalk_missing_table() {
    let dir = tempdir().unwrap();
    let path = write_gpkg(dir.path());
    let config = CrosswalkConfig::default().with_table("flowpaths");

    let err = read_gage_crosswalk(&path, &config).unwrap_err();
    assert!(matches!(err, IoError::MissingVariable { .. }), "got {err:?}");
}

#[test]
fn crosswalk_missing_column() {
    let dir = tempdir().unwrap();
    let path = write_gpkg(dir.path());
    let config = CrosswalkConfig::default().with_gage_column("gage_id");

    let err = read_gage_crosswalk(&path, &config).unwrap_err();
    assert!(err.to_string().contains("flowpath-attributes.gage_id"));
}
