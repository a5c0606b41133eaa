use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use lh_data::features::{PART_TIME, SPENDING_QUARTILE, TREATED_X_POST_X_SPENDING};
use lh_data::{
    add_plot_features, generate, prepare, read_table, write_table, Column, ColumnMap, IngestError,
    PrepareConfig, SimulationConfig, Table,
};

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("lanham_data_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn small_extract() -> Table {
    let cfg = SimulationConfig { n_states: 6, n_per_cell: 30, seed: 3, ..SimulationConfig::default() };
    generate(&cfg, &ColumnMap::default()).unwrap()
}

#[test]
fn csv_round_trip_keeps_sentinels_as_text() {
    let table = small_extract();
    let path = tmp_path("extract.csv");
    write_table(&table, &path).unwrap();
    let back = read_table(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(back.n_rows(), table.n_rows());
    assert_eq!(back.column_names(), table.column_names());
    assert!(matches!(back.column("HRSWORK1").unwrap(), Column::Text(_)));
    assert_eq!(back.numeric("rlanham_012").unwrap(), table.numeric("rlanham_012").unwrap());
}

#[test]
fn parquet_round_trip_is_exact() {
    let table = small_extract();
    let path = tmp_path("extract.parquet");
    write_table(&table, &path).unwrap();
    let back = read_table(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(back, table);
}

#[test]
fn loaded_extract_prepares() {
    let path = tmp_path("prepare.csv");
    write_table(&small_extract(), &path).unwrap();
    let raw = read_table(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let cfg = PrepareConfig::default();
    let mut p = prepare(&raw, &cfg).unwrap();
    add_plot_features(&mut p, &cfg).unwrap();
    assert!(p.report.rows_kept < p.report.rows_loaded);
    assert!(p.table.numeric("race").unwrap().iter().all(|r| *r != Some(2.0)));
    assert!(matches!(p.table.column("HRSWORK1").unwrap(), Column::Numeric(_)));
    for name in [PART_TIME, TREATED_X_POST_X_SPENDING, SPENDING_QUARTILE] {
        assert!(p.table.has_column(name), "missing derived column {}", name);
    }
    let edges = p.report.spending_quartiles.unwrap();
    assert_eq!(edges[0], 0.5);
    assert_eq!(edges[4], 4.5);
}

#[test]
fn header_only_file_is_empty() {
    let path = tmp_path("empty.csv");
    std::fs::write(&path, "race,emp\n").unwrap();
    let err = read_table(&path).unwrap_err();
    let _ = std::fs::remove_file(&path);
    assert!(matches!(err, IngestError::Empty(_)));
}

#[test]
fn unknown_extension_is_rejected() {
    let err = read_table(&tmp_path("extract.dta")).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat(ext) if ext == "dta"));
}
