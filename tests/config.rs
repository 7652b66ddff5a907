use std::fs;
use std::path::PathBuf;

use kira_binmatrix::config::AnalysisConfig;
use kira_binmatrix::dataset::{GenomicDataset, SignalSource, TrackPaths};
use kira_binmatrix::geometry::{Anchor, BinGeometry};
use kira_binmatrix::schema::v1::USER_SORT_VECTOR_ID;
use tempfile::TempDir;

const DESCRIPTION: &str = r#"{
  "id": 12,
  "name": "promoters",
  "owner": 3,
  "feature_list": {"id": 4, "name": "tss", "path": "genes.bed"},
  "datasets": [
    {"display_name": "mine", "dataset": {"kind": "user", "id": 1, "name": "mine", "data_ambiguous": "tracks/mine.bedGraph"}},
    {"display_name": "ref", "dataset": {"kind": "encode", "id": 2, "name": "ref", "data_plus": "p.bw", "data_minus": "m.bw"}}
  ],
  "geometry": {"anchor": "start", "bin_start": -500, "bin_number": 100, "bin_size": 10},
  "sort_vector_path": "order.txt",
  "encode_root": "encode",
  "threads": 2
}"#;

#[test]
fn description_paths_resolve_against_its_directory() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("analysis.json");
    fs::write(&path, DESCRIPTION).unwrap();
    fs::write(tmp.path().join("order.txt"), "1\n2\n").unwrap();

    let config = AnalysisConfig::load(&path).unwrap();
    assert_eq!(config.id, 12);
    assert_eq!(config.threads, 2);
    assert_eq!(config.feature_list.path, tmp.path().join("genes.bed"));
    assert_eq!(config.cache_dir, tmp.path().join("cache"));
    assert_eq!(config.output_dir, tmp.path().join("out"));
    assert!(config.feature_list.stranded);
    assert_eq!(
        config.geometry,
        BinGeometry {
            anchor: Anchor::Start,
            bin_start: -500,
            bin_number: 100,
            bin_size: 10,
        }
    );

    let analysis = config.to_analysis().unwrap();
    assert_eq!(analysis.id, 12);
    assert_eq!(analysis.owner, Some(3));
    let sv = analysis.sort_vector.unwrap();
    assert_eq!(sv.id, USER_SORT_VECTOR_ID);
    assert_eq!(sv.feature_list_id, 4);
    assert_eq!(sv.text, "1\n2\n");

    assert_eq!(
        analysis.datasets[0].dataset.tracks().unwrap(),
        TrackPaths::Unstranded {
            ambiguous: tmp.path().join("tracks/mine.bedGraph")
        }
    );
    match &analysis.datasets[1].dataset {
        GenomicDataset::Encode(d) => assert_eq!(d.root, tmp.path().join("encode")),
        other => panic!("unexpected dataset {:?}", other),
    }
    assert_eq!(
        analysis.datasets[1].dataset.tracks().unwrap(),
        TrackPaths::Stranded {
            plus: tmp.path().join("encode").join("p.bw"),
            minus: tmp.path().join("encode").join("m.bw"),
        }
    );
}

#[test]
fn geometry_defaults_apply() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("minimal.json");
    fs::write(
        &path,
        r#"{"name": "m", "feature_list": {"id": 1, "name": "f", "path": "/abs/f.bed"},
            "datasets": [{"display_name": "d", "dataset": {"kind": "user", "id": 1, "name": "d", "data_ambiguous": "/abs/d.bw"}}]}"#,
    )
    .unwrap();

    let config = AnalysisConfig::load(&path).unwrap();
    assert_eq!(config.id, 1);
    assert_eq!(config.geometry, BinGeometry::default());
    assert_eq!(config.feature_list.path, PathBuf::from("/abs/f.bed"));
    assert!(config.to_analysis().unwrap().sort_vector.is_none());
}

#[test]
fn invalid_descriptions_are_rejected() {
    let tmp = TempDir::new().unwrap();

    let no_datasets = tmp.path().join("none.json");
    fs::write(
        &no_datasets,
        r#"{"name": "m", "feature_list": {"id": 1, "name": "f", "path": "f.bed"}, "datasets": []}"#,
    )
    .unwrap();
    assert!(AnalysisConfig::load(&no_datasets).is_err());

    let bad_geometry = tmp.path().join("geom.json");
    fs::write(
        &bad_geometry,
        r#"{"name": "m", "feature_list": {"id": 1, "name": "f", "path": "f.bed"},
            "datasets": [{"display_name": "d", "dataset": {"kind": "user", "id": 1, "name": "d", "data_ambiguous": "d.bw"}}],
            "geometry": {"bin_number": 10}}"#,
    )
    .unwrap();
    let err = AnalysisConfig::load(&bad_geometry).unwrap_err();
    assert!(format!("{:#}", err).contains("bin_number"));

    let malformed = tmp.path().join("bad.json");
    fs::write(&malformed, "{ not json").unwrap();
    let err = AnalysisConfig::load(&malformed).unwrap_err();
    assert!(format!("{:#}", err).contains("bad.json"));
}

#[test]
fn missing_sort_vector_file_fails_conversion() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("analysis.json");
    fs::write(&path, DESCRIPTION).unwrap();
    let config = AnalysisConfig::load(&path).unwrap();
    let err = config.to_analysis().unwrap_err();
    assert!(format!("{:#}", err).contains("order.txt"));
}
