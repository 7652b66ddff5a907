use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bigtools::beddata::BedParserStreamingIterator;
use bigtools::{BigWigWrite, Value};
use kira_binmatrix::countmatrix::{DatasetTracks, bin_features, build_matrix_file};
use kira_binmatrix::dataset::{FeatureList, TrackPaths, UserDataset};
use kira_binmatrix::geometry::{Anchor, BinGeometry};
use kira_binmatrix::io::features::{Feature, Strand, read_feature_list};
use kira_binmatrix::io::matrix::read_matrix;
use tempfile::TempDir;

fn geometry(anchor: Anchor) -> BinGeometry {
    BinGeometry {
        anchor,
        bin_start: -250,
        bin_number: 50,
        bin_size: 10,
    }
}

fn feature(name: &str, start: u64, end: u64, strand: Strand) -> Feature {
    Feature {
        name: name.to_string(),
        chrom: "chr1".to_string(),
        start,
        end,
        strand,
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn write_bigwig(dir: &Path, name: &str, chrom_len: u32, values: &[(u32, u32, f32)]) -> PathBuf {
    let path = dir.join(name);
    let records = values
        .iter()
        .map(|&(start, end, value)| ("chr1", Value { start, end, value }))
        .collect::<Vec<_>>();
    let data = BedParserStreamingIterator::wrap_infallible_iter(records.into_iter(), false);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let chroms = HashMap::from([("chr1".to_string(), chrom_len)]);
    BigWigWrite::create_file(&path, chroms)
        .unwrap()
        .write(data, runtime)
        .unwrap();
    path
}

// 1.0 over [0, 500), 3.0 over [500, 1000).
fn step_track(dir: &Path, name: &str) -> PathBuf {
    write(dir, name, "chr1\t0\t500\t1\nchr1\t500\t1000\t3\n")
}

#[test]
fn constant_signal_fills_every_bin() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "flat.bedGraph", "chr1\t0\t1000\t1\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[feature("f1", 400, 600, Strand::Plus)],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    assert_eq!(report.clamped, 0);
    assert_eq!(report.matrix.row_names, vec!["f1".to_string()]);
    assert_eq!(report.matrix.values[0].len(), 50);
    assert!(report.matrix.values[0].iter().all(|v| (*v - 10.0).abs() < 1e-9));
}

#[test]
fn windows_past_track_start_count_as_zero_and_clamped() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "flat.bedGraph", "chr1\t0\t1000\t1\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[
            feature("edge", 50, 150, Strand::Plus),
            feature("inside", 400, 600, Strand::Plus),
        ],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    assert_eq!(report.clamped, 1);
    let edge = &report.matrix.values[0];
    // anchor 100, first window starts at -150: bins 0..15 lie before 0.
    assert!(edge[..15].iter().all(|v| *v == 0.0));
    assert!((edge[15] - 10.0).abs() < 1e-9);
    assert!((edge[49] - 10.0).abs() < 1e-9);
}

#[test]
fn missing_chromosome_is_clamped_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "flat.bedGraph", "chr1\t0\t1000\t1\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let mut other = feature("elsewhere", 400, 600, Strand::Plus);
    other.chrom = "chr9".to_string();
    let report = bin_features(&mut tracks, &[other], true, &geometry(Anchor::Center)).unwrap();

    assert_eq!(report.clamped, 1);
    assert!(report.matrix.values[0].iter().all(|v| *v == 0.0));
}

#[test]
fn minus_strand_columns_run_upstream_first() {
    let tmp = TempDir::new().unwrap();
    let track = step_track(tmp.path(), "step.bedGraph");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[
            feature("plus", 400, 600, Strand::Plus),
            feature("minus", 400, 600, Strand::Minus),
        ],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    let plus = &report.matrix.values[0];
    let minus = &report.matrix.values[1];
    assert!((plus[0] - 10.0).abs() < 1e-9);
    assert!((plus[49] - 30.0).abs() < 1e-9);
    assert!((minus[0] - 30.0).abs() < 1e-9);
    assert!((minus[49] - 10.0).abs() < 1e-9);
    let mut reversed = plus.clone();
    reversed.reverse();
    assert_eq!(&reversed, minus);
}

#[test]
fn unstranded_feature_list_ignores_strand() {
    let tmp = TempDir::new().unwrap();
    let track = step_track(tmp.path(), "step.bedGraph");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[feature("minus", 400, 600, Strand::Minus)],
        false,
        &geometry(Anchor::Center),
    )
    .unwrap();

    assert!((report.matrix.values[0][0] - 10.0).abs() < 1e-9);
}

#[test]
fn start_anchor_of_minus_feature_is_its_end() {
    let tmp = TempDir::new().unwrap();
    let track = step_track(tmp.path(), "step.bedGraph");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    // Minus feature [250, 750): its start anchor is 750, window spans [500, 1000).
    let report = bin_features(
        &mut tracks,
        &[feature("m", 250, 750, Strand::Minus)],
        true,
        &geometry(Anchor::Start),
    )
    .unwrap();

    assert_eq!(report.clamped, 0);
    assert!(report.matrix.values[0].iter().all(|v| (*v - 30.0).abs() < 1e-9));
}

#[test]
fn stranded_dataset_picks_track_by_feature_strand() {
    let tmp = TempDir::new().unwrap();
    let plus = write(tmp.path(), "plus.bedGraph", "chr1\t0\t1000\t1\n");
    let minus = write(tmp.path(), "minus.bedGraph", "chr1\t0\t1000\t2\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Stranded { plus, minus }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[
            feature("p", 400, 600, Strand::Plus),
            feature("m", 400, 600, Strand::Minus),
            feature("u", 400, 600, Strand::Unknown),
        ],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    assert!((report.matrix.values[0][0] - 10.0).abs() < 1e-9);
    assert!((report.matrix.values[1][0] - 20.0).abs() < 1e-9);
    assert!((report.matrix.values[2][0] - 30.0).abs() < 1e-9);
}

#[test]
fn negative_signal_contributes_its_magnitude() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "neg.bedGraph", "chr1\t0\t1000\t-2\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[feature("f", 400, 600, Strand::Plus)],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    assert!((report.matrix.values[0][7] - 20.0).abs() < 1e-9);
}

#[test]
fn build_matrix_file_writes_header_and_rows_in_feature_order() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "flat.bedGraph", "chr1\t0\t2000\t1\n");
    let bed = write(
        tmp.path(),
        "features.bed",
        "track name=test\nchr1\t900\t1100\tb\t0\t+\nchr1\t400\t600\ta\t0\t-\n",
    );
    let fl = FeatureList {
        id: 7,
        name: "genes".to_string(),
        owner: None,
        public: true,
        stranded: true,
        path: bed.clone(),
    };
    let ds = UserDataset {
        id: 3,
        name: "flat".to_string(),
        owner: None,
        public: true,
        data_ambiguous: Some(track),
        data_plus: None,
        data_minus: None,
        url: None,
        expiration_date: None,
    };
    let g = geometry(Anchor::Center);
    let out = tmp.path().join("out").join("m.matrix");

    let report = build_matrix_file(&fl, &ds, &g, &out).unwrap();
    assert_eq!(report.matrix.n_rows(), 2);

    let m = read_matrix(&out).unwrap();
    assert_eq!(m.bins, g.labels());
    assert_eq!(m.bins[0], "-250:-240");
    assert_eq!(m.row_names, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(read_feature_list(&bed).unwrap().len(), 2);
}

#[test]
fn missing_track_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    let paths = TrackPaths::Unstranded {
        ambiguous: tmp.path().join("nope.bedGraph"),
    };
    let err = DatasetTracks::open(&paths).err().unwrap();
    assert!(err.to_string().contains("nope.bedGraph"));
}

#[test]
fn invalid_geometry_is_rejected_before_binning() {
    let tmp = TempDir::new().unwrap();
    let track = write(tmp.path(), "flat.bedGraph", "chr1\t0\t1000\t1\n");
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();
    let mut g = geometry(Anchor::Center);
    g.bin_number = 49;
    let err = bin_features(&mut tracks, &[feature("f", 400, 600, Strand::Plus)], true, &g)
        .unwrap_err();
    assert!(err.to_string().contains("bin_number"));
}

#[test]
fn bigwig_track_bins_like_bedgraph() {
    let tmp = TempDir::new().unwrap();
    let track = write_bigwig(tmp.path(), "flat.bw", 2000, &[(0, 1000, 1.0)]);
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let mut elsewhere = feature("elsewhere", 400, 600, Strand::Plus);
    elsewhere.chrom = "chr9".to_string();
    let report = bin_features(
        &mut tracks,
        &[
            feature("f1", 400, 600, Strand::Plus),
            // Past the signal but inside the declared chromosome length.
            feature("quiet", 1400, 1600, Strand::Plus),
            feature("tail", 1900, 2000, Strand::Plus),
            elsewhere,
        ],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    let rows = &report.matrix.values;
    assert_eq!(rows[0].len(), 50);
    assert!(rows[0].iter().all(|v| (*v - 10.0).abs() < 1e-9));
    assert!(rows[1].iter().all(|v| *v == 0.0));
    assert!(rows[2].iter().all(|v| *v == 0.0));
    assert!(rows[3].iter().all(|v| *v == 0.0));
    // "tail" runs past the chromosome end and chr9 is absent.
    assert_eq!(report.clamped, 2);
}

#[test]
fn bigwig_step_signal_is_mirrored_on_minus_strand() {
    let tmp = TempDir::new().unwrap();
    let track = write_bigwig(tmp.path(), "step.bigWig", 1000, &[(0, 500, 1.0), (500, 1000, 3.0)]);
    let mut tracks = DatasetTracks::open(&TrackPaths::Unstranded { ambiguous: track }).unwrap();

    let report = bin_features(
        &mut tracks,
        &[
            feature("plus", 400, 600, Strand::Plus),
            feature("minus", 400, 600, Strand::Minus),
        ],
        true,
        &geometry(Anchor::Center),
    )
    .unwrap();

    let plus = &report.matrix.values[0];
    let minus = &report.matrix.values[1];
    assert!((plus[0] - 10.0).abs() < 1e-9);
    assert!((plus[49] - 30.0).abs() < 1e-9);
    assert!((minus[0] - 30.0).abs() < 1e-9);
    assert!((minus[49] - 10.0).abs() < 1e-9);
}
